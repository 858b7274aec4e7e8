//! Location-transparent call layer
//!
//! Pipeline logic issues every cluster, image and event operation as a call
//! to a `(module, procedure)` pair through a [`Dispatcher`]. Whether the call
//! is served by the in-process [`LocalDispatcher`] or proxied to a remote
//! worker is decided once, at startup, by the [`Layer`] handed to the
//! [`LayeredDispatcher`].
//!
//! Inputs and outputs always travel as JSON values, so a handler sees the
//! same bytes no matter where its caller lives.

mod error;
mod layered;
mod local;

pub use error::DispatchError;
pub use layered::LayeredDispatcher;
pub use local::LocalDispatcher;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use std::fmt;
use std::marker::PhantomData;
use std::str::FromStr;

/// Routes a procedure call to its handler
#[async_trait]
pub trait Dispatcher: Send + Sync {
    /// Invokes `module.procedure` with an already encoded input
    ///
    /// # Errors
    /// Returns `DispatchError` when the procedure is unknown, the transport
    /// fails or the handler rejects the call.
    async fn dispatch(
        &self,
        module: &str,
        procedure: &str,
        input: JsonValue,
    ) -> Result<JsonValue, DispatchError>;
}

impl<'a> dyn Dispatcher + 'a {
    /// Typed call: encodes `input`, dispatches and decodes the output
    pub async fn call<I, O>(&self, procedure: &Procedure<I, O>, input: &I) -> Result<O, DispatchError>
    where
        I: Serialize,
        O: DeserializeOwned,
    {
        let payload = serde_json::to_value(input).map_err(|e| DispatchError::InvalidInput {
            procedure: procedure.path(),
            message: e.to_string(),
        })?;

        let output = self
            .dispatch(procedure.module(), procedure.name(), payload)
            .await?;

        serde_json::from_value(output).map_err(|e| DispatchError::InvalidOutput {
            procedure: procedure.path(),
            message: e.to_string(),
        })
    }
}

/// A `(module, procedure)` pair bound to its input and output types
///
/// Declared as constants in [`crate::procedures`].
pub struct Procedure<I, O> {
    module: &'static str,
    name: &'static str,
    _types: PhantomData<fn(I) -> O>,
}

impl<I, O> Procedure<I, O> {
    pub const fn new(module: &'static str, name: &'static str) -> Self {
        Self {
            module,
            name,
            _types: PhantomData,
        }
    }

    pub fn module(&self) -> &'static str {
        self.module
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Dotted form, e.g. `cluster.deployments`
    pub fn path(&self) -> String {
        format!("{}.{}", self.module, self.name)
    }
}

impl<I, O> Clone for Procedure<I, O> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<I, O> Copy for Procedure<I, O> {}

impl<I, O> fmt::Debug for Procedure<I, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Procedure({}.{})", self.module, self.name)
    }
}

/// Process role, chosen once at startup
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layer {
    /// Everything runs in one process
    Standalone,
    /// Control plane: runs pipelines, delegates cluster/images/events to a worker
    Server,
    /// Hosts cluster, images and events for a control plane
    Worker,
}

impl Layer {
    /// Returns true when this layer serves `module` locally
    pub fn hosts(&self, module: &str) -> bool {
        use crate::procedures::{cluster, events, images, jobs};

        match self {
            Layer::Standalone => true,
            Layer::Server => module == jobs::MODULE,
            Layer::Worker => {
                module == cluster::MODULE || module == images::MODULE || module == events::MODULE
            }
        }
    }

    /// Returns true when this layer needs an upstream worker
    pub fn requires_upstream(&self) -> bool {
        matches!(self, Layer::Server)
    }

    /// Returns true when this layer runs pipelines and their timers
    pub fn runs_pipelines(&self) -> bool {
        self.hosts(crate::procedures::jobs::MODULE)
    }
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Layer::Standalone => write!(f, "standalone"),
            Layer::Server => write!(f, "server"),
            Layer::Worker => write!(f, "worker"),
        }
    }
}

impl FromStr for Layer {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "standalone" => Ok(Layer::Standalone),
            "server" => Ok(Layer::Server),
            "worker" => Ok(Layer::Worker),
            other => Err(format!(
                "unknown layer '{}' (expected standalone, server or worker)",
                other
            )),
        }
    }
}
