//! Layer-aware router

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use std::sync::Arc;

use super::{DispatchError, Dispatcher, Layer, LocalDispatcher};

/// Routes calls to the local handler table or to an upstream dispatcher
///
/// Procedures registered locally always win. Anything else goes to the
/// upstream (typically a remote worker) when one is configured.
pub struct LayeredDispatcher {
    layer: Layer,
    local: LocalDispatcher,
    upstream: Option<Arc<dyn Dispatcher>>,
}

impl LayeredDispatcher {
    pub fn new(layer: Layer, local: LocalDispatcher) -> Self {
        Self {
            layer,
            local,
            upstream: None,
        }
    }

    /// Sets the dispatcher that serves procedures not hosted locally
    pub fn with_upstream(mut self, upstream: Arc<dyn Dispatcher>) -> Self {
        self.upstream = Some(upstream);
        self
    }

    pub fn layer(&self) -> Layer {
        self.layer
    }

    /// The handler table served by this process
    pub fn local(&self) -> &LocalDispatcher {
        &self.local
    }

    pub fn has_upstream(&self) -> bool {
        self.upstream.is_some()
    }
}

#[async_trait]
impl Dispatcher for LayeredDispatcher {
    async fn dispatch(
        &self,
        module: &str,
        procedure: &str,
        input: JsonValue,
    ) -> Result<JsonValue, DispatchError> {
        if self.local.contains(module, procedure) {
            return self.local.dispatch(module, procedure, input).await;
        }

        match &self.upstream {
            Some(upstream) => upstream.dispatch(module, procedure, input).await,
            None => Err(DispatchError::unknown(module, procedure)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::Procedure;

    const LOCAL: Procedure<(), String> = Procedure::new("jobs", "pipelines");
    const REMOTE: Procedure<(), String> = Procedure::new("cluster", "clusters");

    fn upstream() -> Arc<dyn Dispatcher> {
        let mut table = LocalDispatcher::new();
        table.register(&REMOTE, |_: ()| async move { Ok("from upstream".to_string()) });
        Arc::new(table)
    }

    #[tokio::test]
    async fn test_local_procedures_stay_local() {
        let mut local = LocalDispatcher::new();
        local.register(&LOCAL, |_: ()| async move { Ok("from local".to_string()) });

        let dispatcher: Arc<dyn Dispatcher> =
            Arc::new(LayeredDispatcher::new(Layer::Server, local).with_upstream(upstream()));

        assert_eq!(dispatcher.call(&LOCAL, &()).await.unwrap(), "from local");
        assert_eq!(dispatcher.call(&REMOTE, &()).await.unwrap(), "from upstream");
    }

    #[tokio::test]
    async fn test_missing_upstream_is_unknown_procedure() {
        let dispatcher: Arc<dyn Dispatcher> = Arc::new(LayeredDispatcher::new(
            Layer::Standalone,
            LocalDispatcher::new(),
        ));

        let err = dispatcher.call(&REMOTE, &()).await.unwrap_err();
        assert!(err.is_unknown_procedure());
    }
}
