//! In-process handler table

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;

use super::{DispatchError, Dispatcher, Procedure};

type HandlerFuture = Pin<Box<dyn Future<Output = Result<JsonValue, DispatchError>> + Send>>;
type Handler = Arc<dyn Fn(JsonValue) -> HandlerFuture + Send + Sync>;

/// Dispatcher backed by a table of in-process handlers
///
/// Handlers are keyed by `module.procedure`. Inputs are decoded from JSON
/// before the handler runs and outputs encoded after, which keeps local
/// calls byte-compatible with remote ones.
#[derive(Clone, Default)]
pub struct LocalDispatcher {
    handlers: HashMap<String, Handler>,
}

impl LocalDispatcher {
    /// Creates an empty handler table
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the handler for a procedure
    ///
    /// # Panics
    /// Panics if a handler for the same procedure is already registered
    pub fn register<I, O, F, Fut>(&mut self, procedure: &Procedure<I, O>, handler: F) -> &mut Self
    where
        I: DeserializeOwned + Send + 'static,
        O: Serialize + Send + 'static,
        F: Fn(I) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<O, DispatchError>> + Send + 'static,
    {
        let path = procedure.path();
        if self.handlers.contains_key(&path) {
            panic!("Procedure '{}' is already registered", path);
        }

        let key = path.clone();
        let entry: Handler = Arc::new(move |input: JsonValue| -> HandlerFuture {
            let input: I = match serde_json::from_value(input) {
                Ok(input) => input,
                Err(e) => {
                    let err = DispatchError::InvalidInput {
                        procedure: path.clone(),
                        message: e.to_string(),
                    };
                    return Box::pin(async move { Err(err) });
                }
            };

            let pending = handler(input);
            let path = path.clone();
            Box::pin(async move {
                let output = pending.await?;
                serde_json::to_value(output).map_err(|e| DispatchError::InvalidOutput {
                    procedure: path,
                    message: e.to_string(),
                })
            })
        });

        self.handlers.insert(key, entry);
        self
    }

    /// Returns true if a handler is registered for `module.procedure`
    pub fn contains(&self, module: &str, procedure: &str) -> bool {
        self.handlers
            .contains_key(&format!("{}.{}", module, procedure))
    }

    /// Returns the registered procedure paths, sorted
    pub fn procedures(&self) -> Vec<String> {
        let mut paths: Vec<String> = self.handlers.keys().cloned().collect();
        paths.sort();
        paths
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl std::fmt::Debug for LocalDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalDispatcher")
            .field("procedures", &self.procedures())
            .finish()
    }
}

#[async_trait]
impl Dispatcher for LocalDispatcher {
    async fn dispatch(
        &self,
        module: &str,
        procedure: &str,
        input: JsonValue,
    ) -> Result<JsonValue, DispatchError> {
        let handler = self
            .handlers
            .get(&format!("{}.{}", module, procedure))
            .cloned()
            .ok_or_else(|| DispatchError::unknown(module, procedure))?;

        handler(input).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Serialize, Deserialize)]
    struct Greeting {
        name: String,
    }

    const GREET: Procedure<Greeting, String> = Procedure::new("test", "greet");
    const FAIL: Procedure<(), ()> = Procedure::new("test", "fail");

    fn table() -> Arc<dyn Dispatcher> {
        let mut table = LocalDispatcher::new();
        table
            .register(&GREET, |input: Greeting| async move {
                Ok(format!("hello {}", input.name))
            })
            .register(&FAIL, |_: ()| async move {
                Err::<(), _>(DispatchError::handler("boom"))
            });
        Arc::new(table)
    }

    #[tokio::test]
    async fn test_typed_call_round_trips_through_json() {
        let dispatcher = table();
        let output = dispatcher
            .call(&GREET, &Greeting { name: "world".to_string() })
            .await
            .unwrap();
        assert_eq!(output, "hello world");
    }

    #[tokio::test]
    async fn test_unknown_procedure() {
        let dispatcher = table();
        let err = dispatcher
            .dispatch("test", "missing", JsonValue::Null)
            .await
            .unwrap_err();
        assert_eq!(err, DispatchError::unknown("test", "missing"));
        assert!(err.is_unknown_procedure());
    }

    #[tokio::test]
    async fn test_invalid_input_is_rejected_before_handler() {
        let dispatcher = table();
        let err = dispatcher
            .dispatch("test", "greet", serde_json::json!({ "nope": 1 }))
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::InvalidInput { .. }));
    }

    #[tokio::test]
    async fn test_handler_error_is_surfaced() {
        let dispatcher = table();
        let err = dispatcher.call(&FAIL, &()).await.unwrap_err();
        assert_eq!(err, DispatchError::Handler("boom".to_string()));
    }

    #[test]
    fn test_procedures_are_listed() {
        let mut table = LocalDispatcher::new();
        table.register(&GREET, |_: Greeting| async move { Ok(String::new()) });
        assert!(table.contains("test", "greet"));
        assert!(!table.contains("test", "fail"));
        assert_eq!(table.procedures(), vec!["test.greet".to_string()]);
    }

    #[test]
    #[should_panic(expected = "already registered")]
    fn test_duplicate_registration_panics() {
        let mut table = LocalDispatcher::new();
        table.register(&GREET, |_: Greeting| async move { Ok(String::new()) });
        table.register(&GREET, |_: Greeting| async move { Ok(String::new()) });
    }
}
