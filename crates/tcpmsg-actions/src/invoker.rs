use crate::error::{ActionError, Result};
use crate::handler::{Handler, HandlerShape};

/// Wraps a registered handler behind one uniform invocation contract.
///
/// `invoke` dispatches to the underlying handler according to its shape,
/// supplying only the arguments the shape declares. Synchronous handlers
/// run inline and the returned future completes immediately; asynchronous
/// handlers are awaited. Either way the caller treats every invoker the
/// same.
pub struct ActionInvoker<O, M> {
    identifier: String,
    handler: Handler<O, M>,
}

impl<O, M> ActionInvoker<O, M> {
    pub(crate) fn new(identifier: String, handler: Handler<O, M>) -> Self {
        Self {
            identifier,
            handler,
        }
    }

    /// The identifier this invoker was registered under.
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// The underlying handler's call shape.
    pub fn shape(&self) -> HandlerShape {
        self.handler.shape()
    }

    /// Invoke the handler with the arguments its shape declares.
    ///
    /// A handler error propagates unchanged as [`ActionError::Handler`];
    /// no recovery is attempted here.
    pub async fn invoke(&self, origin: O, message: M) -> Result<()> {
        let result = match &self.handler {
            Handler::OriginMessage(f) => f((origin, message)),
            Handler::Message(f) => {
                drop(origin);
                f(message)
            }
            Handler::Unit(f) => {
                drop((origin, message));
                f(())
            }
            Handler::OriginMessageAsync(f) => f((origin, message)).await,
            Handler::MessageAsync(f) => {
                drop(origin);
                f(message).await
            }
            Handler::UnitAsync(f) => {
                drop((origin, message));
                f(()).await
            }
        };
        result.map_err(ActionError::Handler)
    }
}

impl<O, M> std::fmt::Debug for ActionInvoker<O, M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionInvoker")
            .field("identifier", &self.identifier)
            .field("shape", &self.shape())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;
    use crate::handler::Handler;

    #[derive(Debug, Clone, PartialEq)]
    struct TestMessage(String);

    type TestInvoker = ActionInvoker<u32, TestMessage>;

    fn invoker(handler: Handler<u32, TestMessage>) -> TestInvoker {
        ActionInvoker::new("test".to_string(), handler)
    }

    #[tokio::test]
    async fn origin_message_shape_receives_both_arguments() {
        let seen = Arc::new(std::sync::Mutex::new(None));
        let seen_clone = seen.clone();

        let invoker = invoker(Handler::with_origin(move |origin, message: TestMessage| {
            *seen_clone.lock().unwrap() = Some((origin, message));
            Ok(())
        }));

        invoker.invoke(7, TestMessage("hi".into())).await.unwrap();
        assert_eq!(
            seen.lock().unwrap().take(),
            Some((7, TestMessage("hi".into())))
        );
    }

    #[tokio::test]
    async fn message_shape_receives_only_the_message() {
        let seen = Arc::new(std::sync::Mutex::new(None));
        let seen_clone = seen.clone();

        let invoker = invoker(Handler::with_message(move |message: TestMessage| {
            *seen_clone.lock().unwrap() = Some(message);
            Ok(())
        }));

        invoker.invoke(7, TestMessage("hi".into())).await.unwrap();
        assert_eq!(seen.lock().unwrap().take(), Some(TestMessage("hi".into())));
    }

    #[tokio::test]
    async fn unit_shape_receives_nothing_and_completes() {
        let calls = Arc::new(AtomicU32::new(0));
        let calls_clone = calls.clone();

        let invoker = invoker(Handler::unit(move || {
            calls_clone.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }));

        invoker.invoke(7, TestMessage("hi".into())).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn async_handler_completes_only_after_awaited_work() {
        let flag = Arc::new(AtomicBool::new(false));
        let flag_clone = flag.clone();

        let invoker = invoker(Handler::with_origin_async(move |_origin, _message| {
            let flag = flag_clone.clone();
            async move {
                tokio::time::sleep(Duration::from_millis(20)).await;
                flag.store(true, Ordering::SeqCst);
                Ok(())
            }
        }));

        assert!(!flag.load(Ordering::SeqCst));
        invoker.invoke(7, TestMessage("hi".into())).await.unwrap();
        assert!(flag.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn handler_error_propagates_unchanged() {
        let invoker = invoker(Handler::with_message(|_message: TestMessage| {
            Err("boom".into())
        }));

        let err = invoker
            .invoke(7, TestMessage("hi".into()))
            .await
            .unwrap_err();

        match err {
            ActionError::Handler(source) => assert_eq!(source.to_string(), "boom"),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
