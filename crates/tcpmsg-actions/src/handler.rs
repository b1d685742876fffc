use std::future::Future;
use std::pin::Pin;

use crate::error::HandlerResult;

/// Boxed future returned by asynchronous handler shapes.
pub type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;

/// The six recognized handler call shapes.
///
/// A handler carries exactly one shape, fixed at construction; the invoker
/// supplies only the arguments the shape declares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerShape {
    /// `(origin, message)`, synchronous.
    OriginMessage,
    /// `(message)`, synchronous.
    Message,
    /// `()`, synchronous.
    Unit,
    /// `(origin, message)`, asynchronous.
    OriginMessageAsync,
    /// `(message)`, asynchronous.
    MessageAsync,
    /// `()`, asynchronous.
    UnitAsync,
}

impl HandlerShape {
    /// True for the suspend-capable shapes.
    pub fn is_async(self) -> bool {
        matches!(
            self,
            HandlerShape::OriginMessageAsync | HandlerShape::MessageAsync | HandlerShape::UnitAsync
        )
    }
}

type SyncFn<A> = Box<dyn Fn(A) -> HandlerResult + Send + Sync>;
type AsyncFn<A> = Box<dyn Fn(A) -> BoxFuture<HandlerResult> + Send + Sync>;

/// A registered handler function, tagged by shape.
///
/// Generic over the origin type `O` and message type `M`. Construct one
/// through the shape-specific constructors; the shape tag is derived from
/// the constructor used, so a handler value always matches exactly one
/// shape.
pub enum Handler<O, M> {
    OriginMessage(SyncFn<(O, M)>),
    Message(SyncFn<M>),
    Unit(SyncFn<()>),
    OriginMessageAsync(AsyncFn<(O, M)>),
    MessageAsync(AsyncFn<M>),
    UnitAsync(AsyncFn<()>),
}

impl<O, M> Handler<O, M> {
    /// Synchronous handler taking the origin and the message.
    pub fn with_origin<F>(f: F) -> Self
    where
        F: Fn(O, M) -> HandlerResult + Send + Sync + 'static,
    {
        Handler::OriginMessage(Box::new(move |(origin, message)| f(origin, message)))
    }

    /// Synchronous handler taking only the message.
    pub fn with_message<F>(f: F) -> Self
    where
        F: Fn(M) -> HandlerResult + Send + Sync + 'static,
    {
        Handler::Message(Box::new(f))
    }

    /// Synchronous handler taking no arguments.
    pub fn unit<F>(f: F) -> Self
    where
        F: Fn() -> HandlerResult + Send + Sync + 'static,
    {
        Handler::Unit(Box::new(move |()| f()))
    }

    /// Asynchronous handler taking the origin and the message.
    pub fn with_origin_async<F, Fut>(f: F) -> Self
    where
        F: Fn(O, M) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        Handler::OriginMessageAsync(Box::new(move |(origin, message)| {
            Box::pin(f(origin, message))
        }))
    }

    /// Asynchronous handler taking only the message.
    pub fn with_message_async<F, Fut>(f: F) -> Self
    where
        F: Fn(M) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        Handler::MessageAsync(Box::new(move |message| Box::pin(f(message))))
    }

    /// Asynchronous handler taking no arguments.
    pub fn unit_async<F, Fut>(f: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        Handler::UnitAsync(Box::new(move |()| Box::pin(f())))
    }

    /// The call shape this handler was constructed with.
    pub fn shape(&self) -> HandlerShape {
        match self {
            Handler::OriginMessage(_) => HandlerShape::OriginMessage,
            Handler::Message(_) => HandlerShape::Message,
            Handler::Unit(_) => HandlerShape::Unit,
            Handler::OriginMessageAsync(_) => HandlerShape::OriginMessageAsync,
            Handler::MessageAsync(_) => HandlerShape::MessageAsync,
            Handler::UnitAsync(_) => HandlerShape::UnitAsync,
        }
    }
}

impl<O, M> std::fmt::Debug for Handler<O, M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Handler").field(&self.shape()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type TestHandler = Handler<u32, String>;

    #[test]
    fn constructors_yield_matching_shapes() {
        let handlers = [
            (
                TestHandler::with_origin(|_, _| Ok(())),
                HandlerShape::OriginMessage,
            ),
            (TestHandler::with_message(|_| Ok(())), HandlerShape::Message),
            (TestHandler::unit(|| Ok(())), HandlerShape::Unit),
            (
                TestHandler::with_origin_async(|_, _| async { Ok(()) }),
                HandlerShape::OriginMessageAsync,
            ),
            (
                TestHandler::with_message_async(|_| async { Ok(()) }),
                HandlerShape::MessageAsync,
            ),
            (
                TestHandler::unit_async(|| async { Ok(()) }),
                HandlerShape::UnitAsync,
            ),
        ];

        for (handler, shape) in handlers {
            assert_eq!(handler.shape(), shape);
        }
    }

    #[test]
    fn sync_shapes_are_not_async() {
        assert!(!HandlerShape::OriginMessage.is_async());
        assert!(!HandlerShape::Message.is_async());
        assert!(!HandlerShape::Unit.is_async());
        assert!(HandlerShape::OriginMessageAsync.is_async());
        assert!(HandlerShape::MessageAsync.is_async());
        assert!(HandlerShape::UnitAsync.is_async());
    }
}
