use std::sync::Arc;

use async_trait::async_trait;
use mailbridge_core::Message;

use crate::error::TransportError;
use crate::listener::EventListener;

/// Strongly-typed transport trait with native `async fn`.
///
/// A transport delivers composed [`Message`]s. Callers only depend on this
/// contract, so one transport can be swapped for another without changing
/// calling code.
///
/// This trait is **not** object-safe because `send` is a native `async fn`.
/// If you need dynamic dispatch, use [`DynTransport`] instead -- every
/// `Transport` automatically implements `DynTransport` via a blanket
/// implementation.
pub trait Transport: Send + Sync {
    /// Returns the unique name of this transport.
    fn name(&self) -> &str;

    /// Whether [`start`](Self::start) has been called more recently than
    /// [`stop`](Self::stop).
    fn is_started(&self) -> bool;

    /// Mark the transport as started. Idempotent.
    fn start(&self);

    /// Mark the transport as stopped. Idempotent.
    fn stop(&self);

    /// Report whether the transport is usable.
    fn ping(&self) -> bool;

    /// Register a listener for this transport's send lifecycle events.
    fn register_plugin(&self, listener: Arc<dyn EventListener>);

    /// Send a message, returning the number of recipients it was attempted
    /// against.
    fn send(
        &self,
        message: &Message,
    ) -> impl std::future::Future<Output = Result<usize, TransportError>> + Send;
}

/// Object-safe transport trait for use behind `Arc<dyn DynTransport>`.
///
/// Uses [`macro@async_trait`] to enable dynamic dispatch of async methods.
/// You generally should not implement this trait directly -- instead implement
/// [`Transport`] and rely on the blanket implementation.
#[async_trait]
pub trait DynTransport: Send + Sync {
    fn name(&self) -> &str;

    fn is_started(&self) -> bool;

    fn start(&self);

    fn stop(&self);

    fn ping(&self) -> bool;

    fn register_plugin(&self, listener: Arc<dyn EventListener>);

    async fn send(&self, message: &Message) -> Result<usize, TransportError>;
}

/// Blanket implementation: any type that implements [`Transport`] also
/// implements [`DynTransport`], bridging the static and dynamic dispatch worlds.
#[async_trait]
impl<T: Transport + Sync> DynTransport for T {
    fn name(&self) -> &str {
        Transport::name(self)
    }

    fn is_started(&self) -> bool {
        Transport::is_started(self)
    }

    fn start(&self) {
        Transport::start(self);
    }

    fn stop(&self) {
        Transport::stop(self);
    }

    fn ping(&self) -> bool {
        Transport::ping(self)
    }

    fn register_plugin(&self, listener: Arc<dyn EventListener>) {
        Transport::register_plugin(self, listener);
    }

    async fn send(&self, message: &Message) -> Result<usize, TransportError> {
        Transport::send(self, message).await
    }
}
