use std::sync::{Arc, PoisonError, RwLock};

use mailbridge_core::Message;
use tracing::debug;

use crate::error::TransportError;
use crate::event::{Dispatch, SendEvent, SendEventKind, TransportExceptionEvent};
use crate::listener::EventListener;

/// Creates lifecycle events and delivers them to registered listeners.
///
/// The `create_*` methods may decline to create an event by returning `None`;
/// transports then skip the corresponding notifications.
pub trait EventDispatcher: Send + Sync {
    /// Create the event that accompanies one send.
    fn create_send_event<'a>(
        &self,
        transport: &'a str,
        message: &'a Message,
    ) -> Option<SendEvent<'a>>;

    /// Create the event that accompanies an error about to be returned.
    fn create_transport_exception_event<'a>(
        &self,
        transport: &'a str,
        error: &'a TransportError,
    ) -> Option<TransportExceptionEvent<'a>>;

    /// Deliver a send event for the given stage.
    fn dispatch_send_event(&self, event: &SendEvent<'_>, kind: SendEventKind) -> Dispatch;

    /// Deliver an exception event.
    fn dispatch_exception_event(&self, event: &TransportExceptionEvent<'_>) -> Dispatch;

    /// Register a listener for all future events.
    fn bind_event_listener(&self, listener: Arc<dyn EventListener>);
}

/// In-process dispatcher that calls listeners in registration order.
///
/// Delivery stops at the first listener that returns
/// [`Dispatch::Cancelled`].
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
///
/// use mailbridge_transport::{EventDispatcher, ListenerDispatcher, LogListener};
///
/// let dispatcher = ListenerDispatcher::new();
/// dispatcher.bind_event_listener(Arc::new(LogListener::new("audit")));
/// assert_eq!(dispatcher.len(), 1);
/// ```
#[derive(Default)]
pub struct ListenerDispatcher {
    listeners: RwLock<Vec<Arc<dyn EventListener>>>,
}

impl std::fmt::Debug for ListenerDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerDispatcher")
            .field("listeners", &self.len())
            .finish()
    }
}

impl ListenerDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registered listeners.
    pub fn len(&self) -> usize {
        self.listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // Listeners may bind further listeners while being notified, so the lock
    // is never held across a callback.
    fn snapshot(&self) -> Vec<Arc<dyn EventListener>> {
        self.listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn deliver(&self, mut notify: impl FnMut(&dyn EventListener) -> Dispatch) -> Dispatch {
        for listener in self.snapshot() {
            if notify(listener.as_ref()).is_cancelled() {
                return Dispatch::Cancelled;
            }
        }
        Dispatch::Continue
    }
}

impl EventDispatcher for ListenerDispatcher {
    fn create_send_event<'a>(
        &self,
        transport: &'a str,
        message: &'a Message,
    ) -> Option<SendEvent<'a>> {
        Some(SendEvent::new(transport, message))
    }

    fn create_transport_exception_event<'a>(
        &self,
        transport: &'a str,
        error: &'a TransportError,
    ) -> Option<TransportExceptionEvent<'a>> {
        Some(TransportExceptionEvent::new(transport, error))
    }

    fn dispatch_send_event(&self, event: &SendEvent<'_>, kind: SendEventKind) -> Dispatch {
        let outcome = self.deliver(|listener| match kind {
            SendEventKind::BeforeSendPerformed => listener.before_send_performed(event),
            SendEventKind::SendPerformed => listener.send_performed(event),
        });
        debug!(event = %kind, cancelled = outcome.is_cancelled(), "dispatched send event");
        outcome
    }

    fn dispatch_exception_event(&self, event: &TransportExceptionEvent<'_>) -> Dispatch {
        let outcome = self.deliver(|listener| listener.exception_thrown(event));
        debug!(
            event = "exception_thrown",
            cancelled = outcome.is_cancelled(),
            "dispatched exception event"
        );
        outcome
    }

    fn bind_event_listener(&self, listener: Arc<dyn EventListener>) {
        self.listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(listener);
    }
}

/// Dispatcher that never creates events.
///
/// Transports wired to it run without any notifications, and errors always
/// propagate.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullDispatcher;

impl EventDispatcher for NullDispatcher {
    fn create_send_event<'a>(
        &self,
        _transport: &'a str,
        _message: &'a Message,
    ) -> Option<SendEvent<'a>> {
        None
    }

    fn create_transport_exception_event<'a>(
        &self,
        _transport: &'a str,
        _error: &'a TransportError,
    ) -> Option<TransportExceptionEvent<'a>> {
        None
    }

    fn dispatch_send_event(&self, _event: &SendEvent<'_>, _kind: SendEventKind) -> Dispatch {
        Dispatch::Continue
    }

    fn dispatch_exception_event(&self, _event: &TransportExceptionEvent<'_>) -> Dispatch {
        Dispatch::Continue
    }

    fn bind_event_listener(&self, _listener: Arc<dyn EventListener>) {
        debug!("null dispatcher ignores listener registration");
    }
}
