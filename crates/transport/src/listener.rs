use crate::event::{Dispatch, SendEvent, TransportExceptionEvent};

/// A plugin observing the send lifecycle of a transport.
///
/// Every hook has a default that does nothing and returns
/// [`Dispatch::Continue`], so listeners only implement the stages they care
/// about. Returning [`Dispatch::Cancelled`] stops the remaining listeners from
/// seeing the event and is reported back to the transport.
pub trait EventListener: Send + Sync {
    /// Called before the provider is contacted. Cancelling aborts the send.
    fn before_send_performed(&self, _event: &SendEvent<'_>) -> Dispatch {
        Dispatch::Continue
    }

    /// Called after the provider accepted the message.
    fn send_performed(&self, _event: &SendEvent<'_>) -> Dispatch {
        Dispatch::Continue
    }

    /// Called before an error is returned. Cancelling suppresses the error.
    fn exception_thrown(&self, _event: &TransportExceptionEvent<'_>) -> Dispatch {
        Dispatch::Continue
    }
}
