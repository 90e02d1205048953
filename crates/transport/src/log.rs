use tracing::{info, warn};

use crate::event::{Dispatch, SendEvent, TransportExceptionEvent};
use crate::listener::EventListener;

/// A listener that logs every lifecycle stage and never cancels anything.
///
/// Useful for local development and for auditing which messages a transport
/// handed to its provider.
pub struct LogListener {
    name: String,
}

impl LogListener {
    /// Create a new `LogListener`; `name` is attached to every log line.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl EventListener for LogListener {
    fn before_send_performed(&self, event: &SendEvent<'_>) -> Dispatch {
        let message = event.message();
        info!(
            listener = %self.name,
            transport = event.transport(),
            subject = message.subject(),
            recipients = message.recipients().count(),
            "sending message"
        );
        Dispatch::Continue
    }

    fn send_performed(&self, event: &SendEvent<'_>) -> Dispatch {
        info!(
            listener = %self.name,
            transport = event.transport(),
            result = ?event.result(),
            failed_recipients = event.failed_recipients().len(),
            "message sent"
        );
        Dispatch::Continue
    }

    fn exception_thrown(&self, event: &TransportExceptionEvent<'_>) -> Dispatch {
        warn!(
            listener = %self.name,
            transport = event.transport(),
            error = %event.error(),
            "transport error"
        );
        Dispatch::Continue
    }
}
