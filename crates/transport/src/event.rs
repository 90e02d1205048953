use std::fmt;

use mailbridge_core::Message;

use crate::error::TransportError;

/// What a listener (or the whole listener chain) decided about an event.
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// Keep going.
    Continue,
    /// Stop the current stage. For a before-send event this aborts the send;
    /// for an exception event it suppresses the error.
    Cancelled,
}

impl Dispatch {
    pub fn is_cancelled(self) -> bool {
        self == Self::Cancelled
    }
}

/// Outcome recorded on a [`SendEvent`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SendResult {
    /// Not yet sent.
    #[default]
    Pending,
    /// Handed to a spool for later delivery.
    Spooled,
    /// Accepted by the provider.
    Success,
    /// Accepted for some recipients only.
    Tentative,
    /// Not accepted.
    Failed,
}

/// The stage a [`SendEvent`] is dispatched for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendEventKind {
    /// Before the provider is contacted; may be cancelled.
    BeforeSendPerformed,
    /// After the provider accepted the message.
    SendPerformed,
}

impl SendEventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::BeforeSendPerformed => "before_send_performed",
            Self::SendPerformed => "send_performed",
        }
    }
}

impl fmt::Display for SendEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Event raised around a single send.
#[derive(Debug)]
pub struct SendEvent<'a> {
    transport: &'a str,
    message: &'a Message,
    result: SendResult,
    failed_recipients: Vec<String>,
}

impl<'a> SendEvent<'a> {
    pub fn new(transport: &'a str, message: &'a Message) -> Self {
        Self {
            transport,
            message,
            result: SendResult::Pending,
            failed_recipients: Vec::new(),
        }
    }

    /// Name of the transport that raised the event.
    pub fn transport(&self) -> &str {
        self.transport
    }

    pub fn message(&self) -> &Message {
        self.message
    }

    pub fn result(&self) -> SendResult {
        self.result
    }

    pub fn set_result(&mut self, result: SendResult) {
        self.result = result;
    }

    pub fn failed_recipients(&self) -> &[String] {
        &self.failed_recipients
    }

    pub fn set_failed_recipients(&mut self, recipients: Vec<String>) {
        self.failed_recipients = recipients;
    }
}

/// Event raised when a transport is about to return an error.
#[derive(Debug)]
pub struct TransportExceptionEvent<'a> {
    transport: &'a str,
    error: &'a TransportError,
}

impl<'a> TransportExceptionEvent<'a> {
    pub fn new(transport: &'a str, error: &'a TransportError) -> Self {
        Self { transport, error }
    }

    /// Name of the transport that raised the event.
    pub fn transport(&self) -> &str {
        self.transport
    }

    pub fn error(&self) -> &TransportError {
        self.error
    }
}
