use serde::{Deserialize, Serialize};

use crate::attachment::Attachment;
use crate::mailbox::{Mailbox, insert_unique};

/// A non-attachment MIME part carried alongside the main body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BodyPart {
    /// MIME content type (e.g. `"text/plain"`).
    pub content_type: String,
    /// Part content.
    pub content: String,
}

impl BodyPart {
    pub fn new(content_type: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            content_type: content_type.into(),
            content: content.into(),
        }
    }
}

/// A child part of a [`Message`].
///
/// Transports that forward attachments only ever look at the
/// [`MessagePart::Attachment`] variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MessagePart {
    /// An alternative or related body part.
    Body(BodyPart),
    /// A file attachment.
    Attachment(Attachment),
}

impl MessagePart {
    /// Returns the attachment if this part is one.
    pub fn as_attachment(&self) -> Option<&Attachment> {
        match self {
            Self::Attachment(attachment) => Some(attachment),
            Self::Body(_) => None,
        }
    }
}

impl From<Attachment> for MessagePart {
    fn from(attachment: Attachment) -> Self {
        Self::Attachment(attachment)
    }
}

impl From<BodyPart> for MessagePart {
    fn from(part: BodyPart) -> Self {
        Self::Body(part)
    }
}

/// A composed outgoing email.
///
/// Address lists behave like ordered maps keyed by email address: adding an
/// address twice keeps the first position and the last display name.
///
/// # Examples
///
/// ```
/// use mailbridge_core::{Attachment, Message};
///
/// let message = Message::new()
///     .with_from(("alerts@example.com", "Alerts"))
///     .with_to("oncall@example.com")
///     .with_cc("lead@example.com")
///     .with_subject("Disk almost full")
///     .with_body("<p>/var is at 93%</p>")
///     .with_attachment(Attachment::new(b"df -h".to_vec(), "text/plain", "df.txt"));
///
/// assert_eq!(message.to().len(), 1);
/// assert_eq!(message.attachments().count(), 1);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    #[serde(default)]
    from: Vec<Mailbox>,
    #[serde(default)]
    to: Vec<Mailbox>,
    #[serde(default)]
    cc: Vec<Mailbox>,
    #[serde(default)]
    bcc: Vec<Mailbox>,
    #[serde(default)]
    reply_to: Vec<Mailbox>,
    #[serde(default)]
    subject: String,
    #[serde(default)]
    body: String,
    #[serde(default)]
    parts: Vec<MessagePart>,
}

impl Message {
    /// Create an empty message.
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_from(mut self, mailbox: impl Into<Mailbox>) -> Self {
        insert_unique(&mut self.from, mailbox.into());
        self
    }

    #[must_use]
    pub fn with_to(mut self, mailbox: impl Into<Mailbox>) -> Self {
        insert_unique(&mut self.to, mailbox.into());
        self
    }

    #[must_use]
    pub fn with_cc(mut self, mailbox: impl Into<Mailbox>) -> Self {
        insert_unique(&mut self.cc, mailbox.into());
        self
    }

    #[must_use]
    pub fn with_bcc(mut self, mailbox: impl Into<Mailbox>) -> Self {
        insert_unique(&mut self.bcc, mailbox.into());
        self
    }

    #[must_use]
    pub fn with_reply_to(mut self, mailbox: impl Into<Mailbox>) -> Self {
        insert_unique(&mut self.reply_to, mailbox.into());
        self
    }

    #[must_use]
    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = subject.into();
        self
    }

    /// Set the HTML body.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    /// Append a child part.
    #[must_use]
    pub fn with_part(mut self, part: impl Into<MessagePart>) -> Self {
        self.parts.push(part.into());
        self
    }

    /// Append an attachment part.
    #[must_use]
    pub fn with_attachment(self, attachment: Attachment) -> Self {
        self.with_part(attachment)
    }

    pub fn from(&self) -> &[Mailbox] {
        &self.from
    }

    pub fn to(&self) -> &[Mailbox] {
        &self.to
    }

    pub fn cc(&self) -> &[Mailbox] {
        &self.cc
    }

    pub fn bcc(&self) -> &[Mailbox] {
        &self.bcc
    }

    pub fn reply_to(&self) -> &[Mailbox] {
        &self.reply_to
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn parts(&self) -> &[MessagePart] {
        &self.parts
    }

    /// Iterate over the parts classified as attachments, in order.
    pub fn attachments(&self) -> impl Iterator<Item = &Attachment> {
        self.parts.iter().filter_map(MessagePart::as_attachment)
    }

    /// Every `to`, `cc` and `bcc` address, in that order.
    pub fn recipients(&self) -> impl Iterator<Item = &Mailbox> {
        self.to.iter().chain(&self.cc).chain(&self.bcc)
    }
}
