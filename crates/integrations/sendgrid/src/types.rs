use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use mailbridge_core::{Attachment, Disposition, Mailbox};
use serde::Serialize;

/// An address in the SendGrid request schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmailAddress {
    pub email: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl EmailAddress {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            name: None,
        }
    }
}

impl From<&Mailbox> for EmailAddress {
    fn from(mailbox: &Mailbox) -> Self {
        Self {
            email: mailbox.email.clone(),
            name: mailbox.name.clone().filter(|name| !name.is_empty()),
        }
    }
}

/// Recipient block of a SendGrid request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Personalization {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub to: Vec<EmailAddress>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub cc: Vec<EmailAddress>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub bcc: Vec<EmailAddress>,
}

/// A body content block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Content {
    /// MIME type, e.g. `"text/html"`.
    #[serde(rename = "type")]
    pub content_type: String,

    pub value: String,
}

/// An attachment in the SendGrid request schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SendGridAttachment {
    /// Base64-encoded file content.
    pub content: String,

    #[serde(rename = "type")]
    pub content_type: String,

    pub filename: String,

    pub disposition: Disposition,

    pub content_id: String,
}

impl From<&Attachment> for SendGridAttachment {
    fn from(attachment: &Attachment) -> Self {
        Self {
            content: STANDARD.encode(attachment.content()),
            content_type: attachment.content_type().to_owned(),
            filename: attachment.filename().to_owned(),
            disposition: attachment.disposition(),
            content_id: attachment.content_id().to_owned(),
        }
    }
}

/// JSON request body for the SendGrid v3 Mail Send API (`POST /v3/mail/send`).
///
/// Built once per send with a single personalization carrying every
/// recipient.
///
/// # Examples
///
/// ```
/// use mailbridge_sendgrid::types::{EmailAddress, SendGridMail};
///
/// let mut mail = SendGridMail::new();
/// mail.set_from(EmailAddress::new("alerts@example.com"));
/// mail.add_to(EmailAddress::new("oncall@example.com"));
/// mail.set_subject("Disk almost full");
/// mail.add_content("text/html", "<p>/var is at 93%</p>");
///
/// let json = serde_json::to_value(&mail).unwrap();
/// assert_eq!(json["personalizations"][0]["to"][0]["email"], "oncall@example.com");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SendGridMail {
    pub personalizations: Vec<Personalization>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<EmailAddress>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<EmailAddress>,

    pub subject: String,

    pub content: Vec<Content>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<SendGridAttachment>,
}

impl Default for SendGridMail {
    fn default() -> Self {
        Self::new()
    }
}

impl SendGridMail {
    /// Create an empty request with one personalization.
    pub fn new() -> Self {
        Self {
            personalizations: vec![Personalization::default()],
            from: None,
            reply_to: None,
            subject: String::new(),
            content: Vec::new(),
            attachments: Vec::new(),
        }
    }

    fn personalization_mut(&mut self) -> &mut Personalization {
        if self.personalizations.is_empty() {
            self.personalizations.push(Personalization::default());
        }
        &mut self.personalizations[0]
    }

    pub fn set_from(&mut self, address: EmailAddress) {
        self.from = Some(address);
    }

    pub fn add_to(&mut self, address: EmailAddress) {
        self.personalization_mut().to.push(address);
    }

    pub fn add_cc(&mut self, address: EmailAddress) {
        self.personalization_mut().cc.push(address);
    }

    pub fn add_bcc(&mut self, address: EmailAddress) {
        self.personalization_mut().bcc.push(address);
    }

    pub fn set_reply_to(&mut self, address: EmailAddress) {
        self.reply_to = Some(address);
    }

    pub fn add_attachment(&mut self, attachment: SendGridAttachment) {
        self.attachments.push(attachment);
    }

    pub fn set_subject(&mut self, subject: impl Into<String>) {
        self.subject = subject.into();
    }

    pub fn add_content(&mut self, content_type: impl Into<String>, value: impl Into<String>) {
        self.content.push(Content {
            content_type: content_type.into(),
            value: value.into(),
        });
    }

    /// Every `to`, `cc` and `bcc` address across all personalizations.
    pub fn recipients(&self) -> impl Iterator<Item = &EmailAddress> {
        self.personalizations
            .iter()
            .flat_map(|p| p.to.iter().chain(&p.cc).chain(&p.bcc))
    }
}
