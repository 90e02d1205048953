use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How a mail client should present an attachment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Disposition {
    /// Rendered in the message body (e.g. images referenced by `cid:`).
    Inline,
    /// Offered as a downloadable file.
    #[default]
    Attachment,
}

impl Disposition {
    /// The MIME `Content-Disposition` token.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Inline => "inline",
            Self::Attachment => "attachment",
        }
    }
}

/// A file attached to a [`Message`](crate::Message).
///
/// Every attachment gets a content-id when it is created, so inline parts can
/// be referenced from the HTML body as `cid:<content_id>`.
///
/// # Examples
///
/// ```
/// use mailbridge_core::{Attachment, Disposition};
///
/// let report = Attachment::new(b"%PDF-1.7".to_vec(), "application/pdf", "report.pdf");
/// assert_eq!(report.disposition(), Disposition::Attachment);
/// assert!(report.content_id().ends_with("@mailbridge.generated"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    content: Vec<u8>,
    content_type: String,
    filename: String,
    disposition: Disposition,
    content_id: String,
}

impl Attachment {
    /// Create a regular (downloadable) attachment.
    pub fn new(
        content: impl Into<Vec<u8>>,
        content_type: impl Into<String>,
        filename: impl Into<String>,
    ) -> Self {
        Self {
            content: content.into(),
            content_type: content_type.into(),
            filename: filename.into(),
            disposition: Disposition::Attachment,
            content_id: generate_content_id(),
        }
    }

    /// Create an inline attachment.
    pub fn inline(
        content: impl Into<Vec<u8>>,
        content_type: impl Into<String>,
        filename: impl Into<String>,
    ) -> Self {
        Self::new(content, content_type, filename).with_disposition(Disposition::Inline)
    }

    /// Override the disposition.
    #[must_use]
    pub fn with_disposition(mut self, disposition: Disposition) -> Self {
        self.disposition = disposition;
        self
    }

    /// Override the generated content-id.
    #[must_use]
    pub fn with_content_id(mut self, content_id: impl Into<String>) -> Self {
        self.content_id = content_id.into();
        self
    }

    pub fn content(&self) -> &[u8] {
        &self.content
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn disposition(&self) -> Disposition {
        self.disposition
    }

    pub fn content_id(&self) -> &str {
        &self.content_id
    }
}

fn generate_content_id() -> String {
    format!("{}@mailbridge.generated", Uuid::new_v4().simple())
}
