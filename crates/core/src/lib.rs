//! Message model shared by mailbridge transports.
//!
//! A [`Message`] is what a mail-composition layer hands to a transport. It is
//! read-only from the transport's point of view.

pub mod attachment;
pub mod mailbox;
pub mod message;
pub mod response;

pub use attachment::{Attachment, Disposition};
pub use mailbox::Mailbox;
pub use message::{BodyPart, Message, MessagePart};
pub use response::{ApiResponse, STATUS_ACCEPTED};
