//! SendGrid mail transport for mailbridge.
//!
//! This crate implements the [`Transport`](mailbridge_transport::Transport)
//! trait, delivering [`Message`](mailbridge_core::Message)s through the
//! [SendGrid v3 Mail Send API](https://www.twilio.com/docs/sendgrid/api-reference/mail-send/mail-send).
//!
//! # Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use mailbridge_sendgrid::{SendGridConfig, SendGridTransport};
//! use mailbridge_transport::ListenerDispatcher;
//!
//! let config = SendGridConfig::from_env().expect("SENDGRID_API_KEY must be set");
//! let transport = SendGridTransport::new(config, Arc::new(ListenerDispatcher::new()))
//!     .expect("failed to build HTTP client");
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod transport;
pub mod types;

pub use client::{MailApi, SendGridClient};
pub use config::SendGridConfig;
pub use error::SendGridError;
pub use transport::SendGridTransport;
pub use types::{EmailAddress, SendGridAttachment, SendGridMail};
