pub mod config;
pub mod dispatcher;
pub mod error;
pub mod event;
pub mod listener;
pub mod log;
pub mod transport;

pub use config::{ConfigSource, EnvSource, MapSource};
pub use dispatcher::{EventDispatcher, ListenerDispatcher, NullDispatcher};
pub use error::{ProviderRequestError, TransportError};
pub use event::{Dispatch, SendEvent, SendEventKind, SendResult, TransportExceptionEvent};
pub use listener::EventListener;
pub use log::LogListener;
pub use transport::{DynTransport, Transport};
