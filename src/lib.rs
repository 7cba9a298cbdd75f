pub mod cli;
pub mod protocol;
pub mod service;

pub use cli::ServerOptions;
pub use protocol::{Server, ServerError};
pub use service::{FileService, Service, ServiceRegistry};
