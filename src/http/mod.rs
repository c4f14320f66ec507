//! HTTPS server module.
//!
//! The server includes:
//! - A rustls listener on all interfaces using the provisioned self-signed certificate
//! - Static file serving with directory listings
//! - Graceful shutdown on SIGTERM/SIGINT
//! - A strictly linear lifecycle observable through a watch channel

pub mod lifecycle;
pub mod server;
pub mod shutdown;
pub mod static_files;

pub use lifecycle::{Lifecycle, LifecycleError, ServerPhase};
pub use server::{start_server, Server, ServerError};
