//! lanserve - serve a directory over self-signed HTTPS on the LAN.
//!
//! Browser features such as camera access only work in a secure context.
//! This crate provisions a self-signed certificate, serves the working
//! directory over HTTPS with permissive CORS and Permissions-Policy headers,
//! and prints the LAN URL to open from a phone.

pub mod banner;
pub mod cert;
pub mod config;
pub mod error;
pub mod http;
pub mod middleware;
pub mod net;
pub mod routes;
pub mod state;
pub mod templates;

pub use cert::{ensure_certificate, CertError, CertificatePaths};
pub use config::AppConfig;
pub use error::AppError;
pub use http::{start_server, Server, ServerError, ServerPhase};
