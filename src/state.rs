//! Shared application state for request handling.

use std::sync::Arc;
use tera::Tera;

use crate::config::AppConfig;
use crate::middleware::ResponseHeaders;

/// Shared application state, cloneable across handlers via Arc-wrapped fields.
///
/// Holds the configuration, the Tera engine used for directory listings, and
/// the header set stamped onto every response.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub tera: Arc<Tera>,
    pub headers: Arc<ResponseHeaders>,
}

impl AppState {
    /// Creates a new application state with the default response headers.
    pub fn new(config: Arc<AppConfig>, tera: Tera) -> Self {
        Self {
            config,
            tera: Arc::new(tera),
            headers: Arc::new(ResponseHeaders::default()),
        }
    }
}
