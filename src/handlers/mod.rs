//! Download handlers
//!
//! A download handler serves requests for one URL scheme. `DownloadHandlers`
//! is the scheme-to-handler table the downloader dispatches through.
//!
//! Handlers are registered as factories. Non-lazy handlers are built at
//! registration time; lazy handlers are built the first time their scheme is
//! requested. A factory failure leaves the scheme unsupported, and the
//! failure is reported with every request for that scheme.

pub mod file;

pub use file::{FetchError, FileDownloadHandler, LocalFetchResult};

use crate::http::{Request, Response};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock};

/// Result type for download handler operations
pub type Result<T> = std::result::Result<T, HandlerError>;

/// Download handler errors
#[derive(Debug, thiserror::Error)]
pub enum HandlerError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("Unsupported URL scheme '{scheme}': {reason}")]
    UnsupportedScheme { scheme: String, reason: String },

    #[error("Handler not configured: {0}")]
    NotConfigured(String),
}

/// Serves download requests for one URL scheme
pub trait DownloadHandler: Send + Sync {
    /// Download `request` and produce its response
    fn download_request(&self, request: &Request) -> Result<Response>;
}

/// Builds a handler on demand
pub type HandlerFactory = Box<dyn Fn() -> Result<Arc<dyn DownloadHandler>> + Send + Sync>;

type Loaded = std::result::Result<Arc<dyn DownloadHandler>, String>;

struct Entry {
    factory: Option<HandlerFactory>,
    loaded: OnceLock<Loaded>,
}

impl Entry {
    fn load(&self) -> &Loaded {
        self.loaded.get_or_init(|| match &self.factory {
            Some(factory) => factory().map_err(|e| e.to_string()),
            None => Err("handler disabled".to_string()),
        })
    }
}

/// Scheme-to-handler table
#[derive(Default)]
pub struct DownloadHandlers {
    entries: HashMap<String, Entry>,
}

impl DownloadHandlers {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a table with the built-in handlers registered
    pub fn with_defaults() -> Self {
        let mut handlers = Self::new();
        handlers.register("file", FileDownloadHandler::LAZY, || -> Result<Arc<dyn DownloadHandler>> {
            Ok(Arc::new(FileDownloadHandler::new()))
        });
        handlers
    }

    /// Register a handler factory for `scheme`, replacing any previous one
    ///
    /// With `lazy == false` the factory runs immediately.
    pub fn register<F>(&mut self, scheme: &str, lazy: bool, factory: F)
    where
        F: Fn() -> Result<Arc<dyn DownloadHandler>> + Send + Sync + 'static,
    {
        let scheme = scheme.to_ascii_lowercase();
        let entry = Entry {
            factory: Some(Box::new(factory)),
            loaded: OnceLock::new(),
        };

        if !lazy {
            if let Err(reason) = entry.load() {
                log::warn!("Disabled {} download handler: {}", scheme, reason);
            }
        }

        self.entries.insert(scheme, entry);
    }

    /// Turn off handling for `scheme`
    pub fn disable(&mut self, scheme: &str) {
        self.entries.insert(
            scheme.to_ascii_lowercase(),
            Entry {
                factory: None,
                loaded: OnceLock::new(),
            },
        );
    }

    /// Get the handler for `scheme`, building it if needed
    pub fn handler_for(&self, scheme: &str) -> Result<Arc<dyn DownloadHandler>> {
        let scheme = scheme.to_ascii_lowercase();
        let entry = self
            .entries
            .get(&scheme)
            .ok_or_else(|| HandlerError::UnsupportedScheme {
                scheme: scheme.clone(),
                reason: "no handler available for that scheme".to_string(),
            })?;

        entry
            .load()
            .clone()
            .map_err(|reason| HandlerError::UnsupportedScheme { scheme, reason })
    }

    /// Check whether `scheme` has an entry (usable or not)
    pub fn contains(&self, scheme: &str) -> bool {
        self.entries.contains_key(&scheme.to_ascii_lowercase())
    }

    /// Dispatch `request` to the handler for its scheme
    pub fn download_request(&self, request: &Request) -> Result<Response> {
        let scheme = request.scheme().unwrap_or_default();
        let handler = self.handler_for(&scheme)?;
        handler.download_request(request)
    }
}

impl fmt::Debug for DownloadHandlers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut schemes: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        schemes.sort_unstable();
        f.debug_struct("DownloadHandlers")
            .field("schemes", &schemes)
            .finish()
    }
}
