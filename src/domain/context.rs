//! Error context extension trait
//!
//! `.context()` / `.with_context()` for `Result<T, HubError>`, in the spirit of
//! `anyhow::Context` but keeping the library error type.
//!
//! ```rust
//! use hubtrack::domain::Result;
//! use hubtrack::domain::context::ResultExt;
//!
//! fn read_seed(path: &str) -> Result<String> {
//!     std::fs::read_to_string(path).with_context(|| format!("Failed to read seed {path}"))
//! }
//! ```

use crate::domain::errors::HubError;
use crate::domain::result::Result;

/// Extension trait for adding context to `Result` types
pub trait ResultExt<T> {
    /// Add context to an error (eager)
    fn context<C>(self, context: C) -> Result<T>
    where
        C: std::fmt::Display + Send + Sync + 'static;

    /// Add context to an error, computed only on failure
    fn with_context<C, F>(self, f: F) -> Result<T>
    where
        C: std::fmt::Display + Send + Sync + 'static,
        F: FnOnce() -> C;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: Into<HubError>,
{
    fn context<C>(self, context: C) -> Result<T>
    where
        C: std::fmt::Display + Send + Sync + 'static,
    {
        self.map_err(|e| HubError::Other(format!("{context}: {}", e.into())))
    }

    fn with_context<C, F>(self, f: F) -> Result<T>
    where
        C: std::fmt::Display + Send + Sync + 'static,
        F: FnOnce() -> C,
    {
        self.map_err(|e| {
            let base_error = e.into();
            HubError::Other(format!("{}: {base_error}", f()))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::errors::StoreError;

    #[test]
    fn test_context_wraps_message() {
        let result: Result<()> = Err(HubError::Validation("bad weight".to_string()));
        let err = result.context("Failed to price G1").unwrap_err().to_string();
        assert!(err.contains("Failed to price G1"));
        assert!(err.contains("bad weight"));
    }

    #[test]
    fn test_with_context_is_lazy() {
        let called = std::cell::Cell::new(false);
        let result: Result<i32> = Ok(1);
        let _ = result.with_context(|| {
            called.set(true);
            "never"
        });
        assert!(!called.get());
    }

    #[test]
    fn test_context_from_store_error() {
        let result: std::result::Result<(), StoreError> =
            Err(StoreError::ConnectionFailed("refused".to_string()));
        let err = result.context("Loading challan C-100").unwrap_err().to_string();
        assert!(err.contains("Loading challan C-100"));
        assert!(err.contains("refused"));
    }

    #[test]
    fn test_io_error_with_context() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "File not found");
        let result: std::result::Result<(), std::io::Error> = Err(io_error);
        let err = result.context("Failed to read seed").unwrap_err().to_string();
        assert!(err.contains("File not found"));
    }
}
