//! Error types for exporter construction and trace export.

use thiserror::Error;

/// Errors returned when an exporter cannot be constructed.
///
/// Construction either succeeds completely or fails with one of these; no
/// partially built exporter is ever handed out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ExporterError {
    /// No configuration was supplied.
    #[error("nil config")]
    NilConfig,

    /// No push function was supplied.
    #[error("nil pushTraceData")]
    NilPushTraceData,
}

/// Errors produced by push functions and shutdown procedures.
///
/// The exporter layer treats these as opaque: they are observed and passed
/// through verbatim, never classified or retried here.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExportError {
    /// Transport-layer error (network, gRPC, HTTP)
    #[error("transport error: {0}")]
    Transport(String),
    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(String),
    /// Export operation timed out
    #[error("export operation timed out")]
    Timeout,
    /// The push was abandoned before it returned
    #[error("export operation cancelled")]
    Cancelled,
    /// Releasing downstream resources failed
    #[error("shutdown failed: {0}")]
    Shutdown(String),
    /// Anything else a push function wants to surface
    #[error("{0}")]
    Other(String),
}

impl ExportError {
    /// Returns `true` if a caller-side retry layer could reasonably try again.
    #[inline]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Timeout)
    }
}
