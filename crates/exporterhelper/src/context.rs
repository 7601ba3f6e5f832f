//! Request-scoped context threaded through consume and push calls.

use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Values carried alongside a batch on its way to the push function.
///
/// A context is cheap to clone. Deriving a new context (`with_*`) keeps every
/// field it does not touch, so a deadline set by the host reaches the push
/// function unchanged.
#[derive(Debug, Clone)]
pub struct Context {
    exporter: Option<Arc<str>>,
    operation: Option<Arc<str>>,
    span: tracing::Span,
    deadline: Option<Instant>,
}

impl Default for Context {
    fn default() -> Self {
        Self::background()
    }
}

impl Context {
    /// An empty context with no tags, no span and no deadline.
    pub fn background() -> Self {
        Self {
            exporter: None,
            operation: None,
            span: tracing::Span::none(),
            deadline: None,
        }
    }

    /// Tags the context with the exporter it is flowing through.
    pub fn with_exporter(mut self, exporter: impl Into<Arc<str>>) -> Self {
        self.exporter = Some(exporter.into());
        self
    }

    /// Marks the start of a named operation.
    pub fn with_operation(mut self, operation: impl Into<Arc<str>>) -> Self {
        self.operation = Some(operation.into());
        self
    }

    /// Attaches the span that work done under this context belongs to.
    pub fn with_span(mut self, span: tracing::Span) -> Self {
        self.span = span;
        self
    }

    /// Sets an absolute deadline. An earlier existing deadline is kept.
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(current) => current.min(deadline),
            None => deadline,
        });
        self
    }

    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    pub fn exporter(&self) -> Option<&str> {
        self.exporter.as_deref()
    }

    pub fn operation(&self) -> Option<&str> {
        self.operation.as_deref()
    }

    pub fn span(&self) -> &tracing::Span {
        &self.span
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left before the deadline; `None` when no deadline is set.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }

    pub fn is_expired(&self) -> bool {
        self.deadline
            .is_some_and(|deadline| Instant::now() >= deadline)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_background_is_empty() {
        let ctx = Context::background();
        assert_eq!(ctx.exporter(), None);
        assert_eq!(ctx.operation(), None);
        assert!(ctx.span().is_none());
        assert_eq!(ctx.deadline(), None);
        assert!(!ctx.is_expired());
    }

    #[tokio::test]
    async fn test_derived_context_keeps_deadline() {
        let ctx = Context::background().with_timeout(Duration::from_secs(5));
        let deadline = ctx.deadline();

        let derived = ctx
            .with_exporter("otlp")
            .with_operation("exporter/otlp/traces");
        assert_eq!(derived.deadline(), deadline);
        assert_eq!(derived.exporter(), Some("otlp"));
        assert_eq!(derived.operation(), Some("exporter/otlp/traces"));
    }

    #[tokio::test]
    async fn test_earlier_deadline_wins() {
        let ctx = Context::background()
            .with_timeout(Duration::from_secs(1))
            .with_timeout(Duration::from_secs(60));
        assert!(ctx.remaining().unwrap() <= Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_expiry() {
        let ctx = Context::background().with_timeout(Duration::from_millis(10));
        assert!(!ctx.is_expired());

        tokio::time::advance(Duration::from_millis(20)).await;
        assert!(ctx.is_expired());
        assert_eq!(ctx.remaining(), Some(Duration::ZERO));
    }
}
