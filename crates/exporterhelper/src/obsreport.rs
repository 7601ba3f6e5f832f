//! Observability reporting for export operations.
//!
//! [`ObsReporter`] is the seam between the exporter helper and whatever records
//! spans and counters. The helper calls it three ways: tag a context with the
//! exporter, start an export operation, end it with the outcome.
//! [`TracingReporter`] is the default backend, built on `tracing` spans plus
//! a set of atomic counters.

use crate::context::Context;
use crate::error::ExportError;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::field;

/// Operation name for a trace export by `exporter`.
pub fn trace_export_operation(exporter: &str) -> String {
    format!("exporter/{exporter}/traces")
}

/// Handle for one in-flight export operation.
///
/// Returned by [`ObsReporter::start_trace_data_export_op`] and handed back
/// to [`ObsReporter::end_trace_data_export_op`].
#[derive(Debug)]
pub struct ExportOp {
    exporter: Arc<str>,
    span: tracing::Span,
    started_at: Instant,
}

impl ExportOp {
    pub fn new(exporter: impl Into<Arc<str>>, span: tracing::Span) -> Self {
        Self {
            exporter: exporter.into(),
            span,
            started_at: Instant::now(),
        }
    }

    pub fn exporter(&self) -> &str {
        &self.exporter
    }

    pub fn span(&self) -> &tracing::Span {
        &self.span
    }

    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }
}

/// Records export operations on behalf of exporters.
///
/// Implementations must be safe to call from concurrent consume calls.
pub trait ObsReporter: Send + Sync {
    /// Derives a context tagged with the exporter's name.
    fn exporter_context(&self, ctx: Context, exporter: &str) -> Context {
        ctx.with_exporter(exporter)
    }

    /// Marks the start of a trace export operation.
    fn start_trace_data_export_op(&self, ctx: Context, exporter: &str) -> (Context, ExportOp);

    /// Marks the end of an operation started by `start_trace_data_export_op`.
    fn end_trace_data_export_op(
        &self,
        ctx: &Context,
        op: ExportOp,
        num_spans: usize,
        dropped_spans: usize,
        err: Option<&ExportError>,
    );
}

/// Counters fed by [`TracingReporter`].
#[derive(Debug, Default)]
pub struct ExportMetrics {
    /// Completed export operations, successful or not
    pub export_ops: AtomicU64,
    /// Operations whose push function returned an error
    pub failed_ops: AtomicU64,
    /// Spans delivered downstream
    pub sent_spans: AtomicU64,
    /// Spans the push function reported as dropped
    pub failed_spans: AtomicU64,
}

impl ExportMetrics {
    pub fn export_ops(&self) -> u64 {
        self.export_ops.load(Ordering::Relaxed)
    }

    pub fn failed_ops(&self) -> u64 {
        self.failed_ops.load(Ordering::Relaxed)
    }

    pub fn sent_spans(&self) -> u64 {
        self.sent_spans.load(Ordering::Relaxed)
    }

    pub fn failed_spans(&self) -> u64 {
        self.failed_spans.load(Ordering::Relaxed)
    }

    fn record(&self, num_spans: usize, dropped_spans: usize, failed: bool) {
        self.export_ops.fetch_add(1, Ordering::Relaxed);
        if failed {
            self.failed_ops.fetch_add(1, Ordering::Relaxed);
        }
        self.sent_spans
            .fetch_add(num_spans.saturating_sub(dropped_spans) as u64, Ordering::Relaxed);
        self.failed_spans
            .fetch_add(dropped_spans as u64, Ordering::Relaxed);
    }
}

/// Default reporter: one `tracing` span per export plus [`ExportMetrics`].
///
/// Clones share the same counters.
#[derive(Debug, Clone, Default)]
pub struct TracingReporter {
    metrics: Arc<ExportMetrics>,
}

impl TracingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn metrics(&self) -> &ExportMetrics {
        &self.metrics
    }
}

impl ObsReporter for TracingReporter {
    fn start_trace_data_export_op(&self, ctx: Context, exporter: &str) -> (Context, ExportOp) {
        // Without a span in the context, nest under whatever span the host is in.
        let parent = if ctx.span().is_none() {
            tracing::Span::current()
        } else {
            ctx.span().clone()
        };
        let span = tracing::info_span!(
            parent: &parent,
            "exporter/traces",
            exporter = %exporter,
            num_spans = field::Empty,
            dropped_spans = field::Empty,
            error = field::Empty,
        );
        let ctx = ctx
            .with_exporter(exporter)
            .with_operation(trace_export_operation(exporter))
            .with_span(span.clone());
        (ctx, ExportOp::new(exporter, span))
    }

    fn end_trace_data_export_op(
        &self,
        _ctx: &Context,
        op: ExportOp,
        num_spans: usize,
        dropped_spans: usize,
        err: Option<&ExportError>,
    ) {
        let span = op.span();
        span.record("num_spans", num_spans as u64);
        span.record("dropped_spans", dropped_spans as u64);
        self.metrics.record(num_spans, dropped_spans, err.is_some());

        let elapsed_us = op.elapsed().as_micros() as u64;
        match err {
            None => tracing::debug!(
                parent: span,
                exporter = op.exporter(),
                num_spans = num_spans as u64,
                dropped_spans = dropped_spans as u64,
                elapsed_us,
                "trace export finished"
            ),
            Some(e) => {
                span.record("error", field::display(e));
                tracing::warn!(
                    parent: span,
                    exporter = op.exporter(),
                    num_spans = num_spans as u64,
                    dropped_spans = dropped_spans as u64,
                    elapsed_us,
                    error = %e,
                    "trace export failed"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use tracing_subscriber::layer::{Context as LayerContext, SubscriberExt};
    use tracing_subscriber::registry::LookupSpan;
    use tracing_subscriber::Layer;

    /// Records every new span as `(name, parent name)`.
    #[derive(Clone, Default)]
    struct ParentRecorder {
        spans: Arc<Mutex<Vec<(String, Option<String>)>>>,
    }

    impl ParentRecorder {
        fn spans(&self) -> Vec<(String, Option<String>)> {
            self.spans.lock().unwrap().clone()
        }
    }

    impl<S> Layer<S> for ParentRecorder
    where
        S: tracing::Subscriber + for<'a> LookupSpan<'a>,
    {
        fn on_new_span(
            &self,
            _attrs: &tracing::span::Attributes<'_>,
            id: &tracing::span::Id,
            ctx: LayerContext<'_, S>,
        ) {
            if let Some(span) = ctx.span(id) {
                let parent = span.parent().map(|p| p.name().to_owned());
                self.spans
                    .lock()
                    .unwrap()
                    .push((span.name().to_owned(), parent));
            }
        }
    }

    fn named(name: &str, parent: Option<&str>) -> (String, Option<String>) {
        (name.to_owned(), parent.map(str::to_owned))
    }

    #[test]
    fn test_export_span_nests_under_current_span() {
        let recorder = ParentRecorder::default();
        let subscriber = tracing_subscriber::registry().with(recorder.clone());

        tracing::subscriber::with_default(subscriber, || {
            let reporter = TracingReporter::new();
            let pipeline = tracing::info_span!("pipeline");
            let _entered = pipeline.enter();

            let (ctx, op) = reporter.start_trace_data_export_op(Context::background(), "otlp");
            reporter.end_trace_data_export_op(&ctx, op, 1, 0, None);
        });

        assert_eq!(
            recorder.spans(),
            vec![
                named("pipeline", None),
                named("exporter/traces", Some("pipeline")),
            ]
        );
    }

    #[test]
    fn test_context_span_takes_precedence() {
        let recorder = ParentRecorder::default();
        let subscriber = tracing_subscriber::registry().with(recorder.clone());

        tracing::subscriber::with_default(subscriber, || {
            let reporter = TracingReporter::new();
            let receiver = tracing::info_span!("receiver");
            let ambient = tracing::info_span!("ambient");
            let _entered = ambient.enter();

            let ctx = Context::background().with_span(receiver);
            let (ctx, op) = reporter.start_trace_data_export_op(ctx, "otlp");
            reporter.end_trace_data_export_op(&ctx, op, 1, 0, None);
        });

        assert_eq!(
            recorder.spans(),
            vec![
                named("receiver", None),
                named("ambient", None),
                named("exporter/traces", Some("receiver")),
            ]
        );
    }

    #[test]
    fn test_operation_name() {
        assert_eq!(trace_export_operation("otlp"), "exporter/otlp/traces");
    }

    #[test]
    fn test_start_tags_context() {
        let reporter = TracingReporter::new();
        let (ctx, op) = reporter.start_trace_data_export_op(Context::background(), "jaeger");

        assert_eq!(ctx.exporter(), Some("jaeger"));
        assert_eq!(ctx.operation(), Some("exporter/jaeger/traces"));
        assert_eq!(op.exporter(), "jaeger");
    }

    #[test]
    fn test_exporter_context_only_tags() {
        let reporter = TracingReporter::new();
        let ctx = reporter.exporter_context(Context::background(), "zipkin");
        assert_eq!(ctx.exporter(), Some("zipkin"));
        assert_eq!(ctx.operation(), None);
    }

    #[test]
    fn test_metrics_accounting() {
        let reporter = TracingReporter::new();

        let (ctx, op) = reporter.start_trace_data_export_op(Context::background(), "e");
        reporter.end_trace_data_export_op(&ctx, op, 10, 3, Some(&ExportError::Timeout));

        let (ctx, op) = reporter.start_trace_data_export_op(Context::background(), "e");
        reporter.end_trace_data_export_op(&ctx, op, 5, 0, None);

        let metrics = reporter.metrics();
        assert_eq!(metrics.export_ops(), 2);
        assert_eq!(metrics.failed_ops(), 1);
        assert_eq!(metrics.sent_spans(), 12);
        assert_eq!(metrics.failed_spans(), 3);
    }

    #[test]
    fn test_dropped_above_total_does_not_underflow() {
        let reporter = TracingReporter::new();
        let (ctx, op) = reporter.start_trace_data_export_op(Context::background(), "e");
        reporter.end_trace_data_export_op(&ctx, op, 1, 4, None);

        assert_eq!(reporter.metrics().sent_spans(), 0);
        assert_eq!(reporter.metrics().failed_spans(), 4);
    }

    #[test]
    fn test_clones_share_metrics() {
        let reporter = TracingReporter::new();
        let clone = reporter.clone();
        let (ctx, op) = clone.start_trace_data_export_op(Context::background(), "e");
        clone.end_trace_data_export_op(&ctx, op, 2, 0, None);

        assert_eq!(reporter.metrics().sent_spans(), 2);
    }
}
