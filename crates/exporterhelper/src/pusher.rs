//! Push functions and the observability decorator around them.
//!
//! A push function delivers one batch downstream and reports how many spans
//! it had to drop. It is the only part of an exporter that the exporter's
//! author writes; everything else is supplied by this crate.
//!
//! # Native async traits
//!
//! [`TraceDataPusher`] uses `impl Future<...> + Send` and is therefore not
//! object safe. [`TraceDataPusherBoxed`] is the object-safe companion, and
//! every pusher gets it through a blanket implementation.

use crate::consumerdata::RecordCount;
use crate::context::Context;
use crate::error::ExportError;
use crate::obsreport::{ExportOp, ObsReporter};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tracing::Instrument;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Outcome of one push: spans dropped, and the error if delivery failed.
///
/// A non-zero drop count with `Ok(())` is a partial success.
pub type PushResult = (usize, Result<(), ExportError>);

/// Delivers batches of type `B` downstream.
///
/// Any `Fn(Context, B) -> impl Future<Output = PushResult>` closure is a
/// pusher, so plain async closures can be handed to the exporter constructors.
pub trait TraceDataPusher<B>: Send + Sync {
    fn push(&self, ctx: Context, batch: B) -> impl Future<Output = PushResult> + Send;
}

impl<B, F, Fut> TraceDataPusher<B> for F
where
    F: Fn(Context, B) -> Fut + Send + Sync,
    Fut: Future<Output = PushResult> + Send,
{
    fn push(&self, ctx: Context, batch: B) -> impl Future<Output = PushResult> + Send {
        self(ctx, batch)
    }
}

/// Object-safe version of [`TraceDataPusher`] for dynamic dispatch.
pub trait TraceDataPusherBoxed<B>: Send + Sync {
    fn push_boxed(&self, ctx: Context, batch: B) -> BoxFuture<'_, PushResult>;
}

impl<B, T> TraceDataPusherBoxed<B> for T
where
    B: Send + 'static,
    T: TraceDataPusher<B>,
{
    fn push_boxed(&self, ctx: Context, batch: B) -> BoxFuture<'_, PushResult> {
        Box::pin(self.push(ctx, batch))
    }
}

/// A pusher wrapper that reports every push to an [`ObsReporter`].
///
/// Each call opens an export operation tagged with the exporter name, runs the
/// inner pusher inside the operation's span, and closes the operation with the
/// batch size, drop count and error. The inner result is returned untouched.
/// A push abandoned mid-flight still closes its operation, as cancelled.
///
/// The wrapper is itself a pusher, so other decorators can sit on either side
/// of it.
pub struct ObservedPusher<P> {
    inner: P,
    exporter_name: Arc<str>,
    reporter: Arc<dyn ObsReporter>,
}

impl<P> ObservedPusher<P> {
    pub fn new(
        inner: P,
        exporter_name: impl Into<Arc<str>>,
        reporter: Arc<dyn ObsReporter>,
    ) -> Self {
        Self {
            inner,
            exporter_name: exporter_name.into(),
            reporter,
        }
    }

}

/// Ends an export operation exactly once.
///
/// Dropped without `finish` (the push future was cancelled or panicked), it
/// ends the operation as [`ExportError::Cancelled`] with every span counted
/// as dropped.
struct ExportOpGuard<'a> {
    reporter: &'a dyn ObsReporter,
    ctx: Context,
    op: Option<ExportOp>,
    num_spans: usize,
}

impl ExportOpGuard<'_> {
    fn finish(mut self, dropped_spans: usize, err: Option<&ExportError>) {
        if let Some(op) = self.op.take() {
            self.reporter.end_trace_data_export_op(
                &self.ctx,
                op,
                self.num_spans,
                dropped_spans,
                err,
            );
        }
    }
}

impl Drop for ExportOpGuard<'_> {
    fn drop(&mut self) {
        if let Some(op) = self.op.take() {
            self.reporter.end_trace_data_export_op(
                &self.ctx,
                op,
                self.num_spans,
                self.num_spans,
                Some(&ExportError::Cancelled),
            );
        }
    }
}

impl<B, P> TraceDataPusher<B> for ObservedPusher<P>
where
    B: RecordCount + Send + 'static,
    P: TraceDataPusher<B>,
{
    async fn push(&self, ctx: Context, batch: B) -> PushResult {
        let (exporter_ctx, op) = self
            .reporter
            .start_trace_data_export_op(ctx, &self.exporter_name);

        // The batch moves into the inner pusher, so count it first.
        let num_spans = batch.record_count();
        let span = exporter_ctx.span().clone();
        let guard = ExportOpGuard {
            reporter: self.reporter.as_ref(),
            ctx: exporter_ctx.clone(),
            op: Some(op),
            num_spans,
        };

        let (dropped_spans, result) = self
            .inner
            .push(exporter_ctx, batch)
            .instrument(span)
            .await;

        guard.finish(dropped_spans, result.as_ref().err());
        (dropped_spans, result)
    }
}

/// Decorator combinators available on every pusher.
pub trait TraceDataPusherExt<B>: TraceDataPusher<B> + Sized {
    /// Wraps the pusher so every push is recorded by `reporter` under `exporter_name`.
    fn with_observability(
        self,
        exporter_name: impl Into<Arc<str>>,
        reporter: Arc<dyn ObsReporter>,
    ) -> ObservedPusher<Self> {
        ObservedPusher::new(self, exporter_name, reporter)
    }
}

impl<B, P: TraceDataPusher<B>> TraceDataPusherExt<B> for P {}
