//! Exporter objects built around caller-supplied push functions.
//!
//! [`new_trace_exporter`] and [`new_otlp_trace_exporter`] validate their
//! inputs, resolve options, wrap the push function in an [`ObservedPusher`]
//! and return a [`TraceExporter`] ready to be driven by the pipeline host.
//! The raw push function is never reachable afterwards, so every batch is
//! observed.

use crate::component::{Component, Host, OtlpTraceConsumer, TraceConsumer};
use crate::config::ExporterConfig;
use crate::consumerdata::{OtlpTraceData, RecordCount, TraceData};
use crate::context::Context;
use crate::error::{ExportError, ExporterError};
use crate::obsreport::ObsReporter;
use crate::options::{ExporterOption, ExporterOptions, ShutdownFn};
use crate::pusher::{ObservedPusher, TraceDataPusher, TraceDataPusherBoxed};
use std::fmt;
use std::sync::Arc;

/// Exporter for batches of type `B`.
///
/// Name, push function and shutdown procedure are fixed at construction.
/// Consuming after shutdown is not guarded here; the push function decides
/// what happens to a closed downstream.
pub struct TraceExporter<B> {
    exporter_full_name: Arc<str>,
    data_pusher: Box<dyn TraceDataPusherBoxed<B>>,
    reporter: Arc<dyn ObsReporter>,
    shutdown: ShutdownFn,
}

/// Exporter for legacy [`TraceData`] batches.
pub type LegacyTraceExporter = TraceExporter<TraceData>;

/// Exporter for wire-format [`OtlpTraceData`] batches.
pub type OtlpTraceExporter = TraceExporter<OtlpTraceData>;

/// Creates an exporter for legacy trace batches.
///
/// Every push is wrapped in an export operation recorded by the configured
/// reporter. Without options the exporter only tags contexts with its name,
/// reports to a fresh `TracingReporter`, and shuts down as a no-op.
pub fn new_trace_exporter<C, P>(
    config: Option<&C>,
    data_pusher: Option<P>,
    options: impl IntoIterator<Item = ExporterOption>,
) -> Result<LegacyTraceExporter, ExporterError>
where
    C: ExporterConfig + ?Sized,
    P: TraceDataPusher<TraceData> + 'static,
{
    TraceExporter::build(config, data_pusher, options)
}

/// Creates an exporter for wire-format trace batches.
pub fn new_otlp_trace_exporter<C, P>(
    config: Option<&C>,
    data_pusher: Option<P>,
    options: impl IntoIterator<Item = ExporterOption>,
) -> Result<OtlpTraceExporter, ExporterError>
where
    C: ExporterConfig + ?Sized,
    P: TraceDataPusher<OtlpTraceData> + 'static,
{
    TraceExporter::build(config, data_pusher, options)
}

impl<B> TraceExporter<B>
where
    B: RecordCount + Send + 'static,
{
    fn build<C, P>(
        config: Option<&C>,
        data_pusher: Option<P>,
        options: impl IntoIterator<Item = ExporterOption>,
    ) -> Result<Self, ExporterError>
    where
        C: ExporterConfig + ?Sized,
        P: TraceDataPusher<B> + 'static,
    {
        let config = config.ok_or(ExporterError::NilConfig)?;
        let data_pusher = data_pusher.ok_or(ExporterError::NilPushTraceData)?;

        let (shutdown, reporter) = ExporterOptions::new(options).resolve();
        let exporter_full_name: Arc<str> = Arc::from(config.name());
        let data_pusher = Box::new(ObservedPusher::new(
            data_pusher,
            Arc::clone(&exporter_full_name),
            Arc::clone(&reporter),
        ));

        tracing::debug!(
            exporter = %exporter_full_name,
            exporter_type = config.exporter_type(),
            "trace exporter created"
        );

        Ok(Self {
            exporter_full_name,
            data_pusher,
            reporter,
            shutdown,
        })
    }

    /// Full name of this exporter instance, as taken from its configuration.
    pub fn name(&self) -> &str {
        &self.exporter_full_name
    }

    /// Pushes `batch` through the instrumented push function.
    ///
    /// Only the error is returned; the drop count is visible to the reporter
    /// but not to the caller.
    pub async fn consume(&self, ctx: Context, batch: B) -> Result<(), ExportError> {
        let exporter_ctx = self
            .reporter
            .exporter_context(ctx, &self.exporter_full_name);
        let (_dropped_spans, result) = self.data_pusher.push_boxed(exporter_ctx, batch).await;
        result
    }
}

impl<B> fmt::Debug for TraceExporter<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TraceExporter")
            .field("exporter_full_name", &self.exporter_full_name)
            .finish_non_exhaustive()
    }
}

impl<B> Component for TraceExporter<B>
where
    B: RecordCount + Send + 'static,
{
    async fn start(&self, _host: &dyn Host) -> Result<(), ExportError> {
        Ok(())
    }

    async fn shutdown(&self) -> Result<(), ExportError> {
        (self.shutdown)().await
    }
}

impl TraceConsumer for LegacyTraceExporter {
    async fn consume_trace_data(&self, ctx: Context, td: TraceData) -> Result<(), ExportError> {
        self.consume(ctx, td).await
    }
}

impl OtlpTraceConsumer for OtlpTraceExporter {
    async fn consume_otlp_trace(
        &self,
        ctx: Context,
        td: OtlpTraceData,
    ) -> Result<(), ExportError> {
        self.consume(ctx, td).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::NopHost;
    use crate::config::ExporterSettings;
    use crate::consumerdata::{Span, SpanKind};
    use crate::options::with_shutdown;
    use crate::pusher::PushResult;
    use std::future::{ready, Ready};

    type LegacyPushFn = fn(Context, TraceData) -> Ready<PushResult>;
    type OtlpPushFn = fn(Context, OtlpTraceData) -> Ready<PushResult>;

    const NO_CONFIG: Option<&ExporterSettings> = None;

    fn ok_legacy(_ctx: Context, _td: TraceData) -> Ready<PushResult> {
        ready((0, Ok(())))
    }

    fn ok_otlp(_ctx: Context, _td: OtlpTraceData) -> Ready<PushResult> {
        ready((0, Ok(())))
    }

    fn legacy_pusher() -> Option<LegacyPushFn> {
        Some(ok_legacy)
    }

    fn otlp_pusher() -> Option<OtlpPushFn> {
        Some(ok_otlp)
    }

    fn settings() -> ExporterSettings {
        ExporterSettings::new("test", "test/exporter")
    }

    #[test]
    fn test_nil_config() {
        let err = new_trace_exporter(NO_CONFIG, legacy_pusher(), []).unwrap_err();
        assert_eq!(err, ExporterError::NilConfig);

        let err = new_otlp_trace_exporter(NO_CONFIG, otlp_pusher(), []).unwrap_err();
        assert_eq!(err, ExporterError::NilConfig);
    }

    #[test]
    fn test_nil_config_checked_before_pusher() {
        let err = new_trace_exporter(NO_CONFIG, None::<LegacyPushFn>, []).unwrap_err();
        assert_eq!(err, ExporterError::NilConfig);
    }

    #[test]
    fn test_nil_pusher() {
        let err = new_trace_exporter(Some(&settings()), None::<LegacyPushFn>, []).unwrap_err();
        assert_eq!(err, ExporterError::NilPushTraceData);

        let err = new_otlp_trace_exporter(Some(&settings()), None::<OtlpPushFn>, []).unwrap_err();
        assert_eq!(err, ExporterError::NilPushTraceData);
    }

    #[test]
    fn test_name_comes_from_config() {
        let exporter = new_trace_exporter(Some(&settings()), legacy_pusher(), []).unwrap();
        assert_eq!(exporter.name(), "test/exporter");
    }

    #[test]
    fn test_empty_name_is_accepted() {
        let config = ExporterSettings::new("test", "");
        let exporter = new_otlp_trace_exporter(Some(&config), otlp_pusher(), []).unwrap();
        assert_eq!(exporter.name(), "");
    }

    #[tokio::test]
    async fn test_lifecycle_defaults() {
        let exporter = new_trace_exporter(Some(&settings()), legacy_pusher(), []).unwrap();

        assert!(exporter.start(&NopHost).await.is_ok());
        let mut td = TraceData::new();
        td.add(Span::new(1, 1, 0, "test".into(), SpanKind::Internal));
        assert!(exporter
            .consume_trace_data(Context::background(), td)
            .await
            .is_ok());
        assert!(exporter.shutdown().await.is_ok());
    }

    #[tokio::test]
    async fn test_shutdown_error_is_returned() {
        let exporter = new_otlp_trace_exporter(
            Some(&settings()),
            otlp_pusher(),
            [with_shutdown(|| async {
                Err(ExportError::Shutdown("flush failed".into()))
            })],
        )
        .unwrap();

        assert_eq!(
            exporter.shutdown().await,
            Err(ExportError::Shutdown("flush failed".into()))
        );
    }

    #[tokio::test]
    async fn test_consume_after_shutdown_is_not_guarded() {
        let exporter = new_otlp_trace_exporter(Some(&settings()), otlp_pusher(), []).unwrap();
        exporter.shutdown().await.unwrap();
        assert!(exporter
            .consume_otlp_trace(Context::background(), OtlpTraceData::default())
            .await
            .is_ok());
    }
}
