//! Exporter Helper
//!
//! Turns a raw "push this batch of spans downstream" function into a complete
//! pipeline exporter. The helper validates construction inputs, wraps the push
//! function with export observability (one operation per push, recording batch
//! size, dropped spans and outcome), and exposes the start/consume/shutdown
//! lifecycle the pipeline host expects.
//!
//! Two batch representations are supported, legacy [`TraceData`] and
//! wire-format [`OtlpTraceData`]. Both go through the same generic
//! [`TraceExporter`], which only needs a batch's [`RecordCount`].
//!
//! The helper adds no retries, batching, queueing or backpressure. Whatever the
//! push function returns is what the caller gets.
//!
//! # Example
//!
//! ```ignore
//! use exporterhelper::{new_otlp_trace_exporter, with_shutdown, Context, ExporterSettings};
//!
//! let config = ExporterSettings::new("otlp", "otlp/backend");
//! let exporter = new_otlp_trace_exporter(
//!     Some(&config),
//!     Some(|_ctx: Context, td: OtlpTraceData| async move { send(td).await }),
//!     [with_shutdown(|| async { close_connections().await })],
//! )?;
//!
//! exporter.consume_otlp_trace(Context::background(), batch).await?;
//! exporter.shutdown().await?;
//! ```

pub mod component;
pub mod config;
pub mod consumerdata;
pub mod context;
pub mod error;
pub mod exporter;
pub mod obsreport;
pub mod options;
pub mod pusher;

// Re-export main types
pub use component::{
    Component, Host, NopHost, OtlpTraceConsumer, OtlpTraceExporterComponent, TraceConsumer,
    TraceExporterComponent,
};
pub use config::{ExporterConfig, ExporterSettings};
pub use consumerdata::{
    AttributeValue, InstrumentationLibrary, InstrumentationLibrarySpans, Node, OtlpTraceData,
    RecordCount, Resource, ResourceSpans, Span, SpanKind, SpanStatus, TraceData,
};
pub use context::Context;
pub use error::{ExportError, ExporterError};
pub use exporter::{
    new_otlp_trace_exporter, new_trace_exporter, LegacyTraceExporter, OtlpTraceExporter,
    TraceExporter,
};
pub use obsreport::{ExportMetrics, ExportOp, ObsReporter, TracingReporter};
pub use options::{with_reporter, with_shutdown, ExporterOption, ExporterOptions, ShutdownFn};
pub use pusher::{
    BoxFuture, ObservedPusher, PushResult, TraceDataPusher, TraceDataPusherBoxed,
    TraceDataPusherExt,
};
