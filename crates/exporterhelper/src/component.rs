//! Contracts between exporters and the pipeline host that drives them.

use crate::consumerdata::{OtlpTraceData, TraceData};
use crate::context::Context;
use crate::error::ExportError;
use std::future::Future;

/// The pipeline host an exporter runs inside.
pub trait Host: Send + Sync {
    /// Reports an error the component cannot recover from.
    fn report_fatal_error(&self, err: ExportError);
}

/// A host that ignores every report.
#[derive(Debug, Clone, Copy, Default)]
pub struct NopHost;

impl Host for NopHost {
    fn report_fatal_error(&self, _err: ExportError) {}
}

/// Lifecycle every pipeline component goes through.
pub trait Component: Send + Sync {
    /// Called once by the host before any data flows.
    fn start(&self, host: &dyn Host) -> impl Future<Output = Result<(), ExportError>> + Send;

    /// Called once by the host during pipeline teardown.
    fn shutdown(&self) -> impl Future<Output = Result<(), ExportError>> + Send;
}

/// Receives legacy trace batches.
pub trait TraceConsumer: Send + Sync {
    fn consume_trace_data(
        &self,
        ctx: Context,
        td: TraceData,
    ) -> impl Future<Output = Result<(), ExportError>> + Send;
}

/// Receives wire-format trace batches.
pub trait OtlpTraceConsumer: Send + Sync {
    fn consume_otlp_trace(
        &self,
        ctx: Context,
        td: OtlpTraceData,
    ) -> impl Future<Output = Result<(), ExportError>> + Send;
}

/// A component consuming legacy trace batches.
pub trait TraceExporterComponent: Component + TraceConsumer {}

impl<T: Component + TraceConsumer> TraceExporterComponent for T {}

/// A component consuming wire-format trace batches.
pub trait OtlpTraceExporterComponent: Component + OtlpTraceConsumer {}

impl<T: Component + OtlpTraceConsumer> OtlpTraceExporterComponent for T {}
