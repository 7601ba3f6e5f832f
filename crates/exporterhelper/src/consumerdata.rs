//! Trace payloads handed to exporters.
//!
//! Two incompatible batch representations travel through the pipeline:
//!
//! - [`TraceData`]: the legacy in-memory batch, one flat list of spans
//!   attached to a node and resource.
//! - [`OtlpTraceData`]: the wire-format batch, spans nested under resources
//!   and instrumentation libraries.
//!
//! Exporter machinery never looks inside either; it only needs the number of
//! spans, exposed through [`RecordCount`].

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};

/// Capability shared by every batch variant: report how many span records it holds.
pub trait RecordCount {
    fn record_count(&self) -> usize;
}

/// Attribute value attached to spans and resources.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    String(String),
    Bool(bool),
    Int(i64),
    Double(f64),
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for AttributeValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for AttributeValue {
    fn from(value: f64) -> Self {
        Self::Double(value)
    }
}

pub type Attributes = HashMap<String, AttributeValue>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpanKind {
    Internal,
    Server,
    Client,
    Producer,
    Consumer,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpanStatus {
    Unset,
    Ok,
    Error { message: String },
}

/// A single span record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Span {
    pub trace_id: u128,
    pub span_id: u64,
    /// Zero for root spans.
    pub parent_span_id: u64,
    pub name: String,
    pub kind: SpanKind,
    pub start_time_unix_nanos: u64,
    pub end_time_unix_nanos: u64,
    pub status: SpanStatus,
    pub attributes: Attributes,
}

impl Span {
    /// Creates a span starting now, with no end time yet.
    pub fn new(
        trace_id: u128,
        span_id: u64,
        parent_span_id: u64,
        name: String,
        kind: SpanKind,
    ) -> Self {
        let now = unix_nanos();
        Self {
            trace_id,
            span_id,
            parent_span_id,
            name,
            kind,
            start_time_unix_nanos: now,
            end_time_unix_nanos: now,
            status: SpanStatus::Unset,
            attributes: Attributes::new(),
        }
    }

    pub fn with_attribute(
        mut self,
        key: impl Into<String>,
        value: impl Into<AttributeValue>,
    ) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn with_status(mut self, status: SpanStatus) -> Self {
        self.status = status;
        self
    }

    /// Marks the span finished at the current time.
    pub fn end(&mut self) {
        self.end_time_unix_nanos = unix_nanos().max(self.start_time_unix_nanos);
    }

    pub fn duration_nanos(&self) -> u64 {
        self.end_time_unix_nanos.saturating_sub(self.start_time_unix_nanos)
    }

    pub fn is_root(&self) -> bool {
        self.parent_span_id == 0
    }
}

fn unix_nanos() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_nanos() as u64)
}

/// Describes the process that produced a batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub service_name: String,
    pub host_name: String,
    pub pid: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub resource_type: String,
    pub attributes: Attributes,
}

// =============================================================================
// LEGACY BATCH
// =============================================================================

/// Legacy trace batch: a flat span list plus the node and resource it came from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TraceData {
    pub node: Option<Node>,
    pub resource: Option<Resource>,
    pub spans: Vec<Span>,
    /// Receiver format the batch was decoded from (e.g. `"jaeger"`, `"zipkin"`).
    pub source_format: String,
}

impl TraceData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            spans: Vec::with_capacity(capacity),
            ..Self::default()
        }
    }

    pub fn add(&mut self, span: Span) {
        self.spans.push(span);
    }

    pub fn len(&self) -> usize {
        self.spans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }
}

impl RecordCount for TraceData {
    fn record_count(&self) -> usize {
        self.spans.len()
    }
}

// =============================================================================
// WIRE-FORMAT BATCH
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InstrumentationLibrary {
    pub name: String,
    pub version: String,
}

/// Spans emitted by one instrumentation library.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InstrumentationLibrarySpans {
    pub instrumentation_library: Option<InstrumentationLibrary>,
    pub spans: Vec<Span>,
}

/// Spans grouped under the resource that emitted them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceSpans {
    pub resource: Option<Resource>,
    pub instrumentation_library_spans: Vec<InstrumentationLibrarySpans>,
}

/// Wire-format trace batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OtlpTraceData {
    resource_spans: Vec<ResourceSpans>,
}

impl OtlpTraceData {
    pub fn new(resource_spans: Vec<ResourceSpans>) -> Self {
        Self { resource_spans }
    }

    pub fn resource_spans(&self) -> &[ResourceSpans] {
        &self.resource_spans
    }

    pub fn into_resource_spans(self) -> Vec<ResourceSpans> {
        self.resource_spans
    }

    /// Total number of spans across every resource and library.
    pub fn span_count(&self) -> usize {
        self.resource_spans
            .iter()
            .flat_map(|rs| &rs.instrumentation_library_spans)
            .map(|ils| ils.spans.len())
            .sum()
    }
}

impl From<Vec<ResourceSpans>> for OtlpTraceData {
    fn from(resource_spans: Vec<ResourceSpans>) -> Self {
        Self::new(resource_spans)
    }
}

impl RecordCount for OtlpTraceData {
    fn record_count(&self) -> usize {
        self.span_count()
    }
}
