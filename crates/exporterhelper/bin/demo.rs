//! # Exporter Helper Demo
//!
//! Builds one exporter per batch representation from JSON settings, drives
//! them through the host lifecycle, and prints what the reporter saw.
//!
//! The push functions simulate a flaky backend: each push drops a few spans at
//! random and occasionally fails outright.
//!
//! ## Running
//!
//! ```bash
//! cargo run -p exporterhelper --bin demo
//!
//! # See the export spans and events
//! RUST_LOG=exporterhelper=debug cargo run -p exporterhelper --bin demo
//! ```

use exporterhelper::{
    new_otlp_trace_exporter, new_trace_exporter, with_reporter, with_shutdown, AttributeValue,
    Component, Context, ExportError, ExporterSettings, InstrumentationLibrary,
    InstrumentationLibrarySpans, NopHost, OtlpTraceConsumer, OtlpTraceData, PushResult,
    ResourceSpans, Span, SpanKind, TraceConsumer, TraceData, TracingReporter,
};
use rand::Rng;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

const BATCHES: usize = 20;
const FAILURE_RATE: f64 = 0.15;

const SETTINGS: &str = r#"[
    {"type": "jaeger", "name": "jaeger/legacy"},
    {"type": "otlp", "name": "otlp/backend"}
]"#;

/// Simulated downstream shared by both push functions.
#[derive(Default)]
struct SimulatedBackend {
    received: AtomicU64,
    connections_closed: AtomicU64,
}

impl SimulatedBackend {
    async fn deliver(&self, num_spans: usize) -> PushResult {
        tokio::time::sleep(Duration::from_millis(2)).await;

        let (failed, dropped) = {
            let mut rng = rand::thread_rng();
            (rng.gen_bool(FAILURE_RATE), rng.gen_range(0..=num_spans / 4))
        };
        if failed {
            return (
                num_spans,
                Err(ExportError::Transport("connection reset by peer".into())),
            );
        }

        self.received
            .fetch_add((num_spans - dropped) as u64, Ordering::Relaxed);
        (dropped, Ok(()))
    }

    fn close(&self) {
        self.connections_closed.fetch_add(1, Ordering::Relaxed);
    }
}

fn random_spans(count: usize) -> Vec<Span> {
    let mut rng = rand::thread_rng();
    let trace_id: u128 = rng.gen();
    (0..count)
        .map(|i| {
            let parent = if i == 0 { 0 } else { rng.gen() };
            let mut span = Span::new(
                trace_id,
                rng.gen(),
                parent,
                format!("op-{i}"),
                SpanKind::Server,
            )
            .with_attribute("service.name", "checkout")
            .with_attribute("http.status_code", AttributeValue::Int(200));
            span.end();
            span
        })
        .collect()
}

fn legacy_batch() -> TraceData {
    let count = rand::thread_rng().gen_range(1..=32);
    TraceData {
        spans: random_spans(count),
        source_format: "jaeger".into(),
        ..TraceData::default()
    }
}

fn otlp_batch() -> OtlpTraceData {
    let resources = rand::thread_rng().gen_range(1..=3);
    OtlpTraceData::new(
        (0..resources)
            .map(|_| ResourceSpans {
                resource: None,
                instrumentation_library_spans: vec![InstrumentationLibrarySpans {
                    instrumentation_library: Some(InstrumentationLibrary {
                        name: "demo".into(),
                        version: env!("CARGO_PKG_VERSION").into(),
                    }),
                    spans: random_spans(rand::thread_rng().gen_range(1..=16)),
                }],
            })
            .collect(),
    )
}

fn print_metrics(name: &str, reporter: &TracingReporter) {
    let metrics = reporter.metrics();
    println!(
        "{name:<16} ops={:<4} failed_ops={:<4} sent_spans={:<6} failed_spans={}",
        metrics.export_ops(),
        metrics.failed_ops(),
        metrics.sent_spans(),
        metrics.failed_spans()
    );
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let settings: Vec<ExporterSettings> = serde_json::from_str(SETTINGS)?;
    let backend = Arc::new(SimulatedBackend::default());
    let legacy_reporter = TracingReporter::new();
    let otlp_reporter = TracingReporter::new();

    let legacy_backend = Arc::clone(&backend);
    let closing_backend = Arc::clone(&backend);
    let legacy = new_trace_exporter(
        settings.first(),
        Some(move |_ctx: Context, td: TraceData| {
            let backend = Arc::clone(&legacy_backend);
            async move { backend.deliver(td.len()).await }
        }),
        [
            with_reporter(Arc::new(legacy_reporter.clone())),
            with_shutdown(move || {
                closing_backend.close();
                async { Ok(()) }
            }),
        ],
    )?;

    let otlp_backend = Arc::clone(&backend);
    let otlp = new_otlp_trace_exporter(
        settings.get(1),
        Some(move |ctx: Context, td: OtlpTraceData| {
            let backend = Arc::clone(&otlp_backend);
            async move {
                if ctx.is_expired() {
                    return (td.span_count(), Err(ExportError::Timeout));
                }
                backend.deliver(td.span_count()).await
            }
        }),
        [with_reporter(Arc::new(otlp_reporter.clone()))],
    )?;

    legacy.start(&NopHost).await?;
    otlp.start(&NopHost).await?;

    let mut failures = 0;
    for _ in 0..BATCHES {
        if legacy
            .consume_trace_data(Context::background(), legacy_batch())
            .await
            .is_err()
        {
            failures += 1;
        }
        let ctx = Context::background().with_timeout(Duration::from_millis(50));
        if otlp.consume_otlp_trace(ctx, otlp_batch()).await.is_err() {
            failures += 1;
        }
    }

    legacy.shutdown().await?;
    otlp.shutdown().await?;

    println!("\n=== Exporter Helper Demo ===");
    print_metrics(legacy.name(), &legacy_reporter);
    print_metrics(otlp.name(), &otlp_reporter);
    println!(
        "consume errors={failures} backend_received={} connections_closed={}",
        backend.received.load(Ordering::Relaxed),
        backend.connections_closed.load(Ordering::Relaxed)
    );
    Ok(())
}
