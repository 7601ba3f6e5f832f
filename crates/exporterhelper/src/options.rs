//! Construction options shared by every exporter variant.

use crate::error::ExportError;
use crate::obsreport::{ObsReporter, TracingReporter};
use crate::pusher::BoxFuture;
use std::future::Future;
use std::sync::Arc;

/// Releases whatever the push function holds on to.
pub type ShutdownFn = Box<dyn Fn() -> BoxFuture<'static, Result<(), ExportError>> + Send + Sync>;

/// Mutates [`ExporterOptions`] during construction.
pub type ExporterOption = Box<dyn FnOnce(&mut ExporterOptions) + Send>;

/// Optional settings collected from [`ExporterOption`]s.
///
/// Unset fields fall back to defaults in [`ExporterOptions::resolve`].
#[derive(Default)]
pub struct ExporterOptions {
    pub shutdown: Option<ShutdownFn>,
    pub reporter: Option<Arc<dyn ObsReporter>>,
}

impl ExporterOptions {
    /// Applies `options` in order; a later option overwrites an earlier one.
    pub fn new(options: impl IntoIterator<Item = ExporterOption>) -> Self {
        let mut opts = Self::default();
        for option in options {
            option(&mut opts);
        }
        opts
    }

    /// Fills in the defaults: a shutdown that does nothing and a [`TracingReporter`].
    pub(crate) fn resolve(self) -> (ShutdownFn, Arc<dyn ObsReporter>) {
        let shutdown = self.shutdown.unwrap_or_else(|| {
            Box::new(|| -> BoxFuture<'static, Result<(), ExportError>> {
                Box::pin(async { Ok(()) })
            })
        });
        let reporter = self
            .reporter
            .unwrap_or_else(|| Arc::new(TracingReporter::new()));
        (shutdown, reporter)
    }
}

/// Sets the procedure run by `Component::shutdown`.
pub fn with_shutdown<F, Fut>(shutdown: F) -> ExporterOption
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), ExportError>> + Send + 'static,
{
    Box::new(move |opts: &mut ExporterOptions| {
        opts.shutdown = Some(Box::new(
            move || -> BoxFuture<'static, Result<(), ExportError>> { Box::pin(shutdown()) },
        ));
    })
}

/// Sends export observability to `reporter` instead of a fresh [`TracingReporter`].
pub fn with_reporter(reporter: Arc<dyn ObsReporter>) -> ExporterOption {
    Box::new(move |opts: &mut ExporterOptions| {
        opts.reporter = Some(reporter);
    })
}
