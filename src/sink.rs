//! Report delivery and latest-value caching
//!
//! Every successfully decoded report flows through a [`Dispatcher`]: the
//! latest-value slot for its class is overwritten first, then the consumer
//! callback runs. The slots are the only state shared between the
//! background worker and the caller, guarded by one `RwLock` per class so
//! a reader never observes a partially written report.
//!
//! A failing consumer callback never unwinds into the worker; the failure
//! is wrapped as [`GpsdWatchError::Callback`] and handed to the error
//! observer, after which the stream continues with the next record.

use std::sync::{Arc, PoisonError, RwLock};

use crate::error::GpsdWatchError;
use crate::protocol::v3::{Report, ReportClass};

/// Error type a consumer callback may return
pub type CallbackError = Box<dyn std::error::Error + Send + Sync>;

/// Consumer callback invoked once per decoded report, in arrival order
pub type ReportCallback = Box<dyn FnMut(Report) -> Result<(), CallbackError> + Send>;

/// Observer invoked for every error the worker recovers from
pub type ErrorObserver = Box<dyn FnMut(&GpsdWatchError) + Send>;

/// Last-seen report per class, shared between worker and caller
#[derive(Debug, Default)]
pub struct LatestReports {
    tpv: RwLock<Option<Report>>,
    sky: RwLock<Option<Report>>,
    att: RwLock<Option<Report>>,
}

impl LatestReports {
    fn slot(&self, class: ReportClass) -> &RwLock<Option<Report>> {
        match class {
            ReportClass::Tpv => &self.tpv,
            ReportClass::Sky => &self.sky,
            ReportClass::Att => &self.att,
        }
    }

    /// Snapshot of the last report seen for `class`, if any
    pub fn latest(&self, class: ReportClass) -> Option<Report> {
        self.slot(class)
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Overwrites the slot for the report's class
    ///
    /// Unrecognized reports have no slot and are delivered to the
    /// callback only.
    pub(crate) fn store(&self, report: &Report) {
        if let Some(class) = report.class() {
            *self
                .slot(class)
                .write()
                .unwrap_or_else(PoisonError::into_inner) = Some(report.clone());
        }
    }
}

/// Delivery boundary between the worker and the consumer
pub(crate) struct Dispatcher {
    on_report: ReportCallback,
    on_error: ErrorObserver,
    latest: Arc<LatestReports>,
}

impl Dispatcher {
    pub(crate) fn new(
        on_report: ReportCallback,
        on_error: ErrorObserver,
        latest: Arc<LatestReports>,
    ) -> Self {
        Dispatcher {
            on_report,
            on_error,
            latest,
        }
    }

    /// Caches the report, then hands it to the consumer
    pub(crate) fn dispatch(&mut self, report: Report) {
        self.latest.store(&report);
        if let Err(err) = (self.on_report)(report) {
            let err = GpsdWatchError::Callback(err);
            tracing::warn!(error = %err, "consumer callback failed");
            (self.on_error)(&err);
        }
    }

    /// Forwards a recovered error to the observer
    pub(crate) fn observe(&mut self, err: &GpsdWatchError) {
        (self.on_error)(err);
    }
}
