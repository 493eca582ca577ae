use crate::{
    error::RunError,
    execution::{
        dispatch::{Failure, dispatch},
        session::Session,
    },
};
use connectors::StoreHandle;
use engine_config::settings::run::RunSettings;
use futures::FutureExt;
use model::{
    execution::{
        report::RunReport,
        result::{ErrorKind, OperationResult, Outcome, Payload},
    },
    operation::{catalog::Catalog, spec::OperationSpec},
};
use std::{any::Any, panic::AssertUnwindSafe};
use tokio::time::{Instant, timeout_at};
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, error, info, info_span, warn};

/// Runs every catalog entry, in order, against `store`.
///
/// The store is connected first; if that fails the run ends with
/// [`RunError::Connection`] and nothing else is attempted. Once connected, the
/// report holds exactly one result per entry and the store is closed exactly
/// once, whatever the individual operations did.
pub async fn run(
    catalog: &Catalog,
    store: &mut dyn StoreHandle,
    settings: &RunSettings,
    cancel: CancellationToken,
) -> Result<RunReport, RunError> {
    CatalogExecutor::new(catalog, settings, cancel)
        .execute(store)
        .await
}

struct CatalogExecutor<'a> {
    catalog: &'a Catalog,
    settings: &'a RunSettings,
    cancel: CancellationToken,
}

impl<'a> CatalogExecutor<'a> {
    fn new(catalog: &'a Catalog, settings: &'a RunSettings, cancel: CancellationToken) -> Self {
        Self {
            catalog,
            settings,
            cancel,
        }
    }

    async fn execute(self, store: &mut dyn StoreHandle) -> Result<RunReport, RunError> {
        let report = RunReport::new(&self.catalog.name);
        let span = info_span!(
            "run",
            catalog = %self.catalog.name,
            run_id = %report.run_id
        );
        self.execute_in(store, report).instrument(span).await
    }

    async fn execute_in(
        &self,
        store: &mut dyn StoreHandle,
        mut report: RunReport,
    ) -> Result<RunReport, RunError> {
        let mut session = Session::new(store);
        session.open().await?;

        let operations = self.run_all(&session, &mut report).await;

        if let Err(e) = session.release().await {
            warn!("Failed to close store: {}", e);
            report.warn(format!("Failed to close store: {e}"));
        }
        operations?;

        report.finish();
        info!(
            "Run finished: {} ok, {} failed",
            report.succeeded(),
            report.failed()
        );
        Ok(report)
    }

    async fn run_all(
        &self,
        session: &Session<'_>,
        report: &mut RunReport,
    ) -> Result<(), RunError> {
        let store = session.store()?;
        // A deadline too far out to represent is no deadline at all.
        let deadline = self
            .settings
            .deadline
            .and_then(|d| Instant::now().checked_add(d));
        let total = self.catalog.len();
        info!("Running {} operations", total);

        for (idx, spec) in self.catalog.iter().enumerate() {
            let result = match self.halted(deadline) {
                Some(failure) => Self::record(spec, Err(failure), 0),
                None => {
                    info!(
                        "Running operation {}/{}: {} ({})",
                        idx + 1,
                        total,
                        spec.name,
                        spec.kind()
                    );
                    self.run_one(store, spec, deadline).await
                }
            };
            Self::log_result(&result);
            report.push(result);
        }
        Ok(())
    }

    /// Why no further operation may start, if anything stops it.
    fn halted(&self, deadline: Option<Instant>) -> Option<Failure> {
        if self.cancel.is_cancelled() {
            return Some(Failure::new(
                ErrorKind::Cancelled,
                "Run cancelled before the operation started",
            ));
        }
        if deadline.is_some_and(|d| Instant::now() >= d) {
            return Some(Failure::new(
                ErrorKind::Timeout,
                "Run deadline passed before the operation started",
            ));
        }
        None
    }

    async fn run_one(
        &self,
        store: &dyn StoreHandle,
        spec: &OperationSpec,
        deadline: Option<Instant>,
    ) -> OperationResult {
        let started = std::time::Instant::now();

        let call = AssertUnwindSafe(dispatch(store, &spec.operation)).catch_unwind();
        let bounded = async {
            match deadline {
                Some(deadline) => timeout_at(deadline, call).await.map_err(|_| {
                    Failure::new(ErrorKind::Timeout, "Operation exceeded the run deadline")
                }),
                None => Ok(call.await),
            }
        };

        let outcome = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(Failure::new(
                ErrorKind::Cancelled,
                "Run cancelled while the operation was in flight",
            )),
            finished = bounded => match finished {
                Ok(Ok(outcome)) => outcome,
                Ok(Err(panic)) => Err(Failure::new(
                    ErrorKind::Driver,
                    format!("Store panicked: {}", panic_message(&*panic)),
                )),
                Err(timed_out) => Err(timed_out),
            },
        };

        let elapsed_ms = started.elapsed().as_millis() as u64;
        Self::record(spec, outcome, elapsed_ms)
    }

    fn record(
        spec: &OperationSpec,
        outcome: Result<Payload, Failure>,
        elapsed_ms: u64,
    ) -> OperationResult {
        let result = match outcome {
            Ok(payload) => OperationResult::ok(&spec.name, spec.kind(), payload),
            Err(Failure(failure)) => {
                OperationResult::failed(&spec.name, spec.kind(), failure.kind, failure.message)
            }
        };
        result.with_elapsed(elapsed_ms)
    }

    fn log_result(result: &OperationResult) {
        match &result.outcome {
            Outcome::Ok(payload) => {
                info!("{} ok in {}ms: {}", result.name, result.elapsed_ms, payload)
            }
            Outcome::Failed(failure) if failure.kind == ErrorKind::Driver => {
                error!("{} failed: {}", result.name, failure.message)
            }
            Outcome::Failed(failure) => {
                warn!("{} failed ({}): {}", result.name, failure.kind, failure.message)
            }
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    panic
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| panic.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("(non-string panic)")
}
