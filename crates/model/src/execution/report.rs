use crate::execution::result::OperationResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Outcome of one run: one result per catalog entry, in catalog order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub catalog: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub results: Vec<OperationResult>,
    /// Best-effort notes that do not change any result, e.g. a failed close.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl RunReport {
    pub fn new(catalog: impl Into<String>) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            catalog: catalog.into(),
            started_at: Utc::now(),
            finished_at: None,
            results: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn push(&mut self, result: OperationResult) {
        self.results.push(result);
    }

    pub fn warn(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&OperationResult> {
        self.results.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, OperationResult> {
        self.results.iter()
    }

    pub fn succeeded(&self) -> usize {
        self.results.iter().filter(|r| r.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.results.len() - self.succeeded()
    }

    pub fn is_all_ok(&self) -> bool {
        self.results.iter().all(|r| r.is_ok())
    }

    /// Compares two reports ignoring run id, timestamps and timings.
    pub fn structurally_eq(&self, other: &RunReport) -> bool {
        self.catalog == other.catalog
            && self.warnings == other.warnings
            && self.results.len() == other.results.len()
            && self
                .results
                .iter()
                .zip(other.results.iter())
                .all(|(a, b)| a.name == b.name && a.kind == b.kind && a.outcome == b.outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::execution::result::{ErrorKind, Payload};
    use crate::operation::spec::OperationKind;

    fn sample(elapsed: u64) -> RunReport {
        let mut report = RunReport::new("books");
        report.push(
            OperationResult::ok("find", OperationKind::Find, Payload::Records(vec![]))
                .with_elapsed(elapsed),
        );
        report.push(OperationResult::failed(
            "update",
            OperationKind::UpdateOne,
            ErrorKind::Driver,
            "boom",
        ));
        report.finish();
        report
    }

    #[test]
    fn counts_outcomes() {
        let report = sample(3);
        assert_eq!(report.len(), 2);
        assert_eq!(report.succeeded(), 1);
        assert_eq!(report.failed(), 1);
        assert!(!report.is_all_ok());
        assert!(report.finished_at.is_some());
    }

    #[test]
    fn structural_equality_ignores_timing_and_identity() {
        let a = sample(3);
        let b = sample(250);
        assert_ne!(a.run_id, b.run_id);
        assert!(a.structurally_eq(&b));
    }

    #[test]
    fn failed_result_serializes_with_status_tag() {
        let report = sample(0);
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["results"][1]["outcome"]["status"], "failed");
        assert_eq!(json["results"][1]["outcome"]["detail"]["kind"], "driver");
        assert_eq!(json["results"][0]["outcome"]["detail"]["type"], "records");
    }
}
