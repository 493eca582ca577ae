use crate::{error::ConfigError, report::finding::Finding};
use model::operation::{
    catalog::Catalog,
    spec::{Operation, OperationSpec},
};
use tracing::{info, warn};

/// Static checks over a catalog before it is run. Findings never change what
/// a run does; only error-severity findings stop it from starting.
pub struct CatalogValidator<'a> {
    catalog: &'a Catalog,
}

impl<'a> CatalogValidator<'a> {
    pub fn new(catalog: &'a Catalog) -> Self {
        Self { catalog }
    }

    pub fn findings(&self) -> Vec<Finding> {
        let mut findings = Vec::new();

        self.check_names(&mut findings);
        for spec in self.catalog {
            self.check_operation(spec, &mut findings);
        }

        for finding in &findings {
            warn!("[{}] {}", finding.code, finding.message);
        }
        findings
    }

    /// Returns the findings, or an error listing the error-severity ones.
    pub fn validate(&self) -> Result<Vec<Finding>, ConfigError> {
        info!("Validating catalog '{}'", self.catalog.name);
        let findings = self.findings();

        let errors: Vec<String> = findings
            .iter()
            .filter(|f| f.is_error())
            .map(|f| match &f.operation {
                Some(op) => format!("{op}: {}", f.message),
                None => f.message.clone(),
            })
            .collect();
        if !errors.is_empty() {
            return Err(ConfigError::ValidationFailed(errors));
        }

        info!(
            "Catalog validation completed with {} warnings",
            findings.len()
        );
        Ok(findings)
    }

    fn check_names(&self, findings: &mut Vec<Finding>) {
        for name in self.catalog.duplicate_names() {
            let count = self.catalog.names().filter(|n| *n == name).count();
            findings.push(Finding::new_duplicate_name(&name, count));
        }
    }

    fn check_operation(&self, spec: &OperationSpec, findings: &mut Vec<Finding>) {
        match &spec.operation {
            Operation::Aggregate { pipeline } if pipeline.is_empty() => {
                findings.push(Finding::new_empty_pipeline(&spec.name));
            }
            Operation::CreateIndex(request) if request.keys.is_empty() => {
                findings.push(Finding::new_index_without_keys(&spec.name));
            }
            Operation::Find { options, .. } | Operation::Explain { options, .. } => {
                if let Some(limit) = options.limit
                    && limit <= 0
                {
                    findings.push(Finding::new_non_positive_limit(&spec.name, limit));
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{catalog::bookstore::bookstore_catalog, report::finding::Severity};
    use model::{
        bson::doc,
        operation::spec::{FindOptions, IndexRequest},
    };

    #[test]
    fn bookstore_catalog_is_clean() {
        let catalog = bookstore_catalog();
        let findings = CatalogValidator::new(&catalog).validate().unwrap();
        assert!(findings.is_empty());
    }

    #[test]
    fn warnings_do_not_block() {
        let catalog = Catalog::new("warnings")
            .with(OperationSpec::find("same", doc! {}))
            .with(OperationSpec::find("same", doc! { "genre": "Fiction" }))
            .with(OperationSpec::aggregate("everything", vec![]))
            .with(OperationSpec::find_with(
                "zero_limit",
                doc! {},
                FindOptions::default().limit(0),
            ));

        let findings = CatalogValidator::new(&catalog).validate().unwrap();
        let codes: Vec<&str> = findings.iter().map(|f| f.code.as_str()).collect();
        assert_eq!(
            codes,
            vec!["DUPLICATE_NAME", "EMPTY_PIPELINE", "NON_POSITIVE_LIMIT"]
        );
        assert!(findings.iter().all(|f| f.severity == Severity::Warning));
        assert_eq!(findings[0].operation.as_deref(), Some("same"));
    }

    #[test]
    fn index_without_keys_is_an_error() {
        let catalog = Catalog::new("broken").with(OperationSpec::new(
            "no_keys",
            Operation::CreateIndex(IndexRequest::new(vec![])),
        ));

        let validator = CatalogValidator::new(&catalog);
        assert_eq!(validator.findings().len(), 1);
        match validator.validate() {
            Err(ConfigError::ValidationFailed(errors)) => {
                assert_eq!(errors, vec!["no_keys: Index request has no keys".to_string()]);
            }
            other => panic!("expected validation failure, got {other:?}"),
        }
    }
}
