use serde::Serialize;

#[derive(Serialize, Debug, Clone, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum FindingKind {
    Naming,   // duplicate or empty operation names
    Pipeline, // aggregation stages
    Index,
    Options, // find modifiers
    Other,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct Finding {
    pub code: String,    // stable programmatic id
    pub message: String, // human-readable
    pub severity: Severity,
    pub kind: FindingKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>, // how to fix
}

const CODE_DUPLICATE_NAME: &str = "DUPLICATE_NAME";
const CODE_EMPTY_PIPELINE: &str = "EMPTY_PIPELINE";
const CODE_INDEX_WITHOUT_KEYS: &str = "INDEX_WITHOUT_KEYS";
const CODE_NON_POSITIVE_LIMIT: &str = "NON_POSITIVE_LIMIT";

impl Finding {
    pub fn new(
        code: &str,
        message: String,
        severity: Severity,
        kind: FindingKind,
        suggestion: Option<String>,
    ) -> Self {
        Finding {
            code: code.to_string(),
            message,
            severity,
            kind,
            operation: None,
            suggestion,
        }
    }

    pub fn for_operation(mut self, name: &str) -> Self {
        self.operation = Some(name.to_string());
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    pub fn new_duplicate_name(name: &str, count: usize) -> Self {
        Self::new(
            CODE_DUPLICATE_NAME,
            format!("Operation name `{name}` is used {count} times"),
            Severity::Warning,
            FindingKind::Naming,
            Some("Give each operation a distinct name so report entries can be told apart.".into()),
        )
        .for_operation(name)
    }

    pub fn new_empty_pipeline(name: &str) -> Self {
        Self::new(
            CODE_EMPTY_PIPELINE,
            "Aggregation has no stages and returns the whole collection".to_string(),
            Severity::Warning,
            FindingKind::Pipeline,
            None,
        )
        .for_operation(name)
    }

    pub fn new_index_without_keys(name: &str) -> Self {
        Self::new(
            CODE_INDEX_WITHOUT_KEYS,
            "Index request has no keys".to_string(),
            Severity::Error,
            FindingKind::Index,
            Some("List at least one field with a direction.".into()),
        )
        .for_operation(name)
    }

    pub fn new_non_positive_limit(name: &str, limit: i64) -> Self {
        Self::new(
            CODE_NON_POSITIVE_LIMIT,
            format!("Limit {limit} is not positive; stores treat 0 as no limit and negatives as their absolute value"),
            Severity::Warning,
            FindingKind::Options,
            None,
        )
        .for_operation(name)
    }
}
