use async_trait::async_trait;
use connectors::{
    ConnectorError, DeleteOutcome, StoreError, StoreHandle, StoreKind, UpdateOutcome,
};
use model::{
    bson::{Document, doc},
    operation::spec::{ExplainVerbosity, FindOptions, IndexRequest, OperationKind},
};
use std::{
    collections::HashMap,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

#[derive(Debug, Default)]
pub struct Calls {
    pub connect: AtomicUsize,
    pub close: AtomicUsize,
    pub operations: AtomicUsize,
}

impl Calls {
    pub fn connects(&self) -> usize {
        self.connect.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.close.load(Ordering::SeqCst)
    }

    pub fn operations(&self) -> usize {
        self.operations.load(Ordering::SeqCst)
    }
}

/// Scripted store: every call succeeds unless told otherwise.
pub struct MockStore {
    pub calls: Arc<Calls>,
    failures: HashMap<OperationKind, fn() -> StoreError>,
    delays: HashMap<OperationKind, Duration>,
    panics: Option<OperationKind>,
    unreachable: bool,
    failing_close: bool,
    matched: u64,
    records: Vec<Document>,
}

impl MockStore {
    pub fn new() -> Self {
        Self {
            calls: Arc::new(Calls::default()),
            failures: HashMap::new(),
            delays: HashMap::new(),
            panics: None,
            unreachable: false,
            failing_close: false,
            matched: 1,
            records: vec![doc! { "title": "1984" }, doc! { "title": "Animal Farm" }],
        }
    }

    pub fn failing(mut self, kind: OperationKind, error: fn() -> StoreError) -> Self {
        self.failures.insert(kind, error);
        self
    }

    pub fn slow(mut self, kind: OperationKind, delay: Duration) -> Self {
        self.delays.insert(kind, delay);
        self
    }

    pub fn panicking(mut self, kind: OperationKind) -> Self {
        self.panics = Some(kind);
        self
    }

    pub fn unreachable(mut self) -> Self {
        self.unreachable = true;
        self
    }

    pub fn failing_close(mut self) -> Self {
        self.failing_close = true;
        self
    }

    pub fn matching_nothing(mut self) -> Self {
        self.matched = 0;
        self
    }

    async fn call(&self, kind: OperationKind) -> Result<(), StoreError> {
        self.calls.operations.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delays.get(&kind) {
            tokio::time::sleep(*delay).await;
        }
        if self.panics == Some(kind) {
            panic!("mock store blew up during {kind}");
        }
        match self.failures.get(&kind) {
            Some(error) => Err(error()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl StoreHandle for MockStore {
    async fn connect(&mut self) -> Result<(), ConnectorError> {
        self.calls.connect.fetch_add(1, Ordering::SeqCst);
        if self.unreachable {
            return Err(ConnectorError::Unreachable("mock://nowhere".to_string()));
        }
        Ok(())
    }

    async fn find(
        &self,
        _filter: &Document,
        _options: &FindOptions,
    ) -> Result<Vec<Document>, StoreError> {
        self.call(OperationKind::Find).await?;
        Ok(self.records.clone())
    }

    async fn update_one(
        &self,
        _filter: &Document,
        _update: &Document,
    ) -> Result<UpdateOutcome, StoreError> {
        self.call(OperationKind::UpdateOne).await?;
        Ok(UpdateOutcome {
            matched: self.matched,
            modified: self.matched,
        })
    }

    async fn delete_one(&self, _filter: &Document) -> Result<DeleteOutcome, StoreError> {
        self.call(OperationKind::DeleteOne).await?;
        Ok(DeleteOutcome { deleted: 1 })
    }

    async fn aggregate(&self, _pipeline: &[Document]) -> Result<Vec<Document>, StoreError> {
        self.call(OperationKind::Aggregate).await?;
        Ok(vec![doc! { "_id": "Fiction", "count": 2 }])
    }

    async fn create_index(&self, request: &IndexRequest) -> Result<String, StoreError> {
        self.call(OperationKind::CreateIndex).await?;
        Ok(request.resolved_name())
    }

    async fn explain(
        &self,
        _filter: &Document,
        _options: &FindOptions,
        verbosity: ExplainVerbosity,
    ) -> Result<Document, StoreError> {
        self.call(OperationKind::Explain).await?;
        Ok(doc! {
            "queryPlanner": { "winningPlan": { "stage": "COLLSCAN" } },
            "verbosity": verbosity.as_str(),
        })
    }

    async fn close(&mut self) -> Result<(), StoreError> {
        self.calls.close.fetch_add(1, Ordering::SeqCst);
        if self.failing_close {
            return Err(StoreError::Driver("socket already closed".to_string()));
        }
        Ok(())
    }

    fn kind(&self) -> StoreKind {
        StoreKind::Other("mock".to_string())
    }

    fn namespace(&self) -> String {
        "mock.books".to_string()
    }
}
