use crate::document::{
    base::{
        error::{ConnectorError, StoreError},
        store::{DeleteOutcome, StoreHandle, StoreKind, UpdateOutcome},
    },
    mongo::{errors::classify, settings::MongoSettings},
};
use async_trait::async_trait;
use bson::{Document, doc};
use futures_util::TryStreamExt;
use model::operation::spec::{ExplainVerbosity, FindOptions, IndexRequest, OperationKind};
use mongodb::{
    Client, Collection, IndexModel,
    options::{self, ClientOptions, IndexOptions},
};
use tracing::{debug, info};

/// MongoDB-backed store handle for a single collection.
pub struct MongoAdapter {
    settings: MongoSettings,
    client: Option<Client>,
}

impl MongoAdapter {
    pub fn new(settings: MongoSettings) -> Self {
        Self {
            settings,
            client: None,
        }
    }

    fn client(&self) -> Result<&Client, StoreError> {
        self.client.as_ref().ok_or(StoreError::NotConnected)
    }

    fn collection(&self) -> Result<Collection<Document>, StoreError> {
        Ok(self
            .client()?
            .database(&self.settings.database)
            .collection::<Document>(&self.settings.collection))
    }

    fn find_options(options: &FindOptions) -> options::FindOptions {
        options::FindOptions::builder()
            .projection(options.projection.clone())
            .sort(options.sort_document())
            .limit(options.limit)
            .skip(options.skip)
            .build()
    }

    /// The `find` command document wrapped by `explain`.
    fn find_command(&self, filter: &Document, options: &FindOptions) -> Document {
        let mut command = doc! {
            "find": self.settings.collection.clone(),
            "filter": filter.clone(),
        };
        if let Some(projection) = &options.projection {
            command.insert("projection", projection.clone());
        }
        if let Some(sort) = options.sort_document() {
            command.insert("sort", sort);
        }
        if let Some(limit) = options.limit {
            command.insert("limit", limit);
        }
        if let Some(skip) = options.skip {
            command.insert("skip", skip as i64);
        }
        command
    }
}

#[async_trait]
impl StoreHandle for MongoAdapter {
    async fn connect(&mut self) -> Result<(), ConnectorError> {
        if self.client.is_some() {
            return Err(ConnectorError::AlreadyConnected);
        }

        let uri = &self.settings.uri;
        if !uri.starts_with("mongodb://") && !uri.starts_with("mongodb+srv://") {
            return Err(ConnectorError::InvalidUri(uri.clone()));
        }

        let mut client_options = ClientOptions::parse(uri).await?;
        if let Some(timeout) = self.settings.connect_timeout {
            client_options.server_selection_timeout = Some(timeout);
        }
        let client = Client::with_options(client_options)?;

        // The driver connects lazily; ping so that an unreachable server fails here.
        client
            .database("admin")
            .run_command(doc! { "ping": 1 }, None)
            .await?;

        info!("Connected to MongoDB at {}", self.settings.uri);
        self.client = Some(client);
        Ok(())
    }

    async fn find(
        &self,
        filter: &Document,
        options: &FindOptions,
    ) -> Result<Vec<Document>, StoreError> {
        let to_store_error = |e| classify(e, OperationKind::Find);
        let cursor = self
            .collection()?
            .find(filter.clone(), Self::find_options(options))
            .await
            .map_err(to_store_error)?;
        let records: Vec<Document> = cursor.try_collect().await.map_err(to_store_error)?;
        debug!("find {:?} returned {} records", filter, records.len());
        Ok(records)
    }

    async fn update_one(
        &self,
        filter: &Document,
        update: &Document,
    ) -> Result<UpdateOutcome, StoreError> {
        let result = self
            .collection()?
            .update_one(filter.clone(), update.clone(), None)
            .await
            .map_err(|e| classify(e, OperationKind::UpdateOne))?;
        Ok(UpdateOutcome {
            matched: result.matched_count,
            modified: result.modified_count,
        })
    }

    async fn delete_one(&self, filter: &Document) -> Result<DeleteOutcome, StoreError> {
        let result = self
            .collection()?
            .delete_one(filter.clone(), None)
            .await
            .map_err(|e| classify(e, OperationKind::DeleteOne))?;
        Ok(DeleteOutcome {
            deleted: result.deleted_count,
        })
    }

    async fn aggregate(&self, pipeline: &[Document]) -> Result<Vec<Document>, StoreError> {
        let to_store_error = |e| classify(e, OperationKind::Aggregate);
        let cursor = self
            .collection()?
            .aggregate(pipeline.to_vec(), None)
            .await
            .map_err(to_store_error)?;
        let records: Vec<Document> = cursor.try_collect().await.map_err(to_store_error)?;
        debug!(
            "aggregate with {} stages returned {} records",
            pipeline.len(),
            records.len()
        );
        Ok(records)
    }

    async fn create_index(&self, request: &IndexRequest) -> Result<String, StoreError> {
        let index_options = IndexOptions::builder()
            .name(request.name.clone())
            .unique(request.unique.then_some(true))
            .build();
        let model = IndexModel::builder()
            .keys(request.keys_document())
            .options(index_options)
            .build();

        let result = self
            .collection()?
            .create_index(model, None)
            .await
            .map_err(|e| classify(e, OperationKind::CreateIndex))?;
        Ok(result.index_name)
    }

    async fn explain(
        &self,
        filter: &Document,
        options: &FindOptions,
        verbosity: ExplainVerbosity,
    ) -> Result<Document, StoreError> {
        let command = doc! {
            "explain": self.find_command(filter, options),
            "verbosity": verbosity.as_str(),
        };
        self.client()?
            .database(&self.settings.database)
            .run_command(command, None)
            .await
            .map_err(|e| classify(e, OperationKind::Explain))
    }

    async fn close(&mut self) -> Result<(), StoreError> {
        match self.client.take() {
            Some(client) => {
                client.shutdown().await;
                info!("Closed MongoDB connection to {}", self.settings.uri);
                Ok(())
            }
            None => Err(StoreError::NotConnected),
        }
    }

    fn kind(&self) -> StoreKind {
        StoreKind::Mongo
    }

    fn namespace(&self) -> String {
        self.settings.namespace()
    }
}
