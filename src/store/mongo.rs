use crate::models::Dataset;
use crate::store::traits::DocumentStore;
use crate::store::types::{DocumentUpdate, StoreError, WriteOutcome};
use async_trait::async_trait;
use mongodb::bson::{self, doc, Document};
use mongodb::error::{Error as MongoError, ErrorKind};
use mongodb::options::{ClientOptions, UpdateOptions};
use mongodb::results::UpdateResult;
use mongodb::{Client, Collection, Database};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info};

/// Database name used when none is configured
pub const DEFAULT_DATABASE: &str = "airbnb_listings";

impl From<MongoError> for StoreError {
    fn from(err: MongoError) -> Self {
        match *err.kind {
            ErrorKind::ServerSelection { .. } => StoreError::Unavailable(err.to_string()),
            _ => StoreError::Backend(err.to_string()),
        }
    }
}

impl From<bson::ser::Error> for StoreError {
    fn from(err: bson::ser::Error) -> Self {
        StoreError::Backend(format!("BSON encoding failed: {}", err))
    }
}

/// MongoDB-backed document store
pub struct MongoStore {
    client: Client,
    database: Database,
}

impl MongoStore {
    /// Create a client for `mongodb://<host>` and select `database`.
    ///
    /// No round trip happens here; call [`DocumentStore::ping`] to check reachability.
    pub async fn connect(host: &str, database: &str, timeout: Duration) -> Result<Self, StoreError> {
        let uri = format!("mongodb://{}", host);
        debug!("Parsing connection string {}", uri);

        let mut options = ClientOptions::parse(&uri).await?;
        options.app_name = Some("airbnb-loader".to_string());
        options.connect_timeout = Some(timeout);
        options.server_selection_timeout = Some(timeout);

        let client = Client::with_options(options)?;
        let database = client.database(database);
        info!("Using MongoDB database '{}' at {}", database.name(), host);

        Ok(Self { client, database })
    }

    fn collection(&self, dataset: Dataset) -> Collection<Document> {
        self.database.collection(dataset.collection())
    }
}

/// Translate an update into `$set` / `$addToSet` operators, omitting empty sections
fn update_document(update: &DocumentUpdate) -> Result<Document, StoreError> {
    let mut operators = Document::new();
    if !update.set.is_empty() {
        operators.insert("$set", bson::to_document(&update.set)?);
    }
    if !update.add_to_set.is_empty() {
        operators.insert("$addToSet", bson::to_document(&update.add_to_set)?);
    }
    Ok(operators)
}

fn outcome(result: &UpdateResult) -> WriteOutcome {
    classify(result.matched_count, result.modified_count, result.upserted_id.is_some())
}

fn classify(matched: u64, modified: u64, upserted: bool) -> WriteOutcome {
    if upserted {
        WriteOutcome::Inserted
    } else if matched == 0 {
        WriteOutcome::NotMatched
    } else if modified == 0 {
        WriteOutcome::Unchanged
    } else {
        WriteOutcome::Modified
    }
}

#[async_trait]
impl DocumentStore for MongoStore {
    async fn ping(&self) -> Result<(), StoreError> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 }, None)
            .await
            .map_err(|err| StoreError::Unavailable(err.to_string()))?;
        Ok(())
    }

    async fn insert_one(&self, dataset: Dataset, document: Value) -> Result<WriteOutcome, StoreError> {
        let document = bson::to_document(&document)?;
        self.collection(dataset).insert_one(document, None).await?;
        Ok(WriteOutcome::Inserted)
    }

    async fn set_on_insert(
        &self,
        dataset: Dataset,
        id: &str,
        document: Value,
    ) -> Result<WriteOutcome, StoreError> {
        let document = bson::to_document(&document)?;
        let mut options = UpdateOptions::default();
        options.upsert = Some(true);

        let result = self
            .collection(dataset)
            .update_one(doc! { "_id": id }, doc! { "$setOnInsert": document }, options)
            .await?;
        Ok(outcome(&result))
    }

    async fn update_one(
        &self,
        dataset: Dataset,
        id: &str,
        update: &DocumentUpdate,
    ) -> Result<WriteOutcome, StoreError> {
        if update.is_empty() {
            return Ok(WriteOutcome::Unchanged);
        }

        let result = self
            .collection(dataset)
            .update_one(doc! { "_id": id }, update_document(update)?, None)
            .await?;
        Ok(outcome(&result))
    }

    fn backend_name(&self) -> &'static str {
        "mongodb"
    }
}
