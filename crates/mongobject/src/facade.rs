//! The `Mongobject` facade
//!
//! Holds a `ConnectionConfig`, an optional open `Connection`, and forwards
//! CRUD calls to the selected database and collection. Every operation that
//! touches the server fails with `NotConnected` until `open` (or `connect`)
//! has run, and with `Configuration` while no database/collection is
//! selected.

use bson::{doc, Bson, Document as BsonDocument};
use futures::TryStreamExt;
use mongodb::{
    options::{
        CountOptions, FindOneAndDeleteOptions, FindOneAndReplaceOptions, FindOneAndUpdateOptions,
        FindOneOptions, FindOptions,
    },
    Client, Collection,
};
use serde::Serialize;
use tracing::{debug, info};

use crate::config::{Address, ConnectionConfig, Info};
use crate::connection::Connection;
use crate::document::{Found, Payload};
use crate::query::{FindOption, FindQuery};
use crate::validation::{ValidatedCollectionName, ValidatedDatabaseName};
use crate::{MongobjectError, Result};

/// Configuration plus an optional driver client
pub struct Mongobject {
    config: ConnectionConfig,
    address: Address,
    connection: Option<Connection>,
    /// Database from the URI path of the open client
    uri_database: Option<String>,
}

impl Mongobject {
    /// Validate `config` without connecting
    pub fn new(mut config: ConnectionConfig) -> Result<Self> {
        let address = config.address()?;
        config.set_address(&address);

        config.database = normalize(config.database.take())
            .map(|name| ValidatedDatabaseName::new(&name).map(ValidatedDatabaseName::into_string))
            .transpose()?;
        config.collection = normalize(config.collection.take())
            .map(|name| ValidatedCollectionName::new(&name).map(ValidatedCollectionName::into_string))
            .transpose()?;

        Ok(Self {
            config,
            address,
            connection: None,
            uri_database: None,
        })
    }

    /// Validate `config` and open a client
    pub async fn connect(config: ConnectionConfig) -> Result<Self> {
        let mut mongobject = Self::new(config)?;
        mongobject.open().await?;
        Ok(mongobject)
    }

    /// Open a client for the configured address; a no-op when already open
    pub async fn open(&mut self) -> Result<()> {
        if self.connection.is_some() {
            return Ok(());
        }

        let connection = Connection::open(&self.address, &self.config).await?;
        self.uri_database = connection.default_database().map(str::to_string);
        self.connection = Some(connection);
        Ok(())
    }

    /// Shut the client down; the configuration is kept
    pub async fn close(&mut self) {
        self.uri_database = None;
        if let Some(connection) = self.connection.take() {
            connection.close().await;
            info!(address = %self.address, "closed MongoDB client");
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    /// Current address, database and collection. No I/O.
    pub fn get_info(&self) -> Info {
        Info {
            address: self.address.clone(),
            database: self.get_database().map(str::to_string),
            collection: self.config.collection.clone(),
        }
    }

    /// The server's `buildInfo` document
    pub async fn server_info(&self) -> Result<BsonDocument> {
        self.connection()?.server_info().await
    }

    pub async fn ping(&self) -> Result<bool> {
        self.connection()?.ping().await
    }

    /// Replace the connection parameters.
    ///
    /// On error nothing changes. When a client is open, a client for the new
    /// address is opened first and the old one is shut down only after that
    /// succeeds.
    pub async fn set_instance(
        &mut self,
        uri: Option<&str>,
        host: Option<&str>,
        port: Option<u16>,
    ) -> Result<()> {
        let address = Address::resolve(uri, host, port)?;
        let replacement = if self.is_connected() {
            Some(Connection::open(&address, &self.config).await?)
        } else {
            None
        };

        info!(from = %self.address, to = %address, "switching MongoDB instance");
        self.config.set_address(&address);
        self.address = address;
        self.uri_database = replacement
            .as_ref()
            .and_then(Connection::default_database)
            .map(str::to_string);

        if let Some(previous) = std::mem::replace(&mut self.connection, replacement) {
            previous.close().await;
        }
        Ok(())
    }

    /// The driver client, when open
    pub fn get_instance(&self) -> Option<&Client> {
        self.connection.as_ref().map(Connection::client)
    }

    /// Select a database; `None` or an empty name keeps the current one
    pub fn set_database(&mut self, database: Option<&str>) -> Result<()> {
        if let Some(name) = normalize(database.map(str::to_string)) {
            self.config.database = Some(ValidatedDatabaseName::new(&name)?.into_string());
        }
        Ok(())
    }

    /// The selected database, else the one named in the open client's URI
    pub fn get_database(&self) -> Option<&str> {
        self.config
            .database
            .as_deref()
            .or(self.uri_database.as_deref())
    }

    /// Select a collection; `None` or an empty name keeps the current one
    pub fn set_collection(&mut self, collection: Option<&str>) -> Result<()> {
        if let Some(name) = normalize(collection.map(str::to_string)) {
            self.config.collection = Some(ValidatedCollectionName::new(&name)?.into_string());
        }
        Ok(())
    }

    pub fn get_collection(&self) -> Option<&str> {
        self.config.collection.as_deref()
    }

    pub async fn get_available_databases(&self, filter: Option<BsonDocument>) -> Result<Vec<String>> {
        self.connection()?.list_database_names(filter).await
    }

    /// Collection names of the selected database, in server order
    pub async fn get_available_collections(
        &self,
        filter: Option<BsonDocument>,
    ) -> Result<Vec<String>> {
        let connection = self.connection()?;
        let database = self.database_name()?;
        debug!(database, "listing collections");
        connection.list_collection_names(database, filter).await
    }

    /// Select a database that does not exist yet; the server creates it on
    /// the first write. Returns false when it already exists.
    pub async fn create_database(&mut self, name: &str) -> Result<bool> {
        let name = ValidatedDatabaseName::new(name)?;
        if self.database_exists(name.as_str()).await? {
            return Ok(false);
        }
        self.config.database = Some(name.into_string());
        Ok(true)
    }

    /// Drop the selected database and clear the database and collection selection
    pub async fn drop_database(&mut self) -> Result<bool> {
        let database = self.database_name()?.to_string();
        if !self.database_exists(&database).await? {
            return Ok(false);
        }

        self.connection()?.database(&database).drop().await?;
        info!(database = %database, "dropped database");

        self.config.database = None;
        self.uri_database = None;
        self.config.collection = None;
        Ok(true)
    }

    /// Create a collection in the selected database and select it
    pub async fn create_collection(&mut self, name: &str) -> Result<()> {
        let name = ValidatedCollectionName::new(name)?;
        let connection = self.connection()?;
        let database = self.database_name()?;

        connection
            .database(database)
            .create_collection(name.as_str())
            .await?;
        info!(database, collection = %name, "created collection");

        self.config.collection = Some(name.into_string());
        Ok(())
    }

    /// Drop the selected collection and clear the collection selection
    pub async fn drop_collection(&mut self) -> Result<bool> {
        let collection = self.collection_handle()?;
        if !self.collection_exists().await? {
            return Ok(false);
        }

        collection.drop().await?;
        info!(
            database = ?self.get_database(),
            collection = ?self.config.collection,
            "dropped collection"
        );

        self.config.collection = None;
        Ok(true)
    }

    /// Insert one document or a batch.
    ///
    /// Returns true when every document was assigned an `_id`. An empty batch
    /// inserts nothing and returns false.
    pub async fn insert(&self, payload: impl Into<Payload>) -> Result<bool> {
        let collection = self.collection_handle()?;
        let payload = payload.into();
        if payload.is_empty() {
            return Ok(false);
        }

        debug!(collection = collection.name(), count = payload.len(), "insert");
        match payload {
            Payload::One(doc) => {
                let result = collection.insert_one(doc).await?;
                Ok(result.inserted_id != Bson::Null)
            }
            Payload::Many(mut docs) if docs.len() == 1 => {
                let result = collection.insert_one(docs.remove(0)).await?;
                Ok(result.inserted_id != Bson::Null)
            }
            Payload::Many(docs) => {
                let expected = docs.len();
                let result = collection.insert_many(docs).await?;
                Ok(result.inserted_ids.len() == expected)
            }
        }
    }

    /// Insert one document and return its `_id`
    pub async fn insert_one(&self, doc: BsonDocument) -> Result<Bson> {
        let collection = self.collection_handle()?;
        debug!(collection = collection.name(), "insert_one");
        let result = collection.insert_one(doc).await?;
        Ok(result.inserted_id)
    }

    /// Serialize `value` to BSON and insert it
    pub async fn insert_serialized<T: Serialize>(&self, value: &T) -> Result<Bson> {
        let doc = bson::to_document(value)?;
        self.insert_one(doc).await
    }

    /// Replace matching documents.
    ///
    /// With `only_one`, the first match is replaced and the call succeeds when
    /// it was modified or upserted. Otherwise every match is replaced by `_id`
    /// and the call succeeds when all of them were modified.
    pub async fn replace(
        &self,
        filter: BsonDocument,
        replacement: BsonDocument,
        upsert: bool,
        only_one: bool,
    ) -> Result<bool> {
        let collection = self.collection_handle()?;
        debug!(collection = collection.name(), upsert, only_one, "replace");

        if only_one {
            let result = collection
                .replace_one(filter, replacement)
                .upsert(upsert)
                .await?;
            return Ok(result.modified_count == 1 || result.upserted_id.is_some());
        }

        let matches: Vec<BsonDocument> = collection
            .find(filter.clone())
            .projection(doc! { "_id": 1 })
            .await?
            .try_collect()
            .await?;
        let ids: Vec<Bson> = matches
            .into_iter()
            .filter_map(|mut doc| doc.remove("_id"))
            .collect();

        if ids.is_empty() {
            if !upsert {
                return Ok(true);
            }
            let result = collection
                .replace_one(filter, replacement)
                .upsert(true)
                .await?;
            return Ok(result.upserted_id.is_some());
        }

        let mut modified = 0;
        for id in &ids {
            let result = collection
                .replace_one(doc! { "_id": id.clone() }, replacement.clone())
                .await?;
            modified += result.modified_count;
        }
        Ok(modified == ids.len() as u64)
    }

    /// Apply an update document to the first match (`only_one`) or to every match
    pub async fn update(
        &self,
        filter: BsonDocument,
        update: BsonDocument,
        upsert: bool,
        only_one: bool,
    ) -> Result<bool> {
        let collection = self.collection_handle()?;
        debug!(collection = collection.name(), upsert, only_one, "update");

        if only_one {
            let result = collection.update_one(filter, update).upsert(upsert).await?;
            Ok(result.modified_count == 1 || result.upserted_id.is_some())
        } else {
            let result = collection.update_many(filter, update).upsert(upsert).await?;
            Ok(result.modified_count == result.matched_count || result.upserted_id.is_some())
        }
    }

    /// Delete the first match (`only_one`) or every match; true when anything was deleted
    pub async fn delete(&self, filter: BsonDocument, only_one: bool) -> Result<bool> {
        let collection = self.collection_handle()?;
        debug!(collection = collection.name(), only_one, "delete");

        let result = if only_one {
            collection.delete_one(filter).await?
        } else {
            collection.delete_many(filter).await?
        };
        Ok(result.deleted_count > 0)
    }

    /// Run the query's find variant and split `_id` from each result
    pub async fn find(&self, query: FindQuery) -> Result<Vec<Found>> {
        let collection = self.collection_handle()?;
        let filter = query.get_filter().clone();
        debug!(collection = collection.name(), option = ?query.get_option(), "find");

        let docs: Vec<BsonDocument> = match query.get_option() {
            FindOption::Find => {
                let mut options = FindOptions::default();
                options.projection = query.get_projection().cloned();
                options.sort = query.get_sort().cloned();
                options.skip = query.get_skip();
                options.limit = query.get_limit();

                collection
                    .find(filter)
                    .with_options(options)
                    .await?
                    .try_collect()
                    .await?
            }
            FindOption::FindOne => {
                let mut options = FindOneOptions::default();
                options.projection = query.get_projection().cloned();
                options.sort = query.get_sort().cloned();
                options.skip = query.get_skip();

                collection
                    .find_one(filter)
                    .with_options(options)
                    .await?
                    .into_iter()
                    .collect()
            }
            FindOption::FindOneAndDelete => {
                let mut options = FindOneAndDeleteOptions::default();
                options.projection = query.get_projection().cloned();
                options.sort = query.get_sort().cloned();

                collection
                    .find_one_and_delete(filter)
                    .with_options(options)
                    .await?
                    .into_iter()
                    .collect()
            }
            FindOption::FindOneAndReplace => {
                let replacement = modification_document(&query)?;
                let mut options = FindOneAndReplaceOptions::default();
                options.projection = query.get_projection().cloned();
                options.sort = query.get_sort().cloned();
                options.upsert = Some(query.get_upsert());
                options.return_document = Some(query.return_document());

                collection
                    .find_one_and_replace(filter, replacement)
                    .with_options(options)
                    .await?
                    .into_iter()
                    .collect()
            }
            FindOption::FindOneAndUpdate => {
                let update = modification_document(&query)?;
                let mut options = FindOneAndUpdateOptions::default();
                options.projection = query.get_projection().cloned();
                options.sort = query.get_sort().cloned();
                options.upsert = Some(query.get_upsert());
                options.return_document = Some(query.return_document());

                collection
                    .find_one_and_update(filter, update)
                    .with_options(options)
                    .await?
                    .into_iter()
                    .collect()
            }
        };

        Ok(docs.into_iter().map(Found::from).collect())
    }

    /// Count matching documents; `limit` 0 means no limit
    pub async fn count(&self, filter: BsonDocument, skip: u64, limit: u64) -> Result<u64> {
        let collection = self.collection_handle()?;
        debug!(collection = collection.name(), skip, limit, "count");

        let mut options = CountOptions::default();
        options.skip = (skip > 0).then_some(skip);
        options.limit = (limit > 0).then_some(limit);

        Ok(collection.count_documents(filter).with_options(options).await?)
    }

    /// Distinct values of `key` among matching documents
    pub async fn distinct(&self, key: &str, filter: Option<BsonDocument>) -> Result<Vec<Bson>> {
        let collection = self.collection_handle()?;
        debug!(collection = collection.name(), key, "distinct");

        Ok(collection.distinct(key, filter.unwrap_or_default()).await?)
    }

    fn connection(&self) -> Result<&Connection> {
        self.connection.as_ref().ok_or(MongobjectError::NotConnected)
    }

    fn database_name(&self) -> Result<&str> {
        self.get_database()
            .ok_or_else(|| MongobjectError::Configuration("No database selected".to_string()))
    }

    fn collection_handle(&self) -> Result<Collection<BsonDocument>> {
        let connection = self.connection()?;
        let database = self.database_name()?;
        let collection = self
            .config
            .collection
            .as_deref()
            .ok_or_else(|| MongobjectError::Configuration("No collection selected".to_string()))?;
        Ok(connection.collection(database, collection))
    }

    async fn database_exists(&self, name: &str) -> Result<bool> {
        let names = self
            .connection()?
            .list_database_names(Some(doc! { "name": name }))
            .await?;
        Ok(!names.is_empty())
    }

    async fn collection_exists(&self) -> Result<bool> {
        let database = self.database_name()?;
        let Some(collection) = self.config.collection.as_deref() else {
            return Ok(false);
        };
        let names = self
            .connection()?
            .list_collection_names(database, Some(doc! { "name": collection }))
            .await?;
        Ok(!names.is_empty())
    }
}

fn normalize(name: Option<String>) -> Option<String> {
    name.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

fn modification_document(query: &FindQuery) -> Result<BsonDocument> {
    query.get_document().cloned().ok_or_else(|| {
        MongobjectError::Validation(format!(
            "{:?} needs a replacement or update document",
            query.get_option()
        ))
    })
}
