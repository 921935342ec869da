//! Synchronous facade
//!
//! `blocking::Mongobject` owns a tokio runtime and blocks the calling thread
//! on every operation of the async [`crate::Mongobject`]. Dropping it shuts
//! the driver client down.
//!
//! It must not be created or dropped from inside an async runtime.

use bson::{Bson, Document as BsonDocument};
use mongodb::Client;
use serde::Serialize;
use tokio::runtime::Runtime;
use tracing::debug;

use crate::config::{ConnectionConfig, Info};
use crate::document::{Found, Payload};
use crate::query::FindQuery;
use crate::{MongobjectError, Result};

/// Blocking counterpart of [`crate::Mongobject`]
pub struct Mongobject {
    inner: crate::Mongobject,
    runtime: Runtime,
}

impl Mongobject {
    /// Validate `config` without connecting
    pub fn new(config: ConnectionConfig) -> Result<Self> {
        let inner = crate::Mongobject::new(config)?;
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("mongobject")
            .enable_all()
            .build()
            .map_err(|e| MongobjectError::Connection(format!("Failed to create tokio runtime: {}", e)))?;

        Ok(Self { inner, runtime })
    }

    /// Validate `config` and open a client
    pub fn connect(config: ConnectionConfig) -> Result<Self> {
        let mut mongobject = Self::new(config)?;
        mongobject.open()?;
        Ok(mongobject)
    }

    /// The async facade this one drives
    pub fn inner(&self) -> &crate::Mongobject {
        &self.inner
    }

    pub fn open(&mut self) -> Result<()> {
        self.runtime.block_on(self.inner.open())
    }

    pub fn close(&mut self) {
        self.runtime.block_on(self.inner.close())
    }

    pub fn is_connected(&self) -> bool {
        self.inner.is_connected()
    }

    pub fn config(&self) -> &ConnectionConfig {
        self.inner.config()
    }

    pub fn get_info(&self) -> Info {
        self.inner.get_info()
    }

    pub fn server_info(&self) -> Result<BsonDocument> {
        self.runtime.block_on(self.inner.server_info())
    }

    pub fn ping(&self) -> Result<bool> {
        self.runtime.block_on(self.inner.ping())
    }

    pub fn set_instance(
        &mut self,
        uri: Option<&str>,
        host: Option<&str>,
        port: Option<u16>,
    ) -> Result<()> {
        self.runtime.block_on(self.inner.set_instance(uri, host, port))
    }

    pub fn get_instance(&self) -> Option<&Client> {
        self.inner.get_instance()
    }

    pub fn set_database(&mut self, database: Option<&str>) -> Result<()> {
        self.inner.set_database(database)
    }

    pub fn get_database(&self) -> Option<&str> {
        self.inner.get_database()
    }

    pub fn set_collection(&mut self, collection: Option<&str>) -> Result<()> {
        self.inner.set_collection(collection)
    }

    pub fn get_collection(&self) -> Option<&str> {
        self.inner.get_collection()
    }

    pub fn get_available_databases(&self, filter: Option<BsonDocument>) -> Result<Vec<String>> {
        self.runtime.block_on(self.inner.get_available_databases(filter))
    }

    pub fn get_available_collections(&self, filter: Option<BsonDocument>) -> Result<Vec<String>> {
        self.runtime.block_on(self.inner.get_available_collections(filter))
    }

    pub fn create_database(&mut self, name: &str) -> Result<bool> {
        self.runtime.block_on(self.inner.create_database(name))
    }

    pub fn drop_database(&mut self) -> Result<bool> {
        self.runtime.block_on(self.inner.drop_database())
    }

    pub fn create_collection(&mut self, name: &str) -> Result<()> {
        self.runtime.block_on(self.inner.create_collection(name))
    }

    pub fn drop_collection(&mut self) -> Result<bool> {
        self.runtime.block_on(self.inner.drop_collection())
    }

    pub fn insert(&self, payload: impl Into<Payload>) -> Result<bool> {
        self.runtime.block_on(self.inner.insert(payload))
    }

    pub fn insert_one(&self, doc: BsonDocument) -> Result<Bson> {
        self.runtime.block_on(self.inner.insert_one(doc))
    }

    pub fn insert_serialized<T: Serialize>(&self, value: &T) -> Result<Bson> {
        self.runtime.block_on(self.inner.insert_serialized(value))
    }

    pub fn replace(
        &self,
        filter: BsonDocument,
        replacement: BsonDocument,
        upsert: bool,
        only_one: bool,
    ) -> Result<bool> {
        self.runtime
            .block_on(self.inner.replace(filter, replacement, upsert, only_one))
    }

    pub fn update(
        &self,
        filter: BsonDocument,
        update: BsonDocument,
        upsert: bool,
        only_one: bool,
    ) -> Result<bool> {
        self.runtime
            .block_on(self.inner.update(filter, update, upsert, only_one))
    }

    pub fn delete(&self, filter: BsonDocument, only_one: bool) -> Result<bool> {
        self.runtime.block_on(self.inner.delete(filter, only_one))
    }

    pub fn find(&self, query: FindQuery) -> Result<Vec<Found>> {
        self.runtime.block_on(self.inner.find(query))
    }

    pub fn count(&self, filter: BsonDocument, skip: u64, limit: u64) -> Result<u64> {
        self.runtime.block_on(self.inner.count(filter, skip, limit))
    }

    pub fn distinct(&self, key: &str, filter: Option<BsonDocument>) -> Result<Vec<Bson>> {
        self.runtime.block_on(self.inner.distinct(key, filter))
    }
}

impl Drop for Mongobject {
    fn drop(&mut self) {
        if self.inner.is_connected() {
            debug!("closing MongoDB client on drop");
            self.runtime.block_on(self.inner.close());
        }
    }
}
