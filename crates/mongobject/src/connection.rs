//! Driver client lifecycle: option building, health checks and shutdown

use bson::{doc, Document as BsonDocument};
use mongodb::{
    options::{ClientOptions, ServerAddress, ServerApi, ServerApiVersion, Tls, TlsOptions},
    Client, Collection, Database,
};
use tracing::{debug, info};

use crate::config::{Address, ConnectionConfig};
use crate::Result;

/// Translate a resolved address and config into driver options
pub async fn client_options(address: &Address, config: &ConnectionConfig) -> Result<ClientOptions> {
    let mut client_options = match address {
        Address::Uri { uri } => ClientOptions::parse(uri.as_str()).await?,
        Address::Host { host, port } => {
            let server = match port {
                Some(port) => ServerAddress::Tcp {
                    host: host.clone(),
                    port: Some(*port),
                },
                None => ServerAddress::parse(host)?,
            };
            ClientOptions::builder().hosts(vec![server]).build()
        }
        Address::Default => ClientOptions::builder().build(),
    };

    let pool = &config.pool;
    if let Some(min) = pool.min_pool_size {
        client_options.min_pool_size = Some(min);
    }
    if let Some(max) = pool.max_pool_size {
        client_options.max_pool_size = Some(max);
    }
    if let Some(idle) = pool.max_idle_time() {
        client_options.max_idle_time = Some(idle);
    }
    if let Some(connect) = pool.connect_timeout() {
        client_options.connect_timeout = Some(connect);
    }
    if let Some(server_sel) = pool.server_selection_timeout() {
        client_options.server_selection_timeout = Some(server_sel);
    }
    if let Some(app) = &pool.app_name {
        client_options.app_name = Some(app.clone());
    }

    match config.tls {
        Some(true) => client_options.tls = Some(Tls::Enabled(TlsOptions::default())),
        Some(false) => client_options.tls = Some(Tls::Disabled),
        None => {}
    }

    if config.stable_api {
        let server_api = ServerApi::builder().version(ServerApiVersion::V1).build();
        client_options.server_api = Some(server_api);
    }

    Ok(client_options)
}

/// An open driver client plus the address it was opened with
pub struct Connection {
    client: Client,
    address: Address,
    default_database: Option<String>,
}

impl Connection {
    /// Open a client for `address`. The driver connects lazily, so this only
    /// fails on malformed options or SRV lookup errors.
    pub async fn open(address: &Address, config: &ConnectionConfig) -> Result<Self> {
        let options = client_options(address, config).await?;
        let client = Client::with_options(options)?;
        let default_database = client.default_database().map(|db| db.name().to_string());
        info!(address = %address, "opened MongoDB client");

        Ok(Self {
            client,
            address: address.clone(),
            default_database,
        })
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    /// Database named in the URI path, if any
    pub fn default_database(&self) -> Option<&str> {
        self.default_database.as_deref()
    }

    pub fn database(&self, name: &str) -> Database {
        self.client.database(name)
    }

    /// Get a collection by name (untyped BsonDocument collection)
    pub fn collection(&self, database: &str, name: &str) -> Collection<BsonDocument> {
        self.client.database(database).collection(name)
    }

    /// Check if the server is reachable
    pub async fn ping(&self) -> Result<bool> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 })
            .await?;
        Ok(true)
    }

    /// The server's `buildInfo` document
    pub async fn server_info(&self) -> Result<BsonDocument> {
        let result = self
            .client
            .database("admin")
            .run_command(doc! { "buildInfo": 1 })
            .await?;
        Ok(result)
    }

    /// List database names on the server, optionally filtered
    pub async fn list_database_names(&self, filter: Option<BsonDocument>) -> Result<Vec<String>> {
        let mut action = self.client.list_database_names();
        if let Some(filter) = filter {
            action = action.filter(filter);
        }
        Ok(action.await?)
    }

    /// List collection names of `database`, optionally filtered
    pub async fn list_collection_names(
        &self,
        database: &str,
        filter: Option<BsonDocument>,
    ) -> Result<Vec<String>> {
        let db = self.client.database(database);
        let mut action = db.list_collection_names();
        if let Some(filter) = filter {
            action = action.filter(filter);
        }
        Ok(action.await?)
    }

    /// Shut the client down, waiting for in-flight operations to finish
    pub async fn close(self) {
        debug!(address = %self.address, "shutting down MongoDB client");
        self.client.shutdown().await;
    }
}
