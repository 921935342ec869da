//! Convenience facade over the MongoDB driver
//!
//! `Mongobject` holds connection parameters (a URI, or a host and port) plus
//! a selected database and collection, and forwards CRUD calls to the driver.
//!
//! # Features
//! - Serde-friendly `ConnectionConfig` with pool settings
//! - Async facade (`Mongobject`) and a blocking one (`blocking::Mongobject`)
//! - Untyped documents (`bson::Document`) with JSON helpers
//! - Validated database and collection selection
//!
//! ```ignore
//! use bson::doc;
//! use mongobject::{blocking::Mongobject, ConnectionConfig};
//!
//! let config = ConnectionConfig::new()
//!     .with_uri("mongodb://localhost:27017")
//!     .with_database("test")
//!     .with_collection("greetings");
//! let mongobject = Mongobject::connect(config)?;
//! assert!(mongobject.insert(doc! { "a": 1, "b": "hola" })?);
//! ```

pub mod blocking;
pub mod config;
pub mod connection;
pub mod document;
pub mod error;
pub mod facade;
pub mod query;
pub mod validation;

pub use config::{Address, ConnectionConfig, Info, PoolConfig};
pub use connection::Connection;
pub use document::{parse_json_document, parse_json_payload, to_json, Found, Payload};
pub use error::{MongobjectError, Result};
pub use facade::Mongobject;
pub use query::{FindOption, FindQuery};
pub use validation::{ValidatedCollectionName, ValidatedDatabaseName};
