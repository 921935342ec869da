//! Name validation for database and collection selection
//!
//! The driver accepts any string as a database or collection name and only
//! fails once the server sees it. Names are checked here when they are
//! selected so a bad name fails at `set_database`/`set_collection` time.

use crate::{MongobjectError, Result};

/// MongoDB limit for database names (bytes)
const MAX_DATABASE_NAME_LENGTH: usize = 63;

/// Maximum allowed length for collection names (MongoDB limit is 255, we're more conservative)
const MAX_COLLECTION_NAME_LENGTH: usize = 120;

/// Characters the server rejects in database names
const FORBIDDEN_DATABASE_CHARS: &[char] = &['/', '\\', '.', ' ', '"', '$', '*', '<', '>', ':', '|', '?'];

/// Validated database name
///
/// - Not empty
/// - At most 63 bytes
/// - No null bytes
/// - None of `/\. "$*<>:|?`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedDatabaseName {
    name: String,
}

impl ValidatedDatabaseName {
    pub fn new(name: &str) -> Result<Self> {
        if name.is_empty() {
            return Err(MongobjectError::Validation(
                "Database name cannot be empty".to_string(),
            ));
        }

        if name.len() > MAX_DATABASE_NAME_LENGTH {
            return Err(MongobjectError::Validation(format!(
                "Database name exceeds maximum length of {} bytes: '{}'",
                MAX_DATABASE_NAME_LENGTH, name
            )));
        }

        if name.contains('\0') {
            return Err(MongobjectError::Validation(
                "Database name cannot contain null bytes".to_string(),
            ));
        }

        if let Some(c) = name.chars().find(|c| FORBIDDEN_DATABASE_CHARS.contains(c)) {
            return Err(MongobjectError::Validation(format!(
                "Database name cannot contain '{}': '{}'",
                c, name
            )));
        }

        Ok(Self {
            name: name.to_string(),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.name
    }

    pub fn into_string(self) -> String {
        self.name
    }
}

impl AsRef<str> for ValidatedDatabaseName {
    fn as_ref(&self) -> &str {
        &self.name
    }
}

impl std::fmt::Display for ValidatedDatabaseName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Validated collection name
///
/// - Not empty
/// - Maximum 120 characters
/// - No null bytes
/// - No "system." prefix (system collections)
/// - No $ characters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedCollectionName {
    name: String,
}

impl ValidatedCollectionName {
    pub fn new(name: &str) -> Result<Self> {
        if name.is_empty() {
            return Err(MongobjectError::Validation(
                "Collection name cannot be empty".to_string(),
            ));
        }

        if name.len() > MAX_COLLECTION_NAME_LENGTH {
            return Err(MongobjectError::Validation(format!(
                "Collection name exceeds maximum length of {} characters: '{}'",
                MAX_COLLECTION_NAME_LENGTH, name
            )));
        }

        if name.contains('\0') {
            return Err(MongobjectError::Validation(
                "Collection name cannot contain null bytes".to_string(),
            ));
        }

        if name.starts_with("system.") {
            return Err(MongobjectError::Validation(format!(
                "Collection name cannot start with 'system.' (reserved): '{}'",
                name
            )));
        }

        if name.contains('$') {
            return Err(MongobjectError::Validation(format!(
                "Collection name cannot contain '$' character: '{}'",
                name
            )));
        }

        Ok(Self {
            name: name.to_string(),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.name
    }

    pub fn into_string(self) -> String {
        self.name
    }
}

impl AsRef<str> for ValidatedCollectionName {
    fn as_ref(&self) -> &str {
        &self.name
    }
}

impl std::fmt::Display for ValidatedCollectionName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}
