//! Document payloads and JSON helpers
//!
//! Documents are plain `bson::Document`s, ordered string-keyed maps of BSON
//! values. This module adds the shapes the facade accepts and returns, plus
//! conversion from and to (Extended) JSON for callers that speak JSON.

use bson::{Bson, Document as BsonDocument};
use serde::Serialize;

use crate::{MongobjectError, Result};

/// What `insert` accepts: one document or a batch
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    One(BsonDocument),
    Many(Vec<BsonDocument>),
}

impl Payload {
    /// Serialize any value into a single-document payload
    pub fn from_serialize<T: Serialize>(value: &T) -> Result<Self> {
        Ok(Payload::One(bson::to_document(value)?))
    }

    pub fn len(&self) -> usize {
        match self {
            Payload::One(_) => 1,
            Payload::Many(docs) => docs.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<BsonDocument> for Payload {
    fn from(doc: BsonDocument) -> Self {
        Payload::One(doc)
    }
}

impl From<Vec<BsonDocument>> for Payload {
    fn from(docs: Vec<BsonDocument>) -> Self {
        Payload::Many(docs)
    }
}

/// One result of a find: the `_id` split from the rest of the document
#[derive(Debug, Clone, PartialEq)]
pub struct Found {
    /// `None` when the projection excluded `_id`
    pub id: Option<Bson>,
    pub document: BsonDocument,
}

impl From<BsonDocument> for Found {
    fn from(mut document: BsonDocument) -> Self {
        let id = document.remove("_id");
        Self { id, document }
    }
}

impl Found {
    /// Put the `_id` back in front of the body
    pub fn into_document(self) -> BsonDocument {
        match self.id {
            Some(id) => {
                let mut doc = BsonDocument::new();
                doc.insert("_id", id);
                for (key, value) in self.document {
                    doc.insert(key, value);
                }
                doc
            }
            None => self.document,
        }
    }
}

/// Parse JSON (Extended JSON allowed) into a document; the top level must be an object
pub fn parse_json_document(input: &str) -> Result<BsonDocument> {
    match parse_json_bson(input)? {
        Bson::Document(doc) => Ok(doc),
        other => Err(MongobjectError::Serialization(format!(
            "expected a JSON object, got {:?}",
            other.element_type()
        ))),
    }
}

/// Parse JSON into a payload: an object is one document, an array of objects is a batch
pub fn parse_json_payload(input: &str) -> Result<Payload> {
    match parse_json_bson(input)? {
        Bson::Document(doc) => Ok(Payload::One(doc)),
        Bson::Array(items) => items
            .into_iter()
            .map(|item| match item {
                Bson::Document(doc) => Ok(doc),
                other => Err(MongobjectError::Serialization(format!(
                    "expected an array of JSON objects, found {:?}",
                    other.element_type()
                ))),
            })
            .collect::<Result<Vec<_>>>()
            .map(Payload::Many),
        other => Err(MongobjectError::Serialization(format!(
            "expected a JSON object or array, got {:?}",
            other.element_type()
        ))),
    }
}

/// Render a document as relaxed Extended JSON
pub fn to_json(doc: &BsonDocument) -> serde_json::Value {
    Bson::Document(doc.clone()).into_relaxed_extjson()
}

fn parse_json_bson(input: &str) -> Result<Bson> {
    let value: serde_json::Value = serde_json::from_str(input)?;
    Bson::try_from(value).map_err(|e| MongobjectError::Serialization(e.to_string()))
}
