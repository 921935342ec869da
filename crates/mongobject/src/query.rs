//! Query builder for find operations

use bson::Document as BsonDocument;
use mongodb::options::ReturnDocument;

/// Which driver call a find runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FindOption {
    #[default]
    Find,
    FindOne,
    FindOneAndDelete,
    FindOneAndReplace,
    FindOneAndUpdate,
}

impl std::str::FromStr for FindOption {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "find" => Ok(FindOption::Find),
            "find_one" => Ok(FindOption::FindOne),
            "find_one_and_delete" => Ok(FindOption::FindOneAndDelete),
            "find_one_and_replace" => Ok(FindOption::FindOneAndReplace),
            "find_one_and_update" => Ok(FindOption::FindOneAndUpdate),
            _ => Err(format!("Unknown find option: {}", s)),
        }
    }
}

/// Builder for `Mongobject::find`
#[derive(Debug, Clone)]
pub struct FindQuery {
    filter: BsonDocument,
    projection: Option<BsonDocument>,
    sort: Option<BsonDocument>,
    skip: Option<u64>,
    limit: Option<i64>,
    option: FindOption,
    document: Option<BsonDocument>,
    upsert: bool,
    return_document_before: bool,
}

impl Default for FindQuery {
    fn default() -> Self {
        Self {
            filter: BsonDocument::new(),
            projection: None,
            sort: None,
            skip: None,
            limit: None,
            option: FindOption::Find,
            document: None,
            upsert: false,
            return_document_before: true,
        }
    }
}

impl FindQuery {
    /// A plain `find` over every document
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the filter document
    pub fn filter(mut self, filter: BsonDocument) -> Self {
        self.filter = filter;
        self
    }

    pub fn projection(mut self, projection: BsonDocument) -> Self {
        self.projection = Some(projection);
        self
    }

    /// Set the sort order
    pub fn sort(mut self, sort: BsonDocument) -> Self {
        self.sort = Some(sort);
        self
    }

    /// Set the number of documents to skip
    pub fn skip(mut self, skip: u64) -> Self {
        self.skip = Some(skip);
        self
    }

    /// Set the maximum number of documents to return; 0 means no limit
    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = if limit == 0 { None } else { Some(limit) };
        self
    }

    pub fn option(mut self, option: FindOption) -> Self {
        self.option = option;
        self
    }

    /// Replacement (`FindOneAndReplace`) or update (`FindOneAndUpdate`) document
    pub fn document(mut self, document: BsonDocument) -> Self {
        self.document = Some(document);
        self
    }

    pub fn upsert(mut self, upsert: bool) -> Self {
        self.upsert = upsert;
        self
    }

    /// Return the document as it was before the modification (default) or after
    pub fn return_document_before(mut self, before: bool) -> Self {
        self.return_document_before = before;
        self
    }

    pub fn get_filter(&self) -> &BsonDocument {
        &self.filter
    }

    pub fn get_projection(&self) -> Option<&BsonDocument> {
        self.projection.as_ref()
    }

    pub fn get_sort(&self) -> Option<&BsonDocument> {
        self.sort.as_ref()
    }

    pub fn get_skip(&self) -> Option<u64> {
        self.skip
    }

    pub fn get_limit(&self) -> Option<i64> {
        self.limit
    }

    pub fn get_option(&self) -> FindOption {
        self.option
    }

    pub fn get_document(&self) -> Option<&BsonDocument> {
        self.document.as_ref()
    }

    pub fn get_upsert(&self) -> bool {
        self.upsert
    }

    pub fn return_document(&self) -> ReturnDocument {
        if self.return_document_before {
            ReturnDocument::Before
        } else {
            ReturnDocument::After
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;

    #[test]
    fn test_find_query_new() {
        let q = FindQuery::new();
        assert!(q.get_filter().is_empty());
        assert!(q.get_projection().is_none());
        assert!(q.get_sort().is_none());
        assert!(q.get_skip().is_none());
        assert!(q.get_limit().is_none());
        assert_eq!(q.get_option(), FindOption::Find);
        assert!(!q.get_upsert());
        assert!(matches!(q.return_document(), ReturnDocument::Before));
    }

    #[test]
    fn test_find_query_limit_zero_is_unlimited() {
        assert_eq!(FindQuery::new().limit(20).get_limit(), Some(20));
        assert_eq!(FindQuery::new().limit(20).limit(0).get_limit(), None);
    }

    #[test]
    fn test_find_query_chaining() {
        let filter = doc! { "active": true };
        let sort = doc! { "name": 1 };

        let q = FindQuery::new()
            .filter(filter.clone())
            .projection(doc! { "name": 1 })
            .sort(sort.clone())
            .skip(5)
            .limit(10);

        assert_eq!(q.get_filter(), &filter);
        assert_eq!(q.get_sort(), Some(&sort));
        assert_eq!(q.get_projection(), Some(&doc! { "name": 1 }));
        assert_eq!(q.get_skip(), Some(5));
        assert_eq!(q.get_limit(), Some(10));
    }

    #[test]
    fn test_find_query_modify_options() {
        let q = FindQuery::new()
            .option(FindOption::FindOneAndUpdate)
            .document(doc! { "$inc": { "visits": 1 } })
            .upsert(true)
            .return_document_before(false);

        assert_eq!(q.get_option(), FindOption::FindOneAndUpdate);
        assert_eq!(q.get_document(), Some(&doc! { "$inc": { "visits": 1 } }));
        assert!(q.get_upsert());
        assert!(matches!(q.return_document(), ReturnDocument::After));
    }

    #[test]
    fn test_find_option_from_str() {
        assert_eq!("find".parse::<FindOption>().unwrap(), FindOption::Find);
        assert_eq!("find-one".parse::<FindOption>().unwrap(), FindOption::FindOne);
        assert_eq!(
            "FIND_ONE_AND_DELETE".parse::<FindOption>().unwrap(),
            FindOption::FindOneAndDelete
        );
        assert!("scan".parse::<FindOption>().is_err());
    }
}
