//! Integration tests for the async facade.
//!
//! These tests require a MongoDB server to be running.
//! Set MONGODB_URI environment variable to customize connection.
//! Default: mongodb://localhost:27017
//!
//! Run with: cargo test -p mongobject --test test_crud -- --ignored

use bson::{doc, oid::ObjectId, Bson};
use mongobject::{ConnectionConfig, FindOption, FindQuery, Mongobject, MongobjectError};
use serde::Serialize;

/// Helper to get the server URI from environment
fn get_mongodb_uri() -> String {
    std::env::var("MONGODB_URI").unwrap_or_else(|_| "mongodb://localhost:27017".to_string())
}

/// Helper to connect to a fresh, uniquely named database
async fn connect_fresh(collection: &str) -> Mongobject {
    let database = format!("mongobject_test_{}", ObjectId::new().to_hex());
    let mut config = ConnectionConfig::new()
        .with_uri(get_mongodb_uri())
        .with_database(database)
        .with_collection(collection);
    config.pool.server_selection_timeout_secs = Some(5);

    Mongobject::connect(config).await.unwrap()
}

async fn teardown(mut mongobject: Mongobject) {
    mongobject.drop_database().await.unwrap();
    mongobject.close().await;
}

#[tokio::test]
#[ignore] // Only run with --ignored flag when a server is available
async fn test_ping_and_server_info() {
    let mongobject = connect_fresh("things").await;

    assert!(mongobject.ping().await.unwrap());
    let info = mongobject.server_info().await.unwrap();
    assert!(info.get_str("version").is_ok());

    teardown(mongobject).await;
}

#[tokio::test]
#[ignore]
async fn test_insert_then_find() {
    let mongobject = connect_fresh("greetings").await;

    assert!(mongobject.insert(doc! { "a": 1, "b": "hola" }).await.unwrap());

    let found = mongobject
        .find(FindQuery::new().filter(doc! { "b": "hola" }))
        .await
        .unwrap();
    assert_eq!(found.len(), 1);
    assert!(matches!(found[0].id, Some(Bson::ObjectId(_))));
    assert_eq!(found[0].document, doc! { "a": 1, "b": "hola" });

    teardown(mongobject).await;
}

#[tokio::test]
#[ignore]
async fn test_collections_appear_after_insert() {
    let mongobject = connect_fresh("events").await;

    assert!(mongobject.get_available_collections(None).await.unwrap().is_empty());

    mongobject.insert(doc! { "kind": "created" }).await.unwrap();
    let names = mongobject.get_available_collections(None).await.unwrap();
    assert!(names.contains(&"events".to_string()));

    let filtered = mongobject
        .get_available_collections(Some(doc! { "name": "missing" }))
        .await
        .unwrap();
    assert!(filtered.is_empty());

    teardown(mongobject).await;
}

#[tokio::test]
#[ignore]
async fn test_insert_batch_and_count() {
    let mongobject = connect_fresh("items").await;

    let batch = vec![doc! { "n": 1 }, doc! { "n": 2 }, doc! { "n": 3 }];
    assert!(mongobject.insert(batch).await.unwrap());
    assert!(mongobject.insert(vec![doc! { "n": 4 }]).await.unwrap());
    assert!(!mongobject.insert(Vec::<bson::Document>::new()).await.unwrap());

    assert_eq!(mongobject.count(doc! {}, 0, 0).await.unwrap(), 4);
    assert_eq!(mongobject.count(doc! { "n": { "$gt": 2 } }, 0, 0).await.unwrap(), 2);
    assert_eq!(mongobject.count(doc! {}, 1, 2).await.unwrap(), 2);

    teardown(mongobject).await;
}

#[tokio::test]
#[ignore]
async fn test_insert_one_and_serialized() {
    #[derive(Serialize)]
    struct Greeting {
        a: i32,
        b: String,
    }

    let mongobject = connect_fresh("greetings").await;

    let id = mongobject.insert_one(doc! { "a": 2 }).await.unwrap();
    assert!(matches!(id, Bson::ObjectId(_)));

    let id = mongobject
        .insert_serialized(&Greeting {
            a: 1,
            b: "hola".to_string(),
        })
        .await
        .unwrap();
    let found = mongobject
        .find(FindQuery::new().option(FindOption::FindOne).filter(doc! { "_id": id.clone() }))
        .await
        .unwrap();
    assert_eq!(found[0].id, Some(id));
    assert_eq!(found[0].document.get_str("b").unwrap(), "hola");

    teardown(mongobject).await;
}

#[tokio::test]
#[ignore]
async fn test_update_one_and_many() {
    let mongobject = connect_fresh("counters").await;
    mongobject
        .insert(vec![doc! { "k": "a", "v": 0 }, doc! { "k": "a", "v": 0 }, doc! { "k": "b", "v": 0 }])
        .await
        .unwrap();

    assert!(mongobject
        .update(doc! { "k": "b" }, doc! { "$inc": { "v": 1 } }, false, true)
        .await
        .unwrap());
    assert!(mongobject
        .update(doc! { "k": "a" }, doc! { "$set": { "v": 5 } }, false, false)
        .await
        .unwrap());
    assert_eq!(mongobject.count(doc! { "v": 5 }, 0, 0).await.unwrap(), 2);

    // No match and no upsert: nothing modified
    assert!(!mongobject
        .update(doc! { "k": "z" }, doc! { "$set": { "v": 1 } }, false, true)
        .await
        .unwrap());
    assert!(mongobject
        .update(doc! { "k": "z" }, doc! { "$set": { "v": 1 } }, true, true)
        .await
        .unwrap());
    assert_eq!(mongobject.count(doc! { "k": "z" }, 0, 0).await.unwrap(), 1);

    teardown(mongobject).await;
}

#[tokio::test]
#[ignore]
async fn test_replace_one_and_all() {
    let mongobject = connect_fresh("profiles").await;
    mongobject
        .insert(vec![doc! { "group": 1, "n": 1 }, doc! { "group": 1, "n": 2 }])
        .await
        .unwrap();

    assert!(mongobject
        .replace(doc! { "n": 1 }, doc! { "group": 2, "n": 10 }, false, true)
        .await
        .unwrap());
    assert_eq!(mongobject.count(doc! { "group": 2 }, 0, 0).await.unwrap(), 1);

    mongobject.insert(doc! { "group": 1, "n": 3 }).await.unwrap();
    assert!(mongobject
        .replace(doc! { "group": 1 }, doc! { "group": 3 }, false, false)
        .await
        .unwrap());
    assert_eq!(mongobject.count(doc! { "group": 3 }, 0, 0).await.unwrap(), 2);

    // Nothing matches: vacuous success without upsert, an insert with it
    assert!(mongobject
        .replace(doc! { "group": 9 }, doc! { "group": 9 }, false, false)
        .await
        .unwrap());
    assert_eq!(mongobject.count(doc! { "group": 9 }, 0, 0).await.unwrap(), 0);
    assert!(mongobject
        .replace(doc! { "group": 9 }, doc! { "group": 9 }, true, false)
        .await
        .unwrap());
    assert_eq!(mongobject.count(doc! { "group": 9 }, 0, 0).await.unwrap(), 1);

    teardown(mongobject).await;
}

#[tokio::test]
#[ignore]
async fn test_delete_one_and_many() {
    let mongobject = connect_fresh("logs").await;
    mongobject
        .insert(vec![doc! { "level": "debug" }, doc! { "level": "debug" }, doc! { "level": "info" }])
        .await
        .unwrap();

    assert!(mongobject.delete(doc! { "level": "debug" }, true).await.unwrap());
    assert_eq!(mongobject.count(doc! {}, 0, 0).await.unwrap(), 2);

    assert!(mongobject.delete(doc! {}, false).await.unwrap());
    assert!(!mongobject.delete(doc! {}, false).await.unwrap());

    teardown(mongobject).await;
}

#[tokio::test]
#[ignore]
async fn test_find_options() {
    let mongobject = connect_fresh("scores").await;
    mongobject
        .insert(vec![
            doc! { "name": "ana", "score": 3 },
            doc! { "name": "bo", "score": 1 },
            doc! { "name": "cy", "score": 2 },
        ])
        .await
        .unwrap();

    let sorted = mongobject
        .find(
            FindQuery::new()
                .sort(doc! { "score": 1 })
                .projection(doc! { "_id": 0, "name": 1 })
                .skip(1)
                .limit(1),
        )
        .await
        .unwrap();
    assert_eq!(sorted.len(), 1);
    assert!(sorted[0].id.is_none());
    assert_eq!(sorted[0].document, doc! { "name": "cy" });

    let before = mongobject
        .find(
            FindQuery::new()
                .option(FindOption::FindOneAndUpdate)
                .filter(doc! { "name": "bo" })
                .document(doc! { "$set": { "score": 7 } }),
        )
        .await
        .unwrap();
    assert_eq!(before[0].document.get_i32("score").unwrap(), 1);

    let after = mongobject
        .find(
            FindQuery::new()
                .option(FindOption::FindOneAndReplace)
                .filter(doc! { "name": "bo" })
                .document(doc! { "name": "bo", "score": 8 })
                .return_document_before(false),
        )
        .await
        .unwrap();
    assert_eq!(after[0].document.get_i32("score").unwrap(), 8);

    let deleted = mongobject
        .find(
            FindQuery::new()
                .option(FindOption::FindOneAndDelete)
                .filter(doc! { "name": "ana" }),
        )
        .await
        .unwrap();
    assert_eq!(deleted.len(), 1);
    assert_eq!(mongobject.count(doc! {}, 0, 0).await.unwrap(), 2);

    let none = mongobject
        .find(FindQuery::new().option(FindOption::FindOne).filter(doc! { "name": "zed" }))
        .await
        .unwrap();
    assert!(none.is_empty());

    teardown(mongobject).await;
}

#[tokio::test]
#[ignore]
async fn test_distinct() {
    let mongobject = connect_fresh("tags").await;
    mongobject
        .insert(vec![doc! { "tag": "x" }, doc! { "tag": "y" }, doc! { "tag": "x" }])
        .await
        .unwrap();

    let mut values: Vec<String> = mongobject
        .distinct("tag", None)
        .await
        .unwrap()
        .into_iter()
        .filter_map(|v| v.as_str().map(str::to_string))
        .collect();
    values.sort();
    assert_eq!(values, vec!["x".to_string(), "y".to_string()]);

    let filtered = mongobject.distinct("tag", Some(doc! { "tag": "y" })).await.unwrap();
    assert_eq!(filtered, vec![Bson::String("y".to_string())]);

    teardown(mongobject).await;
}

#[tokio::test]
#[ignore]
async fn test_collection_and_database_lifecycle() {
    let mut mongobject = connect_fresh("unused").await;
    let database = mongobject.get_database().unwrap().to_string();

    mongobject.create_collection("fresh").await.unwrap();
    assert_eq!(mongobject.get_collection(), Some("fresh"));
    assert!(mongobject
        .get_available_collections(None)
        .await
        .unwrap()
        .contains(&"fresh".to_string()));
    assert!(mongobject
        .get_available_databases(None)
        .await
        .unwrap()
        .contains(&database));

    // The database exists now, so it cannot be "created" again
    assert!(!mongobject.create_database(&database).await.unwrap());

    // Drop a second collection so the database keeps "fresh" and stays listed
    mongobject.create_collection("second").await.unwrap();
    assert!(mongobject.drop_collection().await.unwrap());
    assert_eq!(mongobject.get_collection(), None);
    assert!(!mongobject
        .get_available_collections(None)
        .await
        .unwrap()
        .contains(&"second".to_string()));
    assert!(matches!(
        mongobject.insert(doc! { "a": 1 }).await,
        Err(MongobjectError::Configuration(_))
    ));

    assert!(mongobject.drop_database().await.unwrap());
    assert_eq!(mongobject.get_database(), None);
    assert!(!mongobject
        .get_available_databases(None)
        .await
        .unwrap()
        .contains(&database));

    let fresh = format!("mongobject_test_{}", ObjectId::new().to_hex());
    assert!(mongobject.create_database(&fresh).await.unwrap());
    assert_eq!(mongobject.get_database(), Some(fresh.as_str()));

    mongobject.close().await;
}

#[tokio::test]
#[ignore]
async fn test_set_instance_reconnects() {
    let mut mongobject = connect_fresh("things").await;
    mongobject.insert(doc! { "a": 1 }).await.unwrap();

    let uri = get_mongodb_uri();
    mongobject.set_instance(Some(&uri), None, None).await.unwrap();
    assert!(mongobject.is_connected());
    assert_eq!(mongobject.get_info().address.uri(), Some(uri.as_str()));
    assert_eq!(mongobject.count(doc! {}, 0, 0).await.unwrap(), 1);

    teardown(mongobject).await;
}

#[tokio::test]
async fn test_unreachable_server_fails() {
    let mut config = ConnectionConfig::new()
        .with_host("127.0.0.1", Some(1))
        .with_database("test")
        .with_collection("things");
    config.pool.server_selection_timeout_secs = Some(1);
    config.pool.connect_timeout_secs = Some(1);

    let mongobject = Mongobject::connect(config).await.unwrap();
    let err = mongobject.insert(doc! { "a": 1 }).await.unwrap_err();
    assert!(matches!(err, MongobjectError::MongoDB(_)));
}
