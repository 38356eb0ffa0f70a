mod common;

use common::{FakeStore, call, call_ok, registry, text};
use serde_json::json;

fn faq_definition() -> serde_json::Value {
    json!({
        "type": "faq_entry",
        "name": "FAQ entry",
        "display_name_key": "question",
        "field_definitions": [
            { "key": "question", "type": "single_line_text_field", "required": true },
            { "key": "answer", "type": "multi_line_text_field" }
        ],
        "capabilities": { "publishable": { "enabled": true } }
    })
}

#[tokio::test]
async fn a_metaobject_can_be_created_updated_and_deleted() {
    let (registry, store) = registry(FakeStore::default());

    let definition = call_ok(&registry, "create_metaobject_definition", faq_definition()).await;
    assert_eq!(definition["type"], json!("faq_entry"));
    assert_eq!(definition["metaobjectsCount"], json!(0));

    let created = call_ok(
        &registry,
        "create_metaobject",
        json!({
            "type": "faq_entry",
            "handle": "shipping-time",
            "fields": [
                { "key": "question", "value": "How long does shipping take?" },
                { "key": "answer", "value": "Three days" }
            ],
            "publish_status": "ACTIVE"
        }),
    )
    .await;
    let id = created["id"].as_str().unwrap().to_string();
    assert_eq!(created["displayName"], json!("How long does shipping take?"));
    assert_eq!(created["publishStatus"], json!("ACTIVE"));
    assert_eq!(created["fieldsByKey"]["answer"], json!("Three days"));

    let updated = call_ok(
        &registry,
        "update_metaobject",
        json!({ "id": id, "fields": [{ "key": "answer", "value": "Five days" }] }),
    )
    .await;
    assert_eq!(updated["fieldsByKey"]["answer"], json!("Five days"));
    assert_eq!(
        updated["fieldsByKey"]["question"],
        json!("How long does shipping take?")
    );

    let by_handle = call_ok(
        &registry,
        "get_metaobject",
        json!({ "type": "faq_entry", "handle": "shipping-time" }),
    )
    .await;
    assert_eq!(by_handle["id"], json!(id));
    assert_eq!(by_handle["fieldsByKey"]["answer"], json!("Five days"));

    let deleted = call_ok(&registry, "delete_metaobject", json!({ "id": id })).await;
    assert_eq!(deleted["deletedId"], json!(id));

    let missing = call(&registry, "get_metaobject", json!({ "id": id })).await.unwrap();
    assert_eq!(missing.is_error, Some(true));
    assert_eq!(text(&missing), format!("Metaobject {id} not found"));

    assert_eq!(
        store.calls(),
        vec![
            "CreateMetaobjectDefinition",
            "CreateMetaobject",
            "UpdateMetaobject",
            "GetMetaobjectByHandle",
            "DeleteMetaobject",
            "GetMetaobject",
        ]
    );
}

#[tokio::test]
async fn a_missing_required_field_is_reported_as_a_tool_error() {
    let (registry, _store) = registry(FakeStore::default());
    call_ok(&registry, "create_metaobject_definition", faq_definition()).await;

    let result = call(
        &registry,
        "create_metaobject",
        json!({ "type": "faq_entry", "fields": [{ "key": "answer", "value": "Soon" }] }),
    )
    .await
    .unwrap();

    assert_eq!(result.is_error, Some(true));
    assert_eq!(
        text(&result),
        "metaobjectCreate was rejected: metaobject.fields: question can't be blank (BLANK)"
    );
}

#[tokio::test]
async fn upsert_creates_then_updates_by_handle() {
    let (registry, _store) = registry(FakeStore::default());
    call_ok(&registry, "create_metaobject_definition", faq_definition()).await;

    let first = call_ok(
        &registry,
        "upsert_metaobject",
        json!({
            "type": "faq_entry",
            "handle": "returns",
            "fields": [{ "key": "question", "value": "Can I return an item?" }]
        }),
    )
    .await;
    let second = call_ok(
        &registry,
        "upsert_metaobject",
        json!({
            "type": "faq_entry",
            "handle": "returns",
            "fields": [{ "key": "answer", "value": "Within 30 days" }]
        }),
    )
    .await;

    assert_eq!(first["id"], second["id"]);
    assert_eq!(second["displayName"], json!("Can I return an item?"));
    assert_eq!(second["fieldsByKey"]["answer"], json!("Within 30 days"));

    let listed = call_ok(&registry, "list_metaobjects", json!({ "type": "faq_entry" })).await;
    assert_eq!(listed["items"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn a_definition_with_entries_is_only_deleted_on_request() {
    let (registry, store) = registry(FakeStore::default());
    let definition = call_ok(&registry, "create_metaobject_definition", faq_definition()).await;
    let definition_id = definition["id"].as_str().unwrap().to_string();
    for handle in ["one", "two"] {
        call_ok(
            &registry,
            "create_metaobject",
            json!({
                "type": "faq_entry",
                "handle": handle,
                "fields": [{ "key": "question", "value": handle }]
            }),
        )
        .await;
    }

    let refused = call(
        &registry,
        "delete_metaobject_definition",
        json!({ "id": definition_id }),
    )
    .await
    .unwrap();
    assert_eq!(refused.is_error, Some(true));
    assert!(text(&refused).contains("still has 2 dependent value(s)"));
    assert!(text(&refused).contains("delete_all_metaobjects"));
    assert!(!store.calls().contains(&"DeleteMetaobjectDefinition".to_string()));

    let deleted = call_ok(
        &registry,
        "delete_metaobject_definition",
        json!({ "id": definition_id, "delete_all_metaobjects": true }),
    )
    .await;
    assert_eq!(deleted["deletedId"], json!(definition_id));
    assert_eq!(deleted["deletedDependents"], json!(2));

    let listed = call_ok(&registry, "list_metaobjects", json!({ "type": "faq_entry" })).await;
    assert_eq!(listed["items"], json!([]));
}

#[tokio::test]
async fn an_unused_definition_is_deleted_without_the_cascade_flag() {
    let (registry, _store) = registry(FakeStore::default());
    let definition = call_ok(&registry, "create_metaobject_definition", faq_definition()).await;

    let deleted = call_ok(
        &registry,
        "delete_metaobject_definition",
        json!({ "id": definition["id"] }),
    )
    .await;

    assert_eq!(deleted["deletedId"], definition["id"]);
    assert_eq!(deleted["deletedDependents"], json!(0));
}
