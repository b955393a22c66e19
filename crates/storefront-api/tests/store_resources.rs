mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::TestApp;

#[tokio::test]
async fn anonymous_writes_are_rejected_without_side_effects() {
    let app = TestApp::new();
    let owner = app.register("owner@shop.test", "Owner").await;
    let store_id = app.create_store(&owner, "Main").await;
    let billboard_id = app.create_billboard(&owner, &store_id, "Sale").await;
    let uri = format!("/api/stores/{}/billboards", store_id);
    let member = format!("{}/{}", uri, billboard_id);

    let (status, body) = app.post(&uri, None, json!({ "label": "Winter", "imageUrl": "x" })).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "UNAUTHENTICATED");

    let (status, _) = app.patch(&member, None, json!({ "label": "Hacked", "imageUrl": "y" })).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app.delete(&member, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app.post("/api/stores", None, json!({ "name": "Nope" })).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let list = app.billboards(&store_id).await;
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["label"], "Sale");
}

#[tokio::test]
async fn bad_tokens_count_as_anonymous() {
    let app = TestApp::new();
    let (status, _) = app.post("/api/stores", Some("not-a-jwt"), json!({ "name": "Main" })).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn missing_fields_are_named() {
    let app = TestApp::new();
    let owner = app.register("owner@shop.test", "Owner").await;
    let store_id = app.create_store(&owner, "Main").await;
    let uri = format!("/api/stores/{}/billboards", store_id);

    let (status, body) = app.post(&uri, Some(&owner), json!({ "imageUrl": "https://cdn.test/a.png" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["field"], "label");
    assert_eq!(body["error"], "Billboard label is required");

    let (status, body) = app.post(&uri, Some(&owner), json!({ "label": "Sale", "imageUrl": "" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["field"], "imageUrl");

    let (status, body) = app
        .post(&format!("/api/stores/{}/categories", store_id), Some(&owner), json!({ "name": "Shoes" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["field"], "billboardId");

    let (status, body) = app.post("/api/stores", Some(&owner), json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["field"], "name");

    assert!(app.billboards(&store_id).await.is_empty());
}

#[tokio::test]
async fn malformed_json_is_a_bad_request() {
    let app = TestApp::new();
    let owner = app.register("owner@shop.test", "Owner").await;
    let store_id = app.create_store(&owner, "Main").await;

    let (status, body) = app
        .send(
            axum::http::Method::POST,
            &format!("/api/stores/{}/billboards", store_id),
            Some(&owner),
            Some(json!(["not", "an", "object"])),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn only_the_owner_can_write() {
    let app = TestApp::new();
    let owner = app.register("owner@shop.test", "Owner").await;
    let other = app.register("other@shop.test", "Other").await;
    let store_id = app.create_store(&owner, "Main").await;
    let billboard_id = app.create_billboard(&owner, &store_id, "Sale").await;
    let uri = format!("/api/stores/{}/billboards", store_id);
    let member = format!("{}/{}", uri, billboard_id);

    let (status, body) = app
        .post(&uri, Some(&other), json!({ "label": "Spam", "imageUrl": "https://cdn.test/s.png" }))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "FORBIDDEN");

    let (status, _) = app
        .patch(&member, Some(&other), json!({ "label": "Spam", "imageUrl": "https://cdn.test/s.png" }))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app.delete(&member, Some(&other)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app.patch(&format!("/api/stores/{}", store_id), Some(&other), json!({ "name": "Mine" })).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app.delete(&format!("/api/stores/{}", store_id), Some(&other)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let list = app.billboards(&store_id).await;
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["label"], "Sale");
}

#[tokio::test]
async fn unknown_store_is_forbidden() {
    let app = TestApp::new();
    let owner = app.register("owner@shop.test", "Owner").await;
    let (status, _) = app
        .post(
            "/api/stores/00000000-0000-0000-0000-000000000000/billboards",
            Some(&owner),
            json!({ "label": "Sale", "imageUrl": "https://cdn.test/a.png" }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn delete_is_idempotent() {
    let app = TestApp::new();
    let owner = app.register("owner@shop.test", "Owner").await;
    let store_id = app.create_store(&owner, "Main").await;
    let billboard_id = app.create_billboard(&owner, &store_id, "Sale").await;
    let member = format!("/api/stores/{}/billboards/{}", store_id, billboard_id);

    let (status, body) = app.delete(&member, Some(&owner)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "count": 1 }));

    let (status, body) = app.delete(&member, Some(&owner)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "count": 0 }));
}

#[tokio::test]
async fn owners_cannot_reach_into_other_stores() {
    let app = TestApp::new();
    let alice = app.register("alice@shop.test", "Alice").await;
    let bob = app.register("bob@shop.test", "Bob").await;
    let store_a = app.create_store(&alice, "Alice's").await;
    let store_b = app.create_store(&bob, "Bob's").await;
    let billboard_b = app.create_billboard(&bob, &store_b, "Bob Sale").await;

    // B's store id with B's record: not Alice's store.
    let (status, _) = app
        .patch(
            &format!("/api/stores/{}/billboards/{}", store_b, billboard_b),
            Some(&alice),
            json!({ "label": "Taken", "imageUrl": "https://cdn.test/t.png" }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Alice's store id with B's record: the record is not found there.
    let foreign = format!("/api/stores/{}/billboards/{}", store_a, billboard_b);
    let (status, _) = app
        .patch(&foreign, Some(&alice), json!({ "label": "Taken", "imageUrl": "https://cdn.test/t.png" }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = app.delete(&foreign, Some(&alice)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "count": 0 }));

    let list = app.billboards(&store_b).await;
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["label"], "Bob Sale");
}

#[tokio::test]
async fn reads_are_scoped_to_the_path_store() {
    let app = TestApp::new();
    let alice = app.register("alice@shop.test", "Alice").await;
    let bob = app.register("bob@shop.test", "Bob").await;
    let store_a = app.create_store(&alice, "Alice's").await;
    let store_b = app.create_store(&bob, "Bob's").await;
    app.create_billboard(&alice, &store_a, "A1").await;
    let billboard_b = app.create_billboard(&bob, &store_b, "B1").await;

    let list = app.billboards(&store_a).await;
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["label"], "A1");
    assert_eq!(list[0]["storeId"], store_a.as_str());

    let (status, body) = app
        .get(&format!("/api/stores/{}/billboards/{}", store_a, billboard_b), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.is_null());

    let (status, body) = app
        .get(&format!("/api/stores/{}/billboards/{}", store_b, billboard_b), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["label"], "B1");
    assert_eq!(body["imageUrl"], "https://cdn.test/B1.png");
}

#[tokio::test]
async fn billboard_lifecycle() {
    let app = TestApp::new();
    let owner = app.register("owner@shop.test", "Owner").await;
    let store_id = app.create_store(&owner, "Main").await;
    let uri = format!("/api/stores/{}/billboards", store_id);

    let (status, created) = app
        .post(&uri, Some(&owner), json!({ "label": "Summer", "imageUrl": "https://cdn.test/summer.png" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(created["label"], "Summer");
    assert_eq!(created["storeId"], store_id.as_str());
    let id = created["id"].as_str().unwrap().to_string();

    let list = app.billboards(&store_id).await;
    assert!(list.iter().any(|b| b["id"] == id.as_str()));

    let member = format!("{}/{}", uri, id);
    let (status, body) = app
        .patch(&member, Some(&owner), json!({ "label": "Autumn", "imageUrl": "https://cdn.test/autumn.png" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "count": 1 }));

    let (_, fetched) = app.get(&member, None).await;
    assert_eq!(fetched["label"], "Autumn");

    let (status, _) = app.delete(&member, Some(&owner)).await;
    assert_eq!(status, StatusCode::OK);

    let list = app.billboards(&store_id).await;
    assert!(list.iter().all(|b| b["id"] != id.as_str()));
}

#[tokio::test]
async fn billboards_in_use_cannot_be_deleted() {
    let app = TestApp::new();
    let owner = app.register("owner@shop.test", "Owner").await;
    let store_id = app.create_store(&owner, "Main").await;
    let billboard_id = app.create_billboard(&owner, &store_id, "Sale").await;

    let (status, category) = app
        .post(
            &format!("/api/stores/{}/categories", store_id),
            Some(&owner),
            json!({ "name": "Shoes", "billboardId": billboard_id }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(category["billboardId"], billboard_id.as_str());

    let member = format!("/api/stores/{}/billboards/{}", store_id, billboard_id);
    let (status, body) = app.delete(&member, Some(&owner)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].as_str().unwrap().contains("categories"));
    assert_eq!(app.billboards(&store_id).await.len(), 1);

    let category_member = format!("/api/stores/{}/categories/{}", store_id, category["id"].as_str().unwrap());
    let (status, _) = app.delete(&category_member, Some(&owner)).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app.delete(&member, Some(&owner)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "count": 1 }));
}

#[tokio::test]
async fn categories_must_use_a_billboard_of_the_same_store() {
    let app = TestApp::new();
    let alice = app.register("alice@shop.test", "Alice").await;
    let bob = app.register("bob@shop.test", "Bob").await;
    let store_a = app.create_store(&alice, "Alice's").await;
    let store_b = app.create_store(&bob, "Bob's").await;
    let billboard_b = app.create_billboard(&bob, &store_b, "B1").await;

    let (status, body) = app
        .post(
            &format!("/api/stores/{}/categories", store_a),
            Some(&alice),
            json!({ "name": "Shoes", "billboardId": billboard_b }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["field"], "billboardId");

    let (_, list) = app.get(&format!("/api/stores/{}/categories", store_a), None).await;
    assert_eq!(list, json!([]));
}

#[tokio::test]
async fn store_management() {
    let app = TestApp::new();
    let owner = app.register("owner@shop.test", "Owner").await;
    let first = app.create_store(&owner, "First").await;
    let second = app.create_store(&owner, "Second").await;
    app.create_billboard(&owner, &first, "Sale").await;

    let (status, stores) = app.get("/api/stores", Some(&owner)).await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = stores.as_array().unwrap().iter().map(|s| s["name"].as_str().unwrap()).collect();
    assert_eq!(names, vec!["First", "Second"]);

    let (status, _) = app.get("/api/stores", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, renamed) = app
        .patch(&format!("/api/stores/{}", second), Some(&owner), json!({ "name": " Outlet " }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(renamed["name"], "Outlet");

    let (status, body) = app.get("/api/stores/00000000-0000-0000-0000-000000000000", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.is_null());

    let (status, body) = app.delete(&format!("/api/stores/{}", first), Some(&owner)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "count": 1 }));

    let (_, body) = app.get(&format!("/api/stores/{}", first), None).await;
    assert!(body.is_null());
    assert!(app.billboards(&first).await.is_empty());
}

#[tokio::test]
async fn health_check() {
    let app = TestApp::new();
    let (status, body) = app.get("/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "ok");
}
