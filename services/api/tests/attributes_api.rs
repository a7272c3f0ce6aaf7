//! Tag and ingredient endpoints. Both kinds share handlers, so every case
//! runs against both URL prefixes.

mod common;

use axum::http::StatusCode;
use serde_json::{Value, json};

use common::{TestApp, authorization};
use recipe_api::models::AttributeKind;

const KINDS: [AttributeKind; 2] = [AttributeKind::Tag, AttributeKind::Ingredient];

fn collection(kind: AttributeKind) -> String {
    format!("/recipe/{}", kind.recipe_field())
}

fn item(kind: AttributeKind, id: i64) -> String {
    format!("/recipe/{}/{}", kind.recipe_field(), id)
}

#[tokio::test]
async fn login_required() {
    let app = TestApp::new();

    for kind in KINDS {
        let response = app.server.get(&collection(kind)).await;
        assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
    }
}

#[tokio::test]
async fn retrieve_list_ordered_by_name_descending() {
    let app = TestApp::new();
    let (user, auth) = app.login("user@example.com").await;

    for kind in KINDS {
        app.sample_attribute(kind, &user, "Dessert").await;
        app.sample_attribute(kind, &user, "Vegan").await;
        app.sample_attribute(kind, &user, "Breakfast").await;

        let response = app
            .server
            .get(&collection(kind))
            .add_header(authorization(), auth.clone())
            .await;

        assert_eq!(response.status_code(), StatusCode::OK);
        let names: Vec<String> = response
            .json::<Vec<Value>>()
            .iter()
            .map(|row| row["name"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["Vegan", "Dessert", "Breakfast"]);
    }
}

#[tokio::test]
async fn list_limited_to_user() {
    let app = TestApp::new();
    let (user, auth) = app.login("user@example.com").await;
    let other = app.create_user("other@example.com", "testpass123").await;

    for kind in KINDS {
        app.sample_attribute(kind, &other, "Fruity").await;
        let own = app.sample_attribute(kind, &user, "Comfort Food").await;

        let response = app
            .server
            .get(&collection(kind))
            .add_header(authorization(), auth.clone())
            .await;

        assert_eq!(response.status_code(), StatusCode::OK);
        assert_eq!(
            response.json::<Value>(),
            json!([{"id": own.id, "name": "Comfort Food"}])
        );
    }
}

#[tokio::test]
async fn create_successful() {
    let app = TestApp::new();
    let (user, auth) = app.login("user@example.com").await;

    for kind in KINDS {
        let response = app
            .server
            .post(&collection(kind))
            .add_header(authorization(), auth.clone())
            .json(&json!({"name": "Cabbage"}))
            .await;

        assert_eq!(response.status_code(), StatusCode::CREATED);
        let body: Value = response.json();
        assert_eq!(body["name"], "Cabbage");

        let stored = app.state.attributes(kind).list(user.id).await.unwrap();
        assert!(stored.iter().any(|row| row.name == "Cabbage"));
    }
}

#[tokio::test]
async fn create_invalid() {
    let app = TestApp::new();
    let (_, auth) = app.login("user@example.com").await;

    for kind in KINDS {
        for payload in [json!({"name": ""}), json!({})] {
            let response = app
                .server
                .post(&collection(kind))
                .add_header(authorization(), auth.clone())
                .json(&payload)
                .await;

            assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
            assert!(response.json::<Value>()["fields"]["name"].is_array());
        }
    }
}

#[tokio::test]
async fn retrieve_update_and_delete_own_row() {
    let app = TestApp::new();
    let (user, auth) = app.login("user@example.com").await;

    for kind in KINDS {
        let row = app.sample_attribute(kind, &user, "Salt").await;

        let response = app
            .server
            .get(&item(kind, row.id))
            .add_header(authorization(), auth.clone())
            .await;
        assert_eq!(response.status_code(), StatusCode::OK);
        assert_eq!(response.json::<Value>()["name"], "Salt");

        let response = app
            .server
            .put(&item(kind, row.id))
            .add_header(authorization(), auth.clone())
            .json(&json!({"name": "Pepper"}))
            .await;
        assert_eq!(response.status_code(), StatusCode::OK);
        assert_eq!(response.json::<Value>()["name"], "Pepper");

        let response = app
            .server
            .patch(&item(kind, row.id))
            .add_header(authorization(), auth.clone())
            .json(&json!({}))
            .await;
        assert_eq!(response.status_code(), StatusCode::OK);
        assert_eq!(response.json::<Value>()["name"], "Pepper");

        let response = app
            .server
            .delete(&item(kind, row.id))
            .add_header(authorization(), auth.clone())
            .await;
        assert_eq!(response.status_code(), StatusCode::NO_CONTENT);

        let stored = app.state.attributes(kind).find(user.id, row.id).await.unwrap();
        assert!(stored.is_none());
    }
}

#[tokio::test]
async fn other_users_rows_are_not_found() {
    let app = TestApp::new();
    let (_, auth) = app.login("user@example.com").await;
    let other = app.create_user("other@example.com", "testpass123").await;

    for kind in KINDS {
        let row = app.sample_attribute(kind, &other, "Private").await;

        let get = app
            .server
            .get(&item(kind, row.id))
            .add_header(authorization(), auth.clone())
            .await;
        assert_eq!(get.status_code(), StatusCode::NOT_FOUND);

        let patch = app
            .server
            .patch(&item(kind, row.id))
            .add_header(authorization(), auth.clone())
            .json(&json!({"name": "Mine now"}))
            .await;
        assert_eq!(patch.status_code(), StatusCode::NOT_FOUND);

        let delete = app
            .server
            .delete(&item(kind, row.id))
            .add_header(authorization(), auth.clone())
            .await;
        assert_eq!(delete.status_code(), StatusCode::NOT_FOUND);

        let stored = app.state.attributes(kind).find(other.id, row.id).await.unwrap();
        assert_eq!(stored.map(|r| r.name).as_deref(), Some("Private"));
    }
}

#[tokio::test]
async fn deleting_an_attribute_unlinks_it_from_recipes() {
    let app = TestApp::new();
    let (user, auth) = app.login("user@example.com").await;
    let tag = app.sample_tag(&user, "Vegan").await;
    let recipe = app
        .sample_recipe_with(&user, "Kale salad", vec![tag.id], vec![])
        .await;

    let response = app
        .server
        .delete(&item(AttributeKind::Tag, tag.id))
        .add_header(authorization(), auth)
        .await;
    assert_eq!(response.status_code(), StatusCode::NO_CONTENT);

    let stored = app
        .state
        .recipe_repository
        .find(user.id, recipe.id)
        .await
        .unwrap()
        .unwrap();
    assert!(stored.tag_ids.is_empty());
}
