//! HTTP tests against a live PostgreSQL. They are ignored by default; run them
//! with `cargo test -- --ignored` and `TEST_DATABASE_URL` pointing at a
//! database the tests may write to.

use std::sync::Mutex;

use chrono::{DateTime, Utc};
use pretty_assertions::assert_eq;
use rocket::figment::Figment;
use rocket::http::{ContentType, Status};
use rocket::local::blocking::Client;
use serde_json::{json, Value};

use crate::db::DbConn;
use crate::settings::Settings;

// Every client ignites its own pool and runs migrations; one at a time.
static DB_LOCK: Mutex<()> = Mutex::new(());

fn test_figment() -> Figment {
    let url = std::env::var("TEST_DATABASE_URL").expect("TEST_DATABASE_URL must be set");
    let settings = Settings {
        database_url: Some(url),
        app_db_user: String::new(),
        app_db_password: String::new(),
        db_host: String::new(),
        db_port: 5432,
        app_db_name: String::new(),
        secret_key: None,
        port: 8000,
    };
    settings.figment()
}

fn with_client(test: impl FnOnce(&Client)) {
    let _guard = DB_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    let client = Client::tracked(crate::build_rocket(test_figment())).expect("valid rocket instance");

    test(&client);
}

fn unique(prefix: &str) -> String {
    format!("{}-{}", prefix, Utc::now().timestamp_micros())
}

fn create(client: &Client, body: Value) -> Value {
    let response = client.post("/items").json(&body).dispatch();
    assert_eq!(response.status(), Status::Created);
    response.into_json().expect("item body")
}

fn timestamp(item: &Value, field: &str) -> DateTime<Utc> {
    serde_json::from_value(item[field].clone()).expect("ISO-8601 timestamp")
}

#[test]
#[ignore = "requires TEST_DATABASE_URL"]
fn item_lifecycle() {
    with_client(|client| {
        let name = unique("Widget");
        let item = create(client, json!({ "name": name }));
        let id = item["id"].as_i64().expect("integer id");
        assert_eq!(item["name"], json!(name));
        assert_eq!(item["description"], Value::Null);
        assert!(timestamp(&item, "updated_at") >= timestamp(&item, "created_at"));

        let found: Vec<Value> = client
            .get(format!("/items?search={}", name.to_lowercase()))
            .dispatch()
            .into_json()
            .expect("list body");
        assert!(found.iter().any(|found| found["id"] == item["id"]));

        let response = client
            .put(format!("/items/{}", id))
            .json(&json!({ "description": "new" }))
            .dispatch();
        assert_eq!(response.status(), Status::Ok);
        let updated: Value = response.into_json().expect("item body");
        assert_eq!(updated["name"], json!(name));
        assert_eq!(updated["description"], json!("new"));
        assert!(timestamp(&updated, "updated_at") >= timestamp(&item, "updated_at"));

        let response = client.delete(format!("/items/{}", id)).dispatch();
        assert_eq!(response.status(), Status::Ok);
        assert_eq!(
            response.into_json::<Value>(),
            Some(json!({ "deleted": true, "id": id }))
        );

        for response in [
            client.get(format!("/items/{}", id)).dispatch(),
            client
                .put(format!("/items/{}", id))
                .json(&json!({ "name": "again" }))
                .dispatch(),
            client.delete(format!("/items/{}", id)).dispatch(),
        ] {
            assert_eq!(response.status(), Status::NotFound);
            assert_eq!(
                response.into_json::<Value>(),
                Some(json!({ "error": "Item not found." }))
            );
        }
    });
}

#[test]
#[ignore = "requires TEST_DATABASE_URL"]
fn invalid_names_are_rejected_and_not_persisted() {
    with_client(|client| {
        let marker = unique("rejected");

        for body in [
            json!({ "description": marker }),
            json!({ "name": "", "description": marker }),
            json!({ "name": "   ", "description": marker }),
            json!({ "name": 5, "description": marker }),
            json!([unique("ArrayBody"), marker]),
        ] {
            let response = client.post("/items").json(&body).dispatch();
            assert_eq!(response.status(), Status::BadRequest);
        }

        let response = client
            .post("/items")
            .header(ContentType::JSON)
            .body("not json")
            .dispatch();
        assert_eq!(response.status(), Status::BadRequest);

        let found: Vec<Value> = client
            .get(format!("/items?search={}", marker))
            .dispatch()
            .into_json()
            .expect("list body");
        assert_eq!(found, Vec::<Value>::new());
    });
}

#[test]
#[ignore = "requires TEST_DATABASE_URL"]
fn update_validates_name_and_clears_description() {
    with_client(|client| {
        let item = create(
            client,
            json!({ "name": unique("Gadget"), "description": "old" }),
        );
        let path = format!("/items/{}", item["id"]);

        let response = client.put(path.as_str()).json(&json!({ "name": "  " })).dispatch();
        assert_eq!(response.status(), Status::BadRequest);

        let response = client
            .put(path.as_str())
            .json(&json!({ "name": null, "description": "kept name" }))
            .dispatch();
        assert_eq!(response.status(), Status::Ok);
        let updated: Value = response.into_json().expect("item body");
        assert_eq!(updated["name"], item["name"]);
        assert_eq!(updated["description"], json!("kept name"));

        let response = client
            .put(path.as_str())
            .json(&json!({ "name": " Renamed ", "description": null }))
            .dispatch();
        assert_eq!(response.status(), Status::Ok);
        let updated: Value = response.into_json().expect("item body");
        assert_eq!(updated["name"], json!("Renamed"));
        assert_eq!(updated["description"], Value::Null);

        let fetched: Value = client.get(path.as_str()).dispatch().into_json().expect("item body");
        assert_eq!(fetched, updated);

        client.delete(path.as_str()).dispatch();
    });
}

#[test]
#[ignore = "requires TEST_DATABASE_URL"]
fn search_is_literal_and_newest_first() {
    with_client(|client| {
        let marker = unique("Batch");
        let first = create(client, json!({ "name": format!("{}%", marker) }));
        let second = create(
            client,
            json!({ "name": "other", "description": format!("{} part", marker.to_uppercase()) }),
        );

        let found: Vec<Value> = client
            .get(format!("/items?search={}", marker.to_lowercase()))
            .dispatch()
            .into_json()
            .expect("list body");
        let ids: Vec<&Value> = found.iter().map(|item| &item["id"]).collect();
        assert_eq!(ids, vec![&second["id"], &first["id"]]);

        let found: Vec<Value> = client
            .get(format!("/items?search={}%25", marker))
            .dispatch()
            .into_json()
            .expect("list body");
        assert_eq!(found.len(), 1);

        let found: Vec<Value> = client
            .get(format!("/items?search={}", unique("absent")))
            .dispatch()
            .into_json()
            .expect("list body");
        assert!(found.is_empty());

        for item in [first, second] {
            client.delete(format!("/items/{}", item["id"])).dispatch();
        }
    });
}

#[test]
#[ignore = "requires TEST_DATABASE_URL"]
fn health_reports_database_up() {
    with_client(|client| {
        let response = client.get("/health").dispatch();

        assert_eq!(response.status(), Status::Ok);
        assert_eq!(
            response.into_json::<Value>(),
            Some(json!({ "status": "ok", "db": "up" }))
        );
    });
}

#[test]
#[ignore = "requires TEST_DATABASE_URL"]
fn empty_update_only_refreshes_updated_at() {
    with_client(|client| {
        let item = create(
            client,
            json!({ "name": unique("Sprocket"), "description": "steel" }),
        );
        let path = format!("/items/{}", item["id"]);

        let response = client.put(path.as_str()).dispatch();
        assert_eq!(response.status(), Status::Ok);
        let updated: Value = response.into_json().expect("item body");
        assert_eq!(updated["name"], item["name"]);
        assert_eq!(updated["description"], item["description"]);
        assert_eq!(updated["created_at"], item["created_at"]);
        assert!(timestamp(&updated, "updated_at") > timestamp(&item, "updated_at"));

        client.delete(path.as_str()).dispatch();
    });
}

#[rocket::async_test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn health_reports_degraded_when_no_connection_is_free() {
    use rocket::local::asynchronous::Client;

    let _guard = DB_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    let figment = test_figment()
        .merge(("databases.items.pool_size", 1))
        .merge(("databases.items.timeout", 1));
    let client = Client::tracked(crate::build_rocket(figment))
        .await
        .expect("valid rocket instance");

    let _held = DbConn::get_one(client.rocket())
        .await
        .expect("pooled connection");
    let response = client.get("/health").dispatch().await;

    assert_eq!(response.status(), Status::ServiceUnavailable);
    assert_eq!(
        response.into_json::<Value>().await,
        Some(json!({
            "status": "degraded",
            "db": "down",
            "error": "Couldn't acquire a database connection",
        }))
    );
}

#[test]
#[ignore = "requires TEST_DATABASE_URL"]
fn malformed_ids_are_not_found() {
    with_client(|client| {
        for path in ["/items/not-a-number", "/items/99999999999", "/items/1.5"] {
            for response in [
                client.get(path).dispatch(),
                client.put(path).json(&json!({ "name": "x" })).dispatch(),
                client.delete(path).dispatch(),
            ] {
                assert_eq!(response.status(), Status::NotFound);
                assert_eq!(response.content_type(), Some(ContentType::JSON));
                assert_eq!(
                    response.into_json::<Value>(),
                    Some(json!({ "error": "Item not found." }))
                );
            }
        }
    });
}
