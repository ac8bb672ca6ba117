//! Router tests driving the full `/api` surface with `oneshot`.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use serde_json::{Value, json};
use tower::ServiceExt;

use nxdocs_core::{CommandGenerator, MemoryStore};
use nxdocs_server::routes::build_router;
use nxdocs_server::state::AppState;
use nxdocs_storage::{
    MemoryStorage, Module, NewSavedCommand, Protocol, SavedCommand, SavedCommandPatch, Storage,
    StorageError, Tutorial,
};

fn app() -> Router {
    app_with(Arc::new(MemoryStorage::seeded().unwrap()))
}

fn app_with(storage: Arc<dyn Storage>) -> Router {
    build_router(Arc::new(AppState::new(storage)))
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

async fn get(app: Router, uri: &str) -> (StatusCode, Value) {
    send(app, Request::get(uri).body(Body::empty()).unwrap()).await
}

async fn post_json(app: Router, uri: &str, body: &str) -> (StatusCode, Value) {
    let request = Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_owned()))
        .unwrap();
    send(app, request).await
}

async fn delete(app: Router, uri: &str) -> (StatusCode, Value) {
    send(app, Request::delete(uri).body(Body::empty()).unwrap()).await
}

// ── Reference content ────────────────────────────────────────────────

#[tokio::test]
async fn lists_protocols_in_fixture_order() {
    let (status, body) = get(app(), "/api/protocols").await;

    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, ["smb", "ldap", "mssql", "winrm", "ssh"]);
    assert_eq!(body[0]["id"], 1);
    assert_eq!(body[0]["displayName"], "SMB");
}

#[tokio::test]
async fn lists_all_modules() {
    let (status, body) = get(app(), "/api/modules").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 19);
}

#[tokio::test]
async fn lists_modules_of_one_protocol() {
    let (status, body) = get(app(), "/api/modules/smb").await;

    assert_eq!(status, StatusCode::OK);
    let modules = body.as_array().unwrap();
    assert!(modules.iter().all(|m| m["protocolId"] == 1));

    // Modules of protocols missing from the catalogue (ftp, http) are filed
    // under the first protocol.
    let mut names: Vec<&str> = modules.iter().map(|m| m["name"].as_str().unwrap()).collect();
    names.sort_unstable();
    assert_eq!(
        names,
        [
            "anonymous_download",
            "ftp_bruteforce",
            "gpp_password",
            "lsassy",
            "mimikatz",
            "shares",
            "spider_plus",
            "web_scan",
            "zerologon",
        ]
    );
}

#[tokio::test]
async fn unknown_protocol_lists_no_modules() {
    let (status, body) = get(app(), "/api/modules/gopher").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn fetches_one_module() {
    let (status, body) = get(app(), "/api/modules/smb/shares").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "shares");
    assert_eq!(body["protocolId"], 1);
}

#[tokio::test]
async fn module_under_wrong_protocol_is_not_found() {
    let (status, body) = get(app(), "/api/modules/ldap/shares").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"message": "Module not found"}));
}

#[tokio::test]
async fn lists_tutorials() {
    let (status, body) = get(app(), "/api/tutorials").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 6);
}

#[tokio::test]
async fn fetches_tutorial_by_slug() {
    let (status, body) = get(app(), "/api/tutorials/getting-started-with-netexec").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["slug"], "getting-started-with-netexec");
    assert!(body["readTime"].is_number());
}

#[tokio::test]
async fn unknown_tutorial_is_not_found() {
    let (status, body) = get(app(), "/api/tutorials/no-such-tutorial").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"message": "Tutorial not found"}));
}

// ── Saved commands ───────────────────────────────────────────────────

#[tokio::test]
async fn lists_seed_commands() {
    let (status, body) = get(app(), "/api/saved-commands").await;

    assert_eq!(status, StatusCode::OK);
    let ids: Vec<i64> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, [1, 2, 3]);
}

#[tokio::test]
async fn minimal_post_is_created_with_next_id() {
    let app = app();
    let (status, body) = post_json(
        app.clone(),
        "/api/saved-commands",
        r#"{"name":"x","protocol":"smb","command":"netexec smb 1.2.3.4"}"#,
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["id"], 4);
    assert_eq!(body["name"], "x");
    assert_eq!(body["command"], "netexec smb 1.2.3.4");
    assert_eq!(body["isHash"], false);

    let (_, list) = get(app, "/api/saved-commands").await;
    assert_eq!(list.as_array().unwrap().len(), 4);
}

#[tokio::test]
async fn client_supplied_id_is_ignored() {
    let (status, body) = post_json(
        app(),
        "/api/saved-commands",
        r#"{"id":99,"name":"x","protocol":"smb","command":"netexec smb"}"#,
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["id"], 4);
}

#[tokio::test]
async fn malformed_post_is_a_generic_failure() {
    let (status, body) = post_json(app(), "/api/saved-commands", r#"{"name": 5"#).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({"message": "Failed to save command"}));
}

#[tokio::test]
async fn post_missing_required_field_is_a_generic_failure() {
    let (status, body) = post_json(app(), "/api/saved-commands", r#"{"name":"x"}"#).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({"message": "Failed to save command"}));
}

#[tokio::test]
async fn delete_removes_command() {
    let app = app();
    let (status, body) = delete(app.clone(), "/api/saved-commands/2").await;

    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(body, Value::Null);

    let (_, list) = get(app, "/api/saved-commands").await;
    let ids: Vec<i64> = list
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, [1, 3]);
}

#[tokio::test]
async fn delete_missing_or_non_integer_id_is_no_content() {
    let app = app();
    let (status, _) = delete(app.clone(), "/api/saved-commands/999").await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = delete(app.clone(), "/api/saved-commands/abc").await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, list) = get(app, "/api/saved-commands").await;
    assert_eq!(list.as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn builder_snapshot_round_trips_through_the_api() {
    let mut generator = CommandGenerator::new(MemoryStore::new()).unwrap();
    generator.edit(|form| {
        form.selected_module = "shares".to_owned();
        form.module_params.insert("--check-access".to_owned(), true);
    });
    let snapshot = generator.save("shares scan").unwrap().clone();

    let payload = serde_json::to_string(&snapshot.to_new_saved_command()).unwrap();
    let (status, body) = post_json(app(), "/api/saved-commands", &payload).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["name"], "shares scan");
    assert_eq!(body["module"], "shares");
    assert_eq!(body["command"], snapshot.command.as_str());
    assert_eq!(body["moduleParams"], json!({"--check-access": true}));
}

// ── Cross-cutting ────────────────────────────────────────────────────

#[tokio::test]
async fn responses_carry_hardening_headers() {
    let response = app()
        .oneshot(Request::get("/api/protocols").body(Body::empty()).unwrap())
        .await
        .unwrap();

    let headers = response.headers();
    assert_eq!(headers[header::X_CONTENT_TYPE_OPTIONS], "nosniff");
    assert_eq!(headers[header::X_FRAME_OPTIONS], "DENY");
}

#[tokio::test]
async fn unknown_route_is_not_found() {
    let response = app()
        .oneshot(Request::get("/api/users").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

/// A backend whose every call fails.
struct FailingStorage;

fn broken(operation: &'static str) -> StorageError {
    StorageError::Query {
        operation,
        reason: "connection refused at 10.0.0.7:5432".to_owned(),
    }
}

#[async_trait::async_trait]
impl Storage for FailingStorage {
    async fn initialize(&self) -> Result<(), StorageError> {
        Err(broken("initialize"))
    }
    async fn list_protocols(&self) -> Result<Vec<Protocol>, StorageError> {
        Err(broken("list_protocols"))
    }
    async fn list_modules(&self) -> Result<Vec<Module>, StorageError> {
        Err(broken("list_modules"))
    }
    async fn list_modules_by_protocol(&self, _: &str) -> Result<Vec<Module>, StorageError> {
        Err(broken("list_modules_by_protocol"))
    }
    async fn get_module(&self, _: &str, _: &str) -> Result<Option<Module>, StorageError> {
        Err(broken("get_module"))
    }
    async fn list_tutorials(&self) -> Result<Vec<Tutorial>, StorageError> {
        Err(broken("list_tutorials"))
    }
    async fn get_tutorial(&self, _: &str) -> Result<Option<Tutorial>, StorageError> {
        Err(broken("get_tutorial"))
    }
    async fn list_saved_commands(&self) -> Result<Vec<SavedCommand>, StorageError> {
        Err(broken("list_saved_commands"))
    }
    async fn get_saved_command(&self, _: i32) -> Result<Option<SavedCommand>, StorageError> {
        Err(broken("get_saved_command"))
    }
    async fn create_saved_command(
        &self,
        _: NewSavedCommand,
    ) -> Result<SavedCommand, StorageError> {
        Err(broken("create_saved_command"))
    }
    async fn update_saved_command(
        &self,
        _: i32,
        _: SavedCommandPatch,
    ) -> Result<Option<SavedCommand>, StorageError> {
        Err(broken("update_saved_command"))
    }
    async fn delete_saved_command(&self, _: i32) -> Result<(), StorageError> {
        Err(broken("delete_saved_command"))
    }
}

#[tokio::test]
async fn storage_failures_hide_their_cause() {
    let app = app_with(Arc::new(FailingStorage));

    let cases = [
        ("/api/modules", "Failed to fetch modules"),
        ("/api/modules/smb", "Failed to fetch modules"),
        ("/api/modules/smb/shares", "Failed to fetch module"),
        ("/api/protocols", "Failed to fetch protocols"),
        ("/api/tutorials", "Failed to fetch tutorials"),
        ("/api/tutorials/x", "Failed to fetch tutorial"),
        ("/api/saved-commands", "Failed to fetch saved commands"),
    ];
    for (uri, message) in cases {
        let (status, body) = get(app.clone(), uri).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR, "{uri}");
        assert_eq!(body, json!({"message": message}), "{uri}");
    }

    let (status, body) = post_json(
        app.clone(),
        "/api/saved-commands",
        r#"{"name":"x","protocol":"smb","command":"c"}"#,
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({"message": "Failed to save command"}));

    let (status, body) = delete(app, "/api/saved-commands/1").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({"message": "Failed to delete command"}));
}
