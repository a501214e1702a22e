use axum::body::{to_bytes, Body};
use axum::http::{header, HeaderName, Method, Request, StatusCode};
use axum::Router;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use kittygram_api::{router, AppState};
use kittygram_core::db::open_db_in_memory;
use kittygram_core::repo::user_repo::SqliteUserRepository;
use kittygram_core::{FixedClock, MediaStore, UserService};
use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

const PIXEL_PNG: &str = "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";

struct TestApp {
    router: Router,
    user: i64,
    _media_dir: TempDir,
}

impl TestApp {
    fn new() -> Self {
        let conn = open_db_in_memory().unwrap();
        let user = UserService::new(SqliteUserRepository::try_new(&conn).unwrap())
            .register("alice")
            .unwrap()
            .id;
        let media_dir = tempfile::tempdir().unwrap();
        let state = AppState::new(
            conn,
            MediaStore::new(media_dir.path()),
            Arc::new(FixedClock(2024)),
            HeaderName::from_static("x-user-id"),
        );
        Self {
            router: router(state),
            user,
            _media_dir: media_dir,
        }
    }

    async fn send(
        &self,
        method: Method,
        uri: &str,
        user: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        if let Some(user) = user {
            request = request.header("x-user-id", user);
        }
        let body = match body {
            Some(value) => {
                request = request.header(header::CONTENT_TYPE, "application/json");
                Body::from(serde_json::to_vec(&value).unwrap())
            }
            None => Body::empty(),
        };

        let response = self
            .router
            .clone()
            .oneshot(request.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn as_owner(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let user = self.user.to_string();
        self.send(method, uri, Some(&user), body).await
    }
}

#[tokio::test]
async fn health_reports_version() {
    let app = TestApp::new();
    let (status, body) = app.send(Method::GET, "/api/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["version"], kittygram_core::core_version());
}

#[tokio::test]
async fn create_then_fetch_cat() {
    let app = TestApp::new();
    let (status, created) = app
        .as_owner(
            Method::POST,
            "/api/cats/",
            Some(json!({
                "name": "Tom",
                "color": "#ff0000",
                "birth_year": 2020,
                "achievements": [{"achievement_name": "Mouser"}]
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["color"], "red");
    assert_eq!(created["age"], 4);
    assert_eq!(created["owner"], app.user);
    assert_eq!(created["image"], Value::Null);
    assert_eq!(created["achievements"][0]["achievement_name"], "Mouser");

    let uri = format!("/api/cats/{}/", created["id"]);
    let (status, fetched) = app.send(Method::GET, &uri, None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, created);
}

#[tokio::test]
async fn writes_require_a_known_user() {
    let app = TestApp::new();
    let body = json!({"name": "Tom", "color": "#ff0000", "birth_year": 2020});

    let (status, detail) = app
        .send(Method::POST, "/api/cats/", None, Some(body.clone()))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(
        detail,
        json!({"detail": "Authentication credentials were not provided."})
    );

    let (status, _) = app
        .send(Method::POST, "/api/cats/", Some("999"), Some(body))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, cats) = app.send(Method::GET, "/api/cats/", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cats, json!([]));
}

#[tokio::test]
async fn validation_errors_are_keyed_by_field() {
    let app = TestApp::new();
    let (status, body) = app
        .as_owner(
            Method::POST,
            "/api/cats/",
            Some(json!({"name": "Tom", "color": "#663399", "birth_year": 1990})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body,
        json!({
            "birth_year": ["cat cannot be older than 30 years"],
            "color": ["no name exists for this color"]
        })
    );
}

#[tokio::test]
async fn extreme_birth_year_is_rejected_and_server_keeps_serving() {
    let app = TestApp::new();
    let (status, body) = app
        .as_owner(
            Method::POST,
            "/api/cats/",
            Some(json!({"name": "Ancient", "color": "#ffffff", "birth_year": i32::MIN})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["birth_year"].is_array());

    let (status, cats) = app.send(Method::GET, "/api/cats/", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cats, json!([]));
}

#[tokio::test]
async fn malformed_json_is_a_bad_request() {
    let app = TestApp::new();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/cats/")
        .header("x-user-id", app.user.to_string())
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert!(body["detail"].is_string());
}

#[tokio::test]
async fn unknown_and_non_numeric_ids_are_not_found() {
    let app = TestApp::new();
    for uri in ["/api/cats/404/", "/api/cats/abc/", "/api/achievements/7/", "/api/nothing"] {
        let (status, body) = app.send(Method::GET, uri, None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
        assert_eq!(body, json!({"detail": "Not found."}), "{uri}");
    }
}

#[tokio::test]
async fn put_patch_and_delete_cat() {
    let app = TestApp::new();
    let (_, created) = app
        .as_owner(
            Method::POST,
            "/api/cats/",
            Some(json!({
                "name": "Tom", "color": "#ff0000", "birth_year": 2020,
                "achievements": [{"achievement_name": "A"}, {"achievement_name": "B"}]
            })),
        )
        .await;
    let uri = format!("/api/cats/{}/", created["id"]);

    let (status, patched) = app
        .as_owner(
            Method::PATCH,
            &uri,
            Some(json!({"achievements": [{"achievement_name": "B"}, {"achievement_name": "C"}]})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(patched["name"], "Tom");
    let names = patched["achievements"]
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["achievement_name"].as_str().unwrap())
        .collect::<Vec<_>>();
    assert_eq!(names, vec!["B", "C"]);

    let (status, body) = app
        .as_owner(Method::PUT, &uri, Some(json!({"name": "Thomas"})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["color"], json!(["This field is required."]));

    let (status, replaced) = app
        .as_owner(
            Method::PUT,
            &uri,
            Some(json!({"name": "Thomas", "color": "#000000", "birth_year": 2018})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(replaced["color"], "black");
    assert_eq!(replaced["age"], 6);
    assert_eq!(replaced["achievements"].as_array().unwrap().len(), 2);

    let (status, body) = app.as_owner(Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(body, Value::Null);
    let (status, _) = app.send(Method::GET, &uri, None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, achievements) = app
        .send(Method::GET, "/api/achievements/", None, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(achievements.as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn list_honours_limit_and_offset() {
    let app = TestApp::new();
    for name in ["One", "Two", "Three"] {
        app.as_owner(
            Method::POST,
            "/api/cats/",
            Some(json!({"name": name, "color": "#ff0000", "birth_year": 2020})),
        )
        .await;
    }

    let (status, page) = app
        .send(Method::GET, "/api/cats/?limit=1&offset=1", None, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page.as_array().unwrap().len(), 1);
    assert_eq!(page[0]["name"], "Two");

    let (status, _) = app
        .send(Method::GET, "/api/cats/?limit=many", None, None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn top_color_endpoint() {
    let app = TestApp::new();
    let (status, body) = app
        .send(Method::GET, "/api/cats/top-colors-cats/", None, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({"Самый популярный цвет": "Нет данных о цветах котов"})
    );

    for color in ["#ff0000", "#0000ff", "#ff0000"] {
        app.as_owner(
            Method::POST,
            "/api/cats/",
            Some(json!({"name": "Tom", "color": color, "birth_year": 2020})),
        )
        .await;
    }
    let (_, body) = app
        .send(Method::GET, "/api/cats/top-colors-cats/", None, None)
        .await;
    assert_eq!(body, json!({"Самый популярный цвет": "red"}));
}

#[tokio::test]
async fn embedded_image_round_trips() {
    let app = TestApp::new();
    let data_uri = format!("data:image/png;base64,{PIXEL_PNG}");
    let (status, created) = app
        .as_owner(
            Method::POST,
            "/api/cats/",
            Some(json!({"name": "Tom", "color": "#ff0000", "birth_year": 2020, "image": data_uri})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let rendered = created["image"].as_str().unwrap();
    let (_, payload) = rendered.split_once(";base64,").unwrap();
    assert_eq!(
        STANDARD.decode(payload).unwrap(),
        STANDARD.decode(PIXEL_PNG).unwrap()
    );

    let (status, body) = app
        .as_owner(
            Method::POST,
            "/api/cats/",
            Some(json!({"name": "Tom", "color": "#ff0000", "birth_year": 2020, "image": "cat.png"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["image"][0].as_str().unwrap().starts_with("The submitted data was not a file"));
}

#[tokio::test]
async fn achievement_crud_and_duplicates() {
    let app = TestApp::new();
    let (status, created) = app
        .as_owner(
            Method::POST,
            "/api/achievements/",
            Some(json!({"achievement_name": "Mouser"})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["achievement_name"], "Mouser");

    let (status, body) = app
        .as_owner(
            Method::POST,
            "/api/achievements/",
            Some(json!({"achievement_name": "Mouser"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body,
        json!({"achievement_name": ["achievement with this achievement name already exists."]})
    );

    let uri = format!("/api/achievements/{}/", created["id"]);
    let (status, renamed) = app
        .as_owner(Method::PATCH, &uri, Some(json!({"achievement_name": "Hunter"})))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(renamed["achievement_name"], "Hunter");

    let (status, _) = app
        .send(Method::DELETE, &uri, None, None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = app.as_owner(Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = app.send(Method::GET, &uri, None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
