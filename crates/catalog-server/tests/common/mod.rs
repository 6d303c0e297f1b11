#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Request, Response, StatusCode},
    Router,
};
use catalog_db::{create_pool, run_migrations, DbPool, DbRuntimeSettings};
use catalog_server::{app, AppState};
use tempfile::TempDir;
use tower::ServiceExt;

pub const SECRET: &str = "test-secret";

/// A router over a fresh on-disk database seeded with `Tools` (id 1) and
/// `Garden` (id 2). The temp dir must outlive the router.
pub struct TestApp {
    pub router: Router,
    pub pool: DbPool,
    _dir: TempDir,
}

pub fn setup_app() -> TestApp {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let path = dir.path().join("data.sqlite");
    let pool = create_pool(path.to_str().unwrap(), DbRuntimeSettings::default()).unwrap();
    {
        let conn = pool.get().unwrap();
        run_migrations(&conn).unwrap();
        catalog_store::seed_categories(&conn, &["Tools", "Garden"]).unwrap();
    }

    TestApp {
        router: app(AppState::new(pool.clone(), SECRET)),
        pool,
        _dir: dir,
    }
}

impl TestApp {
    pub async fn get(&self, uri: &str, cookie: Option<&str>) -> Response<Body> {
        let mut builder = Request::builder().uri(uri).method("GET");
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.router
            .clone()
            .oneshot(builder.body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    pub async fn post_form(&self, uri: &str, form: &str) -> Response<Body> {
        let request = Request::builder()
            .uri(uri)
            .method("POST")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(form.to_string()))
            .unwrap();
        self.router.clone().oneshot(request).await.unwrap()
    }

    pub fn product_count(&self) -> usize {
        let conn = self.pool.get().unwrap();
        catalog_store::count_products(&conn).unwrap()
    }

    pub fn product(&self, id: i64) -> Option<catalog_types::Product> {
        let conn = self.pool.get().unwrap();
        catalog_store::get_product(&conn, id).ok()
    }

    /// Creates a product through the HTTP surface and returns its id.
    pub async fn create(&self, name: &str, category: i64) -> i64 {
        let response = self
            .post_form("/new", &format!("name={name}&category={category}"))
            .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        let conn = self.pool.get().unwrap();
        catalog_store::find_product_by_name(&conn, name)
            .unwrap()
            .expect("created product should exist")
            .id
    }
}

pub async fn body_string(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// Returns the `name=value` pair of the flash cookie set by `response`.
pub fn flash_cookie(response: &Response<Body>) -> Option<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with("catalog_flash="))
        .and_then(|v| v.split(';').next())
        .map(str::to_string)
}

pub fn location(response: &Response<Body>) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}
