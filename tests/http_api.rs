//! Routing and HTTP-contract tests: status codes, forwarded-identity
//! handling and response shapes, driven through the axum router with
//! in-memory backends.

mod support;

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header::HeaderName};
use serde_json::Value;
use tower::util::ServiceExt;

use vetrina::application::catalog::{CatalogService, CatalogTtls, ProductInput};
use vetrina::application::favorites::FavoriteService;
use vetrina::application::promos::PromoService;
use vetrina::application::search::MirrorPolicy;
use vetrina::cache::InMemoryCache;
use vetrina::infra::http::{AppState, router};

use support::{FakeBackend, FakeIndex, FakeObjectStore, buffered_image};

fn app() -> (Router, CatalogService) {
    let backend = Arc::new(FakeBackend::new());
    let index = Arc::new(FakeIndex::new());
    let objects = Arc::new(FakeObjectStore::new());
    let cache = Arc::new(InMemoryCache::new());

    let ttls = CatalogTtls {
        product: Duration::from_secs(60),
        listing: Duration::from_secs(60),
        search: Duration::from_secs(60),
        visit_lock: Duration::from_secs(60),
    };

    let catalog = CatalogService::new(
        backend.clone(),
        backend.clone(),
        backend.clone(),
        cache.clone(),
        index.clone(),
        objects.clone(),
        ttls,
        MirrorPolicy::Strict,
    );
    let promos = PromoService::new(
        backend.clone(),
        backend.clone(),
        backend.clone(),
        cache.clone(),
        objects,
        Duration::from_secs(60),
    );
    let favorites = FavoriteService::new(backend, cache, Duration::ZERO);

    let state = AppState {
        catalog: catalog.clone(),
        promos,
        favorites,
    };
    (router(state), catalog)
}

async fn seed_product(catalog: &CatalogService) -> i64 {
    catalog
        .create_product(
            ProductInput {
                name: "Trail Shoe".into(),
                description: "Lightweight trail running shoe".into(),
                price: 12900,
                size: 42,
                stock: 10,
            },
            buffered_image(),
        )
        .await
        .unwrap()
        .id
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn as_user(mut request: Request<Body>, id: i64, role: &str) -> Request<Body> {
    let headers = request.headers_mut();
    headers.insert(
        HeaderName::from_static("x-caller-id"),
        id.to_string().parse().unwrap(),
    );
    headers.insert(
        HeaderName::from_static("x-caller-role"),
        role.parse().unwrap(),
    );
    request
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn listing_and_detail_round_trip() {
    let (app, catalog) = app();
    let id = seed_product(&catalog).await;

    let response = app.clone().oneshot(get("/products")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["favorites_count"], 0);

    let response = app
        .clone()
        .oneshot(get(&format!("/products/{id}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["name"], "Trail Shoe");
    assert_eq!(body["favorited"], false);
}

#[tokio::test]
async fn missing_product_is_404() {
    let (app, _catalog) = app();
    let response = app.oneshot(get("/products/999")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn search_route_wins_over_the_id_parameter() {
    let (app, catalog) = app();
    seed_product(&catalog).await;

    let response = app.oneshot(get("/products/search?q=trail")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn favorite_toggle_requires_identity() {
    let (app, catalog) = app();
    let id = seed_product(&catalog).await;

    let anonymous = Request::builder()
        .method("POST")
        .uri(format!("/products/{id}/favorite"))
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(anonymous).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let request = as_user(
        Request::builder()
            .method("POST")
            .uri(format!("/products/{id}/favorite"))
            .body(Body::empty())
            .unwrap(),
        7,
        "customer",
    );
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "added");

    let response = app
        .oneshot(get(&format!("/products/{id}/favorites/count")))
        .await
        .unwrap();
    let body = json_body(response).await;
    assert_eq!(body["favorites_count"], 1);
}

#[tokio::test]
async fn mutations_are_admin_only() {
    let (app, catalog) = app();
    let id = seed_product(&catalog).await;

    let delete = |role: Option<&'static str>| {
        let mut request = Request::builder()
            .method("DELETE")
            .uri(format!("/products/{id}"))
            .body(Body::empty())
            .unwrap();
        if let Some(role) = role {
            request = as_user(request, 7, role);
        }
        request
    };

    let response = app.clone().oneshot(delete(None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app.clone().oneshot(delete(Some("customer"))).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app.clone().oneshot(delete(Some("admin"))).await.unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app.oneshot(get(&format!("/products/{id}"))).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn malformed_identity_headers_degrade_to_anonymous() {
    let (app, catalog) = app();
    let id = seed_product(&catalog).await;

    let mut request = Request::builder()
        .method("POST")
        .uri(format!("/products/{id}/favorite"))
        .body(Body::empty())
        .unwrap();
    request.headers_mut().insert(
        HeaderName::from_static("x-caller-id"),
        "not-a-number".parse().unwrap(),
    );
    request.headers_mut().insert(
        HeaderName::from_static("x-caller-role"),
        "customer".parse().unwrap(),
    );

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
