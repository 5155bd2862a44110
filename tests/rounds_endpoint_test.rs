use axum::http::StatusCode;
use chrono::Duration;
use price_rounds::api;
use price_rounds::clock::{FixedClock, DEFAULT_TIMEZONE};
use price_rounds::db::init_db;
use price_rounds::domain::{
    BusinessDate, ManagerAssignment, Market, MarketCatalogEntry, MarketId, Product, ProductId,
    ProfileId, Unit, UnitId,
};
use price_rounds::{Repository, RoundEngine, SqliteDirectory};
use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::TempDir;
use tower::util::ServiceExt;

struct TestApp {
    app: axum::Router,
    clock: Arc<FixedClock>,
    market: MarketId,
    products: Vec<ProductId>,
    unit: UnitId,
    manager: ProfileId,
    admin: ProfileId,
    _temp: TempDir,
}

fn today() -> BusinessDate {
    BusinessDate::from_ymd(2026, 10, 19).unwrap()
}

/// "Chợ A" with three catalog products priced per kg and one manager.
async fn setup_test_app() -> TestApp {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir
        .path()
        .join("test.db")
        .to_string_lossy()
        .to_string();
    let pool = init_db(&db_path).await.expect("init_db failed");
    let repo = Arc::new(Repository::new(pool));

    let market = MarketId::new();
    let unit = UnitId::new();
    let manager = ProfileId::new();
    let products: Vec<ProductId> = (0..3).map(|_| ProductId::new()).collect();

    repo.upsert_unit(&Unit {
        id: unit,
        name: "kg".to_string(),
        active: true,
    })
    .await
    .unwrap();
    repo.upsert_market(&Market {
        id: market,
        name: "Chợ A".to_string(),
        active: true,
    })
    .await
    .unwrap();
    for (i, product_id) in products.iter().enumerate() {
        repo.upsert_product(&Product {
            id: *product_id,
            name: format!("product-{}", i),
            default_unit_id: unit,
            active: true,
        })
        .await
        .unwrap();
        repo.upsert_catalog_entry(&MarketCatalogEntry {
            market_id: market,
            product_id: *product_id,
            unit_id: unit,
            active: true,
        })
        .await
        .unwrap();
    }
    repo.upsert_manager_assignment(&ManagerAssignment {
        market_id: market,
        profile_id: manager,
        active: true,
    })
    .await
    .unwrap();

    let directory = Arc::new(SqliteDirectory::new(repo.clone()));
    let clock = Arc::new(FixedClock::at_local_noon(today(), DEFAULT_TIMEZONE));
    let engine = Arc::new(RoundEngine::new(
        repo.clone(),
        directory.clone(),
        directory,
        clock.clone(),
    ));
    let app = api::create_router(api::AppState::new(repo, engine));

    TestApp {
        app,
        clock,
        market,
        products,
        unit,
        manager,
        admin: ProfileId::new(),
        _temp: temp_dir,
    }
}

async fn request(
    app: axum::Router,
    method: &str,
    uri: &str,
    actor: Option<(ProfileId, &str)>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = axum::http::Request::builder().method(method).uri(uri);
    if let Some((profile, role)) = actor {
        builder = builder
            .header("x-profile-id", profile.to_string())
            .header("x-role", role);
    }
    let req = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(axum::body::Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(axum::body::Body::empty()).unwrap(),
    };

    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

async fn open_round(t: &TestApp) -> String {
    let (status, body) = request(
        t.app.clone(),
        "POST",
        "/v1/rounds",
        Some((t.admin, "admin")),
        Some(json!({"marketId": t.market})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    body["roundId"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_health_and_ready() {
    let t = setup_test_app().await;
    let (status, body) = request(t.app.clone(), "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    let (status, body) = request(t.app.clone(), "GET", "/ready", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ready");
}

#[tokio::test]
async fn test_market_day_end_to_end() {
    let t = setup_test_app().await;
    let round_id = open_round(&t).await;

    // Opening again returns the same round.
    let (status, body) = request(
        t.app.clone(),
        "POST",
        "/v1/rounds",
        Some((t.admin, "admin")),
        Some(json!({"marketId": t.market})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["roundId"], round_id.as_str());
    assert_eq!(body["created"], false);

    let (status, round) = request(
        t.app.clone(),
        "GET",
        &format!("/v1/markets/{}/round", t.market),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(round["forDate"], "2026-10-19");
    assert_eq!(round["status"], "open");
    assert_eq!(round["managerId"], t.manager.to_string());
    assert_eq!(round["items"].as_array().unwrap().len(), 3);
    assert!(round["items"][0]["price"].is_null());

    let prices_uri = format!("/v1/rounds/{}/prices", round_id);
    let (status, first) = request(
        t.app.clone(),
        "POST",
        &prices_uri,
        Some((t.manager, "manager")),
        Some(json!({"productId": t.products[0], "price": 15000})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", first);
    assert!(first["beforePrice"].is_null());

    let (status, second) = request(
        t.app.clone(),
        "POST",
        &prices_uri,
        Some((t.manager, "manager")),
        Some(json!({
            "productId": t.products[0],
            "price": "16000",
            "noteType": "up",
            "notes": "  mưa lớn  "
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(second["beforePrice"], "15000");
    assert_eq!(second["priceEntryId"], first["priceEntryId"]);

    let (status, progress) = request(
        t.app.clone(),
        "GET",
        &format!("/v1/rounds/{}/status", round_id),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(progress["productCount"], 3);
    assert_eq!(progress["filledCount"], 1);
    let completion = progress["completion"].as_f64().unwrap();
    assert!((completion - 1.0 / 3.0).abs() < 1e-9);
    assert_eq!(progress["perManagerFilled"][0]["profileId"], t.manager.to_string());
    assert_eq!(progress["perManagerFilled"][0]["filled"], 1);

    let (status, history) = request(
        t.app.clone(),
        "GET",
        &format!(
            "/v1/prices/{}/history",
            first["priceEntryId"].as_str().unwrap()
        ),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(history["entry"]["price"], "16000");
    assert_eq!(history["entry"]["unitId"], t.unit.to_string());
    assert_eq!(history["entry"]["notes"], "mưa lớn");
    let changes = history["history"].as_array().unwrap();
    assert_eq!(changes.len(), 2);
    assert!(changes[0]["beforePrice"].is_null());
    assert_eq!(changes[1]["beforePrice"], changes[0]["afterPrice"]);
    assert_eq!(changes[1]["noteType"], "up");

    let (status, by_product) = request(
        t.app.clone(),
        "GET",
        &format!("/v1/rounds/{}/prices/{}/history", round_id, t.products[0]),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(by_product["entry"]["id"], first["priceEntryId"]);
    assert_eq!(by_product["history"].as_array().unwrap().len(), 2);

    let (status, closed) = request(
        t.app.clone(),
        "POST",
        &format!("/v1/rounds/{}/close", round_id),
        Some((t.manager, "manager")),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(closed["changed"], true);

    let (status, err) = request(
        t.app.clone(),
        "POST",
        &prices_uri,
        Some((t.manager, "manager")),
        Some(json!({"productId": t.products[1], "price": 9000})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(err["kind"], "round_closed");

    // The closed round is still what the market shows for the day.
    let (_, round) = request(
        t.app.clone(),
        "GET",
        &format!("/v1/markets/{}/round?date=2026-10-19", t.market),
        None,
        None,
    )
    .await;
    assert_eq!(round["status"], "closed");
    assert_eq!(round["items"][0]["price"], "16000");
}

#[tokio::test]
async fn test_submission_rejections() {
    let t = setup_test_app().await;
    let round_id = open_round(&t).await;
    let prices_uri = format!("/v1/rounds/{}/prices", round_id);

    let (status, err) = request(
        t.app.clone(),
        "POST",
        &prices_uri,
        Some((t.manager, "manager")),
        Some(json!({"productId": t.products[0], "price": 0})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["kind"], "invalid_price");

    let (status, err) = request(
        t.app.clone(),
        "POST",
        &prices_uri,
        Some((ProfileId::new(), "manager")),
        Some(json!({"productId": t.products[0], "price": 1000})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(err["kind"], "not_locked_manager");

    let (status, err) = request(
        t.app.clone(),
        "POST",
        &prices_uri,
        Some((t.manager, "manager")),
        Some(json!({"productId": ProductId::new(), "price": 1000})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(err["kind"], "product_not_in_round");

    let (status, err) = request(
        t.app.clone(),
        "POST",
        &prices_uri,
        None,
        Some(json!({"productId": t.products[0], "price": 1000})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["kind"], "bad_request");

    // Past local midnight the round's day is over.
    t.clock.advance(Duration::hours(12));
    let (status, err) = request(
        t.app.clone(),
        "POST",
        &prices_uri,
        Some((t.manager, "manager")),
        Some(json!({"productId": t.products[0], "price": 1000})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(err["kind"], "outside_window");
}

#[tokio::test]
async fn test_open_round_errors() {
    let t = setup_test_app().await;

    let (status, err) = request(
        t.app.clone(),
        "POST",
        "/v1/rounds",
        Some((ProfileId::new(), "manager")),
        Some(json!({"marketId": t.market})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(err["kind"], "unauthorized");

    let (status, err) = request(
        t.app.clone(),
        "POST",
        "/v1/rounds",
        Some((t.admin, "admin")),
        Some(json!({"marketId": MarketId::new()})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(err["kind"], "not_found");

    let (status, _) = request(
        t.app.clone(),
        "POST",
        "/v1/rounds",
        Some((t.admin, "admin")),
        Some(json!({"marketId": "not-a-uuid"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // The assigned manager may open their own market's round.
    let (status, body) = request(
        t.app.clone(),
        "POST",
        "/v1/rounds",
        Some((t.manager, "manager")),
        Some(json!({"marketId": t.market, "forDate": "2026-10-19"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["created"], true);
}

#[tokio::test]
async fn test_round_lookup_not_found() {
    let t = setup_test_app().await;
    let (status, err) = request(
        t.app.clone(),
        "GET",
        &format!("/v1/markets/{}/round", t.market),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(err["kind"], "not_found");

    let (status, _) = request(
        t.app.clone(),
        "GET",
        &format!("/v1/markets/{}/round?date=19-10-2026", t.market),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
