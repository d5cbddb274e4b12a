//! Purchase lifecycle: create, checkout, status changes and removal.

use autoelite_core::{CarId, UserId};
use autoelite_integration_tests::{
    CATALOG_JSON, TEST_PASSWORD, TestApp, TestResponse, unique_username,
};
use autoelite_storefront::catalog::Catalog;
use autoelite_storefront::db::CartRepository;
use autoelite_storefront::services::{PurchaseError, PurchaseService};
use axum::http::StatusCode;
use serde_json::json;

async fn create_purchase(app: &mut TestApp, cars: &[&str], amount: f64) -> TestResponse {
    app.post_json("/api/purchases", &json!({"cars": cars, "amount": amount}))
        .await
}

fn purchase_id(resp: &TestResponse) -> i64 {
    resp.data()["id"].as_i64().expect("purchase id")
}

#[tokio::test]
async fn test_purchases_require_session() {
    let mut app = TestApp::offline();

    assert_eq!(
        app.get("/api/purchases").await.status,
        StatusCode::UNAUTHORIZED
    );
    assert_eq!(
        app.delete("/api/purchases/1").await.status,
        StatusCode::UNAUTHORIZED
    );
}

/// Register, log in, fill the cart, buy, and read the history back.
#[tokio::test]
#[ignore = "Requires PostgreSQL (TEST_DATABASE_URL)"]
async fn test_end_to_end_purchase() {
    let mut app = TestApp::spawn().await;
    let username = unique_username();

    let registered = app
        .post_json(
            "/api/auth/register",
            &json!({
                "username": username,
                "fullname": "Alice",
                "email": format!("{username}@example.com"),
                "password": TEST_PASSWORD,
            }),
        )
        .await;
    assert_eq!(registered.status, StatusCode::CREATED);

    let login = app
        .post_json(
            "/api/auth/login",
            &json!({"username": username, "password": TEST_PASSWORD}),
        )
        .await;
    assert_eq!(login.status, StatusCode::OK);

    let add = app.post_json("/api/cart/add", &json!({"car_id": 5})).await;
    assert_eq!(add.status, StatusCode::OK);

    let cart = app.get("/api/cart").await;
    assert_eq!(cart.data()["car_ids"], json!([5]));

    let created = create_purchase(&mut app, &["Car A"], 20200.00).await;
    assert_eq!(created.status, StatusCode::CREATED, "{:?}", created.body);

    let history = app.get("/api/purchases").await;
    assert_eq!(history.status, StatusCode::OK);
    let rows = history.data().as_array().expect("purchase list");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["cars"], json!(["Car A"]));
    assert_eq!(rows[0]["amount"], "20200.00");
    assert_eq!(rows[0]["status"], "ongoing");
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (TEST_DATABASE_URL)"]
async fn test_create_validates_input() {
    let mut app = TestApp::spawn().await;
    app.signup_and_login().await;

    let no_cars = create_purchase(&mut app, &[], 100.0).await;
    assert_eq!(no_cars.status, StatusCode::BAD_REQUEST);

    let blank_cars = create_purchase(&mut app, &["  "], 100.0).await;
    assert_eq!(blank_cars.status, StatusCode::BAD_REQUEST);

    let zero = create_purchase(&mut app, &["Car A"], 0.0).await;
    assert_eq!(zero.status, StatusCode::BAD_REQUEST);

    let negative = create_purchase(&mut app, &["Car A"], -5.0).await;
    assert_eq!(negative.status, StatusCode::BAD_REQUEST);

    let missing_amount = app
        .post_json("/api/purchases", &json!({"cars": ["Car A"]}))
        .await;
    assert_eq!(missing_amount.status, StatusCode::BAD_REQUEST);

    let history = app.get("/api/purchases").await;
    assert_eq!(history.data(), &json!([]));
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (TEST_DATABASE_URL)"]
async fn test_list_is_newest_first() {
    let mut app = TestApp::spawn().await;
    app.signup_and_login().await;

    let first = purchase_id(&create_purchase(&mut app, &["First"], 1000.0).await);
    let second = purchase_id(&create_purchase(&mut app, &["Second"], 2000.0).await);

    let history = app.get("/api/purchases").await;
    let ids: Vec<i64> = history
        .data()
        .as_array()
        .into_iter()
        .flatten()
        .filter_map(|p| p["id"].as_i64())
        .collect();
    assert_eq!(ids, vec![second, first]);
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (TEST_DATABASE_URL)"]
async fn test_checkout_prices_from_catalog_and_clears_cart() {
    let mut app = TestApp::spawn().await;
    app.signup_and_login().await;

    for car_id in [5, 6, 10] {
        app.post_json("/api/cart/add", &json!({"car_id": car_id}))
            .await;
    }

    let checkout = app
        .post_json("/api/purchases/checkout", &json!({"car_ids": [5, 6]}))
        .await;
    assert_eq!(checkout.status, StatusCode::CREATED, "{:?}", checkout.body);
    // 103300 + 24800 + 200 delivery
    assert_eq!(checkout.data()["amount"], "128300.00");
    assert_eq!(
        checkout.data()["cars"],
        json!(["Proton X50 1.5T Flagship", "Perodua Axia 1.0 G"])
    );
    assert_eq!(checkout.data()["status"], "ongoing");

    let cart = app.get("/api/cart").await;
    assert_eq!(cart.data()["car_ids"], json!([10]));
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (TEST_DATABASE_URL)"]
async fn test_checkout_requires_cars_in_cart() {
    let mut app = TestApp::spawn().await;
    app.signup_and_login().await;
    app.post_json("/api/cart/add", &json!({"car_id": 5})).await;

    let not_in_cart = app
        .post_json("/api/purchases/checkout", &json!({"car_ids": [5, 7]}))
        .await;
    assert_eq!(not_in_cart.status, StatusCode::BAD_REQUEST);

    let empty = app
        .post_json("/api/purchases/checkout", &json!({"car_ids": []}))
        .await;
    assert_eq!(empty.status, StatusCode::BAD_REQUEST);

    let unknown = app
        .post_json("/api/purchases/checkout", &json!({"car_ids": [999]}))
        .await;
    assert_eq!(unknown.status, StatusCode::NOT_FOUND);

    // Nothing was bought, nothing left the cart.
    assert_eq!(app.get("/api/purchases").await.data(), &json!([]));
    assert_eq!(app.get("/api/cart").await.data()["car_ids"], json!([5]));
}

/// Two checkouts racing for one cart entry: exactly one may buy it.
#[tokio::test]
#[ignore = "Requires PostgreSQL (TEST_DATABASE_URL)"]
async fn test_concurrent_checkouts_buy_a_cart_entry_once() {
    const ROUNDS: usize = 20;

    let mut app = TestApp::spawn().await;
    let user = app.signup_and_login().await;
    let user_id = UserId::new(i32::try_from(user.id).expect("user id fits i32"));
    let car = [CarId::new(5)];

    let catalog = Catalog::from_json(CATALOG_JSON).expect("Bundled catalog is valid");
    let cart = CartRepository::new(&app.pool);
    let first = PurchaseService::new(&app.pool, &catalog);
    let second = PurchaseService::new(&app.pool, &catalog);

    for round in 0..ROUNDS {
        cart.add(user_id, car[0]).await.expect("add to cart");

        let (a, b) = tokio::join!(first.checkout(user_id, &car), second.checkout(user_id, &car));

        let bought = usize::from(a.is_ok()) + usize::from(b.is_ok());
        assert_eq!(bought, 1, "round {round}: {a:?} / {b:?}");
        for outcome in [a, b] {
            if let Err(e) = outcome {
                assert!(matches!(e, PurchaseError::NotInCart(id) if id == car[0]), "{e:?}");
            }
        }
    }

    let history = app.get("/api/purchases").await;
    assert_eq!(history.data().as_array().map(Vec::len), Some(ROUNDS));
    assert_eq!(app.get("/api/cart").await.data()["car_ids"], json!([]));
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (TEST_DATABASE_URL)"]
async fn test_status_transitions() {
    let mut app = TestApp::spawn().await;
    app.signup_and_login().await;
    let id = purchase_id(&create_purchase(&mut app, &["Car A"], 500.0).await);
    let path = format!("/api/purchases/{id}/status");

    let invalid = app.post_json(&path, &json!({"status": "shipped"})).await;
    assert_eq!(invalid.status, StatusCode::BAD_REQUEST);

    let pending = app.post_json(&path, &json!({"status": "pending"})).await;
    assert_eq!(pending.status, StatusCode::BAD_REQUEST);

    let completed = app.post_json(&path, &json!({"status": "completed"})).await;
    assert_eq!(completed.status, StatusCode::OK);
    assert_eq!(completed.data()["status"], "completed");

    let again = app.post_json(&path, &json!({"status": "cancelled"})).await;
    assert_eq!(again.status, StatusCode::CONFLICT);
    assert_eq!(again.error_kind(), Some("Conflict"));

    let reopen = app.post_json(&path, &json!({"status": "ongoing"})).await;
    assert_eq!(reopen.status, StatusCode::CONFLICT);

    let history = app.get("/api/purchases").await;
    assert_eq!(history.data()[0]["status"], "completed");
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (TEST_DATABASE_URL)"]
async fn test_delete_only_finished_purchases() {
    let mut app = TestApp::spawn().await;
    app.signup_and_login().await;
    let id = purchase_id(&create_purchase(&mut app, &["Car A"], 500.0).await);

    let ongoing = app.delete(&format!("/api/purchases/{id}")).await;
    assert_eq!(ongoing.status, StatusCode::CONFLICT);

    let cancelled = app
        .post_json(
            &format!("/api/purchases/{id}/status"),
            &json!({"status": "cancelled"}),
        )
        .await;
    assert_eq!(cancelled.status, StatusCode::OK);

    let deleted = app.delete(&format!("/api/purchases/{id}")).await;
    assert_eq!(deleted.status, StatusCode::OK);
    assert_eq!(app.get("/api/purchases").await.data(), &json!([]));

    let gone = app.delete(&format!("/api/purchases/{id}")).await;
    assert_eq!(gone.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (TEST_DATABASE_URL)"]
async fn test_other_users_purchases_are_invisible() {
    let mut owner = TestApp::spawn().await;
    owner.signup_and_login().await;
    let id = purchase_id(&create_purchase(&mut owner, &["Car A"], 500.0).await);

    let mut other = TestApp::spawn().await;
    other.signup_and_login().await;

    let status = other
        .post_json(
            &format!("/api/purchases/{id}/status"),
            &json!({"status": "completed"}),
        )
        .await;
    assert_eq!(status.status, StatusCode::NOT_FOUND);
    assert_eq!(other.get("/api/purchases").await.data(), &json!([]));

    let history = owner.get("/api/purchases").await;
    assert_eq!(history.data()[0]["status"], "ongoing");
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (TEST_DATABASE_URL)"]
async fn test_non_numeric_purchase_id() {
    let mut app = TestApp::spawn().await;
    app.signup_and_login().await;

    let resp = app.delete("/api/purchases/latest").await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
}
