use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode, header},
};
use mero_gamala_api::{
    config::AppConfig, routes::create_app, services::admin_service::hash_password, state::AppState,
};
use serde_json::{Value, json};
use tower::ServiceExt;
use uuid::Uuid;

const ADMIN_PASSWORD: &str = "gamala-admin-pass";

async fn app() -> anyhow::Result<Router> {
    let mut config = AppConfig::local();
    config.admin.password_hash = Some(hash_password(ADMIN_PASSWORD)?);
    let state = AppState::build(config).await?;
    Ok(create_app(state))
}

fn request(method: Method, uri: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder().method(method).uri(uri);
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    }
    .expect("valid request")
}

fn with_header(mut req: Request<Body>, name: &'static str, value: &str) -> Request<Body> {
    req.headers_mut()
        .insert(name, value.parse().expect("valid header value"));
    req
}

async fn send(app: &Router, req: Request<Body>) -> anyhow::Result<(StatusCode, Value)> {
    let response = app.clone().oneshot(req).await?;
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await?;
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)?
    };
    Ok((status, body))
}

#[tokio::test]
async fn health_and_unknown_routes() -> anyhow::Result<()> {
    let app = app().await?;

    let (status, body) = send(&app, request(Method::GET, "/health", None)).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "ok");

    let (status, body) = send(&app, request(Method::GET, "/api/does-not-exist", None)).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["data"]["path"], "/api/does-not-exist");
    Ok(())
}

#[tokio::test]
async fn catalogue_is_browsable() -> anyhow::Result<()> {
    let app = app().await?;

    let (status, body) = send(&app, request(Method::GET, "/api/plants?category=succulent", None)).await?;
    assert_eq!(status, StatusCode::OK);
    let items = body["data"]["items"].as_array().cloned().unwrap_or_default();
    assert!(!items.is_empty());
    assert!(items.iter().all(|p| p["category"] == "succulent"));

    let (status, body) = send(&app, request(Method::GET, "/api/plants?page=1&per_page=2", None)).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["items"].as_array().map(Vec::len), Some(2));
    assert_eq!(body["meta"]["per_page"], 2);

    let (status, _) = send(&app, request(Method::GET, "/api/plants/999", None)).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(&app, request(Method::GET, "/api/care-guides", None)).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["items"].as_array().map(Vec::len), Some(2));
    Ok(())
}

#[tokio::test]
async fn catalogue_search_sort_and_far_pages() -> anyhow::Result<()> {
    let app = app().await?;

    let (status, body) = send(&app, request(Method::GET, "/api/plants?q=vine", None)).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["items"][0]["name"], "Pothos");
    assert_eq!(body["meta"]["total"], 1);

    let (status, body) = send(&app, request(Method::GET, "/api/plants?sort_by=price-low", None)).await?;
    assert_eq!(status, StatusCode::OK);
    let prices: Vec<f64> = body["data"]["items"]
        .as_array()
        .cloned()
        .unwrap_or_default()
        .iter()
        .filter_map(|p| p["price"].as_f64())
        .collect();
    assert!(prices.len() > 1);
    assert!(prices.windows(2).all(|w| w[0] <= w[1]));

    let (status, body) = send(
        &app,
        request(Method::GET, "/api/plants?page=9223372036854775807&per_page=100", None),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["items"].as_array().map(Vec::len), Some(0));
    Ok(())
}

#[tokio::test]
async fn cart_checkout_and_tracking() -> anyhow::Result<()> {
    let app = app().await?;
    let session = Uuid::new_v4().to_string();

    let (status, _) = send(
        &app,
        request(Method::POST, "/api/cart", Some(json!({ "plant_id": "2" }))),
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST, "session header is required");

    let add = request(Method::POST, "/api/cart", Some(json!({ "plant_id": "2" })));
    let (status, body) = send(&app, with_header(add, "x-cart-session", &session)).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total_items"], 1);

    let bump = request(Method::PATCH, "/api/cart/2", Some(json!({ "quantity": 3 })));
    let (status, body) = send(&app, with_header(bump, "x-cart-session", &session)).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total_items"], 3);

    let too_many = request(Method::PATCH, "/api/cart/2", Some(json!({ "quantity": 100 })));
    let (status, _) = send(&app, with_header(too_many, "x-cart-session", &session)).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let bad_phone = request(
        Method::POST,
        "/api/cart/checkout",
        Some(json!({
            "customer": {
                "full_name": "Maya Gurung",
                "delivery_address": "Thamel, Kathmandu",
                "phone_number": "12345"
            },
            "payment_method": "cod"
        })),
    );
    let (status, _) = send(&app, with_header(bad_phone, "x-cart-session", &session)).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let checkout = request(
        Method::POST,
        "/api/cart/checkout",
        Some(json!({
            "customer": {
                "full_name": "Maya Gurung",
                "delivery_address": "Thamel, Kathmandu",
                "phone_number": "9841234567"
            },
            "payment_method": "cod"
        })),
    );
    let (status, body) = send(&app, with_header(checkout, "x-cart-session", &session)).await?;
    assert_eq!(status, StatusCode::OK);
    let order_number = body["data"]["order_number"].as_str().unwrap_or_default().to_string();
    assert!(order_number.starts_with("MG"));

    let (status, body) = send(
        &app,
        request(Method::GET, &format!("/api/orders/number/{order_number}"), None),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "pending");
    assert_eq!(body["data"]["items"][0]["quantity"], 3);

    let view = request(Method::GET, "/api/cart", None);
    let (_, body) = send(&app, with_header(view, "x-cart-session", &session)).await?;
    assert_eq!(body["data"]["total_items"], 0);
    Ok(())
}

#[tokio::test]
async fn language_preference_round_trip() -> anyhow::Result<()> {
    let app = app().await?;

    let (_, body) = send(&app, request(Method::GET, "/api/preferences", None)).await?;
    assert_eq!(body["data"]["show_language_modal"], true);

    let (status, body) = send(
        &app,
        request(Method::PUT, "/api/preferences", Some(json!({ "language": "ne" }))),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["source"], "database");

    let (_, body) = send(&app, request(Method::GET, "/api/preferences", None)).await?;
    assert_eq!(body["data"]["language"], "ne");
    assert_eq!(body["data"]["show_language_modal"], false);
    Ok(())
}

#[tokio::test]
async fn admin_routes_require_a_live_session() -> anyhow::Result<()> {
    let app = app().await?;

    let (status, _) = send(&app, request(Method::GET, "/api/admin/orders", None)).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send(
        &app,
        request(
            Method::POST,
            "/api/admin/login",
            Some(json!({
                "username": "admin",
                "password": ADMIN_PASSWORD,
                "two_factor_code": "246810"
            })),
        ),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    let bearer = format!("Bearer {}", body["data"]["token"].as_str().unwrap_or_default());

    let orders = request(Method::GET, "/api/admin/orders?status=pending", None);
    let (status, _) = send(&app, with_header(orders, "authorization", &bearer)).await?;
    assert_eq!(status, StatusCode::OK);

    let create = request(
        Method::POST,
        "/api/admin/plants",
        Some(json!({
            "name": "ZZ Plant",
            "name_ne": "जेड जेड बिरुवा",
            "price": 29.5,
            "image": "https://images.unsplash.com/photo-1632207691143-643e2a9a9361",
            "category": "indoor",
            "rating": 4.4,
            "stock": 2
        })),
    );
    let (status, body) = send(&app, with_header(create, "authorization", &bearer)).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "ZZ Plant");

    let logs = request(Method::GET, "/api/admin/audit-logs", None);
    let (status, body) = send(&app, with_header(logs, "authorization", &bearer)).await?;
    assert_eq!(status, StatusCode::OK);
    let actions: Vec<&str> = body["data"]["items"]
        .as_array()
        .map(|items| items.iter().filter_map(|log| log["action"].as_str()).collect())
        .unwrap_or_default();
    assert!(actions.contains(&"plant_create"));

    let logout = request(Method::POST, "/api/admin/logout", None);
    let (status, _) = send(&app, with_header(logout, "authorization", &bearer)).await?;
    assert_eq!(status, StatusCode::OK);

    let after = request(Method::GET, "/api/admin/orders", None);
    let (status, _) = send(&app, with_header(after, "authorization", &bearer)).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    Ok(())
}
