use mero_gamala_api::{
    config::AppConfig,
    dto::plants::LowStockQuery,
    error::AppError,
    middleware::auth::{ADMIN_ROLE, AdminUser},
    models::CustomerDetails,
    routes::params::Pagination,
    services::admin_service,
    state::AppState,
};
use std::time::Duration;

use uuid::Uuid;

fn customer() -> CustomerDetails {
    CustomerDetails {
        full_name: "Maya Gurung".into(),
        delivery_address: "Jhamsikhel, Lalitpur".into(),
        phone_number: "+977 9812345678".into(),
    }
}

fn admin() -> AdminUser {
    AdminUser {
        username: "admin".into(),
        role: ADMIN_ROLE.into(),
    }
}

async fn stock_of(state: &AppState, id: &str) -> anyhow::Result<i64> {
    let plant = state.api.get_plant_by_id(id).await?;
    Ok(plant.map(|p| p.stock).unwrap_or_default())
}

// Cart -> checkout -> stock decrement -> admin sees low stock.
#[tokio::test]
async fn checkout_decrements_stock_and_surfaces_low_stock() -> anyhow::Result<()> {
    let state = AppState::build(AppConfig::local()).await?;
    let session = Uuid::new_v4();

    let fiddle_before = stock_of(&state, "4").await?;
    state.carts.add_plant(session, "4", None).await?;
    state.carts.add_plant(session, "4", None).await?;
    let cart = state.carts.add_plant(session, "5", Some(10.0)).await?;
    assert_eq!(cart.total_items(), 3);

    let order_number = state
        .carts
        .checkout(session, &state.orders, customer(), "cash_on_delivery")
        .await?;
    assert!(order_number.starts_with("MG"));
    assert_eq!(order_number.len(), 11);
    assert!(state.carts.cart(session).await.is_empty());

    let order = state
        .orders
        .get_order_by_number(&order_number)
        .await
        .expect("order cached after checkout");
    let expected: f64 = order.items.iter().map(|i| i.price * i.quantity as f64).sum();
    assert!((order.total - expected).abs() < 0.01);
    assert!(order.whatsapp_sent);

    assert_eq!(stock_of(&state, "4").await?, fiddle_before - 2);

    let low = admin_service::list_low_stock(
        &state,
        &admin(),
        LowStockQuery {
            pagination: Pagination::default(),
            threshold: Some(fiddle_before - 2),
        },
    )
    .await?;
    let low = low.data.expect("low stock data").items;
    assert!(low.iter().any(|plant| plant.id == "4"));
    Ok(())
}

#[tokio::test]
async fn orders_beyond_stock_are_rejected_and_stock_is_untouched() -> anyhow::Result<()> {
    let state = AppState::build(AppConfig::local()).await?;
    let session = Uuid::new_v4();

    let available = stock_of(&state, "4").await?;
    state.carts.add_plant(session, "4", None).await?;
    state
        .carts
        .update_quantity(session, "4", available + 1)
        .await?;

    let err = state
        .carts
        .checkout(session, &state.orders, customer(), "cod")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(msg) if msg.starts_with("Insufficient stock")));

    assert_eq!(stock_of(&state, "4").await?, available);
    assert!(!state.carts.cart(session).await.is_empty());
    Ok(())
}

#[tokio::test]
async fn empty_cart_cannot_check_out() -> anyhow::Result<()> {
    let state = AppState::build(AppConfig::local()).await?;
    let err = state
        .carts
        .checkout(Uuid::new_v4(), &state.orders, customer(), "cod")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));
    Ok(())
}

#[tokio::test]
async fn separate_customers_can_check_out_at_the_same_time() -> anyhow::Result<()> {
    let mut config = AppConfig::local();
    config.whatsapp.delay = Duration::from_millis(200);
    let state = AppState::build(config).await?;

    let (first, second) = (Uuid::new_v4(), Uuid::new_v4());
    state.carts.add_plant(first, "1", None).await?;
    state.carts.add_plant(second, "6", None).await?;

    let (placed_first, placed_second) = tokio::join!(
        state.carts.checkout(first, &state.orders, customer(), "cod"),
        state.carts.checkout(second, &state.orders, customer(), "esewa"),
    );
    assert!(placed_first?.starts_with("MG"));
    assert!(placed_second?.starts_with("MG"));
    assert!(state.carts.cart(first).await.is_empty());
    assert!(state.carts.cart(second).await.is_empty());
    Ok(())
}

#[tokio::test]
async fn one_customer_cannot_submit_twice_at_once() -> anyhow::Result<()> {
    let mut config = AppConfig::local();
    config.whatsapp.delay = Duration::from_millis(200);
    let state = AppState::build(config).await?;

    let session = Uuid::new_v4();
    state.carts.add_plant(session, "1", None).await?;

    let (first, second) = tokio::join!(
        state.carts.checkout(session, &state.orders, customer(), "cod"),
        state.carts.checkout(session, &state.orders, customer(), "cod"),
    );
    assert!(first.is_ok());
    assert!(matches!(second, Err(AppError::Conflict(_))));
    Ok(())
}
