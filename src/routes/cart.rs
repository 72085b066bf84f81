use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, patch, post},
};

use crate::{
    dto::{
        cart::{AddToCartRequest, CartView, CheckoutRequest, UpdateQuantityRequest},
        orders::OrderPlaced,
    },
    error::AppResult,
    middleware::session::CartSession,
    response::{ApiResponse, Meta},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(view_cart).post(add_to_cart).delete(clear_cart))
        .route("/checkout", post(checkout))
        .route("/{id}", patch(update_quantity).delete(remove_from_cart))
}

fn cart_response(message: &str, view: CartView) -> Json<ApiResponse<CartView>> {
    let meta = Meta::whole(view.items.len());
    Json(ApiResponse::success(message, view, Some(meta)))
}

#[utoipa::path(
    get,
    path = "/api/cart",
    params(("x-cart-session" = String, Header, description = "Cart session UUID")),
    responses(
        (status = 200, description = "Cart contents and totals", body = ApiResponse<CartView>),
        (status = 400, description = "Missing or invalid session header"),
    ),
    tag = "Cart"
)]
pub async fn view_cart(
    State(state): State<AppState>,
    CartSession(session): CartSession,
) -> AppResult<Json<ApiResponse<CartView>>> {
    let cart = state.carts.cart(session).await;
    Ok(cart_response("OK", CartView::from(&cart)))
}

#[utoipa::path(
    post,
    path = "/api/cart",
    params(("x-cart-session" = String, Header, description = "Cart session UUID")),
    request_body = AddToCartRequest,
    responses(
        (status = 200, description = "Adds one unit of the plant", body = ApiResponse<CartView>),
        (status = 400, description = "Cart limits exceeded or plant out of stock"),
        (status = 404, description = "Plant not found"),
    ),
    tag = "Cart"
)]
pub async fn add_to_cart(
    State(state): State<AppState>,
    CartSession(session): CartSession,
    Json(payload): Json<AddToCartRequest>,
) -> AppResult<Json<ApiResponse<CartView>>> {
    let cart = state
        .carts
        .add_plant(session, &payload.plant_id, payload.discount_percentage)
        .await?;
    Ok(cart_response("Added to cart", CartView::from(&cart)))
}

#[utoipa::path(
    patch,
    path = "/api/cart/{id}",
    params(
        ("x-cart-session" = String, Header, description = "Cart session UUID"),
        ("id" = String, Path, description = "Plant ID of the cart line")
    ),
    request_body = UpdateQuantityRequest,
    responses(
        (status = 200, description = "Quantity set; zero removes the line", body = ApiResponse<CartView>),
        (status = 400, description = "Invalid quantity"),
        (status = 404, description = "Item not in cart"),
    ),
    tag = "Cart"
)]
pub async fn update_quantity(
    State(state): State<AppState>,
    CartSession(session): CartSession,
    Path(id): Path<String>,
    Json(payload): Json<UpdateQuantityRequest>,
) -> AppResult<Json<ApiResponse<CartView>>> {
    let cart = state
        .carts
        .update_quantity(session, &id, payload.quantity)
        .await?;
    Ok(cart_response("Cart updated", CartView::from(&cart)))
}

#[utoipa::path(
    delete,
    path = "/api/cart/{id}",
    params(
        ("x-cart-session" = String, Header, description = "Cart session UUID"),
        ("id" = String, Path, description = "Plant ID of the cart line")
    ),
    responses(
        (status = 200, description = "Line removed", body = ApiResponse<CartView>),
        (status = 404, description = "Item not in cart"),
    ),
    tag = "Cart"
)]
pub async fn remove_from_cart(
    State(state): State<AppState>,
    CartSession(session): CartSession,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<CartView>>> {
    let cart = state.carts.remove_item(session, &id).await?;
    Ok(cart_response("Removed from cart", CartView::from(&cart)))
}

#[utoipa::path(
    delete,
    path = "/api/cart",
    params(("x-cart-session" = String, Header, description = "Cart session UUID")),
    responses((status = 200, description = "Cart emptied", body = ApiResponse<CartView>)),
    tag = "Cart"
)]
pub async fn clear_cart(
    State(state): State<AppState>,
    CartSession(session): CartSession,
) -> AppResult<Json<ApiResponse<CartView>>> {
    let cart = state.carts.clear(session).await?;
    Ok(cart_response("Cart cleared", CartView::from(&cart)))
}

#[utoipa::path(
    post,
    path = "/api/cart/checkout",
    params(("x-cart-session" = String, Header, description = "Cart session UUID")),
    request_body = CheckoutRequest,
    responses(
        (status = 200, description = "Order placed from the cart", body = ApiResponse<OrderPlaced>),
        (status = 400, description = "Empty cart or invalid details"),
        (status = 409, description = "Another order is being processed"),
    ),
    tag = "Cart"
)]
pub async fn checkout(
    State(state): State<AppState>,
    CartSession(session): CartSession,
    Json(payload): Json<CheckoutRequest>,
) -> AppResult<Json<ApiResponse<OrderPlaced>>> {
    let order_number = state
        .carts
        .checkout(session, &state.orders, payload.customer, &payload.payment_method)
        .await?;
    let order = state.orders.get_order_by_number(&order_number).await;

    Ok(Json(ApiResponse::success(
        "Order placed",
        OrderPlaced { order_number, order },
        Some(Meta::empty()),
    )))
}
