use crate::{
    auth::AuthenticatedUserId,
    error::AppError,
    models::{NewOrder, OrderInput, OrderItem},
    state::AppState,
};
use actix_web::{get, post, web, HttpResponse, Responder};
use validator::Validate;

/// Places an order for the authenticated customer.
///
/// Each line is priced from the current catalogue; the order total is the sum of
/// `unit_price_cents * quantity`.
///
/// ## Responses:
/// - `201 Created`: the stored `Order`, status `pending`.
/// - `401 Unauthorized`: missing or invalid bearer token.
/// - `404 Not Found`: a `product_id` is not in the catalogue.
/// - `422 Unprocessable Entity`: no items, quantity outside 1..=100, or a short address.
#[post("")]
pub async fn place_order(
    state: web::Data<AppState>,
    user_id: AuthenticatedUserId,
    order_data: web::Json<OrderInput>,
) -> Result<impl Responder, AppError> {
    order_data.validate()?;
    for item in &order_data.items {
        item.validate()?;
    }

    let mut items = Vec::with_capacity(order_data.items.len());
    for item in &order_data.items {
        let product = state
            .products
            .get(item.product_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Product {} not found", item.product_id)))?;
        items.push(OrderItem::from_product(&product, item.quantity));
    }

    let order = state
        .orders
        .create(NewOrder {
            user_id: user_id.0,
            items,
            shipping_address: order_data.shipping_address.trim().to_string(),
        })
        .await?;

    log::info!(
        "order {} placed by {} for {} cents",
        order.id,
        order.user_id,
        order.total_cents
    );
    Ok(HttpResponse::Created().json(order))
}

/// Lists the authenticated customer's orders, newest first.
#[get("")]
pub async fn list_orders(
    state: web::Data<AppState>,
    user_id: AuthenticatedUserId,
) -> Result<impl Responder, AppError> {
    let orders = state.orders.list_for_user(user_id.0).await?;
    Ok(HttpResponse::Ok().json(orders))
}
