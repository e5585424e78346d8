use crate::{error::AppError, models::ProductQuery, state::AppState};
use actix_web::{get, web, HttpResponse, Responder};
use uuid::Uuid;

/// Lists the catalogue.
///
/// ## Query Parameters:
/// - `search` (optional): case-insensitive match on name or description.
/// - `category` (optional): exact category, case-insensitive.
#[get("")]
pub async fn list_products(
    state: web::Data<AppState>,
    query: web::Query<ProductQuery>,
) -> Result<impl Responder, AppError> {
    let products = state.products.list(&query).await?;
    Ok(HttpResponse::Ok().json(products))
}

#[get("/{id}")]
pub async fn get_product(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    let id = path.into_inner();
    match state.products.get(id).await? {
        Some(product) => Ok(HttpResponse::Ok().json(product)),
        None => Err(AppError::NotFound(format!("Product {} not found", id))),
    }
}
