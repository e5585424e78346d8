pub mod auth;
pub mod contact;
pub mod health;
pub mod orders;
pub mod products;
pub mod reset;

use actix_web::{error::JsonPayloadError, web, HttpRequest};

use crate::auth::AuthMiddleware;
use crate::error::AppError;

/// Malformed or incomplete JSON bodies get the same `{ "error": ... }` shape as
/// every other failure.
fn json_error(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    AppError::BadRequest(format!("Invalid JSON body: {}", err)).into()
}

/// Registers every `/api` route. Only `/orders` requires a bearer token.
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(json_error))
        .service(
            web::scope("/auth")
                .service(auth::login)
                .service(auth::register),
        )
        .service(
            web::scope("/products")
                .service(products::list_products)
                .service(products::get_product),
        )
        .service(
            web::scope("/orders")
                .wrap(AuthMiddleware)
                .service(orders::list_orders)
                .service(orders::place_order),
        )
        .service(
            web::scope("/reset")
                .service(reset::request_reset)
                .service(reset::confirm_reset),
        )
        .service(contact::submit_contact);
}
