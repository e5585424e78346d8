#![doc = "The `shopforge` library crate."]
#![doc = ""]
#![doc = "Domain models, persistence seams, authentication, outbound email, the password-reset"]
#![doc = "flow and the HTTP routes of the shopforge storefront backend. The binary (`main.rs`)"]
#![doc = "reads configuration, picks the storage backend and serves the routes."]

pub mod auth;
pub mod config;
pub mod email;
pub mod error;
pub mod models;
pub mod reset;
pub mod routes;
pub mod state;
pub mod store;

pub use error::AppError;
pub use state::AppState;
