use crate::{
    auth::{
        generate_token, hash_password, verify_password, AuthResponse, LoginRequest, RegisterRequest,
    },
    error::AppError,
    models::NewUser,
    state::AppState,
};
use actix_web::{post, web, HttpResponse, Responder};
use validator::Validate;

/// Register a new customer
///
/// Creates the account and returns an authentication token.
///
/// ## Responses:
/// - `201 Created`: `AuthResponse`.
/// - `400 Bad Request`: malformed JSON, or the email is already registered.
/// - `422 Unprocessable Entity`: field validation failed.
#[post("/register")]
pub async fn register(
    state: web::Data<AppState>,
    register_data: web::Json<RegisterRequest>,
) -> Result<impl Responder, AppError> {
    register_data.validate()?;

    if state
        .users
        .find_by_email(&register_data.email)
        .await?
        .is_some()
    {
        return Err(AppError::BadRequest("Email already registered".into()));
    }

    let password_hash = hash_password(&register_data.password)?;
    let register_data = register_data.into_inner();
    let user = state
        .users
        .create(NewUser {
            name: register_data.name,
            email: register_data.email,
            password_hash,
        })
        .await?;

    let token = generate_token(user.id, &state.jwt_secret)?;
    log::info!("registered user {}", user.id);

    Ok(HttpResponse::Created().json(AuthResponse {
        token,
        user_id: user.id,
    }))
}

/// Login
///
/// Authenticates a customer and returns an authentication token.
/// Unknown email and wrong password are indistinguishable (`401`).
#[post("/login")]
pub async fn login(
    state: web::Data<AppState>,
    login_data: web::Json<LoginRequest>,
) -> Result<impl Responder, AppError> {
    login_data.validate()?;

    let user = match state.users.find_by_email(&login_data.email).await? {
        Some(user) => user,
        None => return Err(AppError::Unauthorized("Invalid credentials".into())),
    };

    if !verify_password(&login_data.password, &user.password_hash)? {
        return Err(AppError::Unauthorized("Invalid credentials".into()));
    }

    let token = generate_token(user.id, &state.jwt_secret)?;
    Ok(HttpResponse::Ok().json(AuthResponse {
        token,
        user_id: user.id,
    }))
}
