/// Admin Routes
///
/// Registration, login and profile for admins, and the activation switches
/// admins use on student and teacher accounts. Everything except register
/// and login sits behind an admin bearer token.

use actix_web::{web, HttpResponse};
use serde_json::json;
use uuid::Uuid;

use crate::domain::Role;
use crate::error::AppError;
use crate::routes::auth::{login_as, register_as, LoginRequest, RegisterRequest};
use crate::services::AccountService;

/// POST /admin/register
pub async fn register_admin(
    form: web::Json<RegisterRequest>,
    accounts: web::Data<AccountService>,
) -> Result<HttpResponse, AppError> {
    register_as(Role::Admin, form.into_inner(), &accounts).await
}

/// POST /admin/login
pub async fn login_admin(
    form: web::Json<LoginRequest>,
    accounts: web::Data<AccountService>,
) -> Result<HttpResponse, AppError> {
    login_as(Role::Admin, form.into_inner(), &accounts).await
}

/// GET /admin/profile/{id}
pub async fn admin_profile(
    path: web::Path<Uuid>,
    accounts: web::Data<AccountService>,
) -> Result<HttpResponse, AppError> {
    let account = accounts
        .get_profile(path.into_inner(), Some(Role::Admin))
        .await?;

    Ok(HttpResponse::Ok().json(json!({ "admin": account.view() })))
}

/// Only students and teachers can be (de)activated
fn managed_role(segment: &str) -> Result<Role, AppError> {
    match segment.parse::<Role>() {
        Ok(role @ (Role::Student | Role::Teacher)) => Ok(role),
        _ => Err(AppError::not_found(format!("account type '{}'", segment))),
    }
}

async fn set_activation(
    path: web::Path<(String, String)>,
    accounts: web::Data<AccountService>,
    active: bool,
) -> Result<HttpResponse, AppError> {
    let (role, username) = path.into_inner();
    let role = managed_role(&role)?;

    let account = accounts.set_activation(role, &username, active).await?;
    let message = format!(
        "{} {}",
        role.title(),
        if active { "reactivated" } else { "deactivated" }
    );

    Ok(HttpResponse::Ok().json(json!({
        "message": message,
        role.as_str(): account.view(),
    })))
}

/// PATCH /admin/deactivate/{role}/{username}
///
/// # Errors
/// - 401: Missing or invalid access token
/// - 403: Token does not belong to an admin
/// - 404: No student/teacher with that username
pub async fn deactivate_account(
    path: web::Path<(String, String)>,
    accounts: web::Data<AccountService>,
) -> Result<HttpResponse, AppError> {
    set_activation(path, accounts, false).await
}

/// PATCH /admin/reactivate/{role}/{username}
pub async fn reactivate_account(
    path: web::Path<(String, String)>,
    accounts: web::Data<AccountService>,
) -> Result<HttpResponse, AppError> {
    set_activation(path, accounts, true).await
}
