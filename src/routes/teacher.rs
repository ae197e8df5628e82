use actix_web::{web, HttpResponse};
use serde_json::json;

use crate::auth::AccessClaims;
use crate::domain::Role;
use crate::error::AppError;
use crate::routes::auth::{login_as, register_as, LoginRequest, RegisterRequest};
use crate::services::AccountService;

/// POST /teacher/register
pub async fn register_teacher(
    form: web::Json<RegisterRequest>,
    accounts: web::Data<AccountService>,
) -> Result<HttpResponse, AppError> {
    register_as(Role::Teacher, form.into_inner(), &accounts).await
}

/// POST /teacher/login
pub async fn login_teacher(
    form: web::Json<LoginRequest>,
    accounts: web::Data<AccountService>,
) -> Result<HttpResponse, AppError> {
    login_as(Role::Teacher, form.into_inner(), &accounts).await
}

/// GET /teacher/profile
pub async fn teacher_profile(
    claims: web::ReqData<AccessClaims>,
    accounts: web::Data<AccountService>,
) -> Result<HttpResponse, AppError> {
    let account = accounts
        .get_profile(claims.account_id()?, Some(Role::Teacher))
        .await?;

    Ok(HttpResponse::Ok().json(json!({ "teacher": account.view() })))
}
