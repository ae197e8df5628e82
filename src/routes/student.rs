/// Student Routes
///
/// Registration and login are public. Profile reads and edits need the
/// student's own bearer token; deletion also accepts an admin token.

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::auth::AccessClaims;
use crate::domain::{ProfileUpdate, Role};
use crate::error::{AppError, AuthError};
use crate::routes::auth::{login_as, register_as, LoginRequest, RegisterRequest};
use crate::services::AccountService;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStudentRequest {
    pub name: Option<String>,
    pub last_name: Option<String>,
    pub username: Option<String>,
    pub class_room: Option<String>,
}

impl From<UpdateStudentRequest> for ProfileUpdate {
    fn from(form: UpdateStudentRequest) -> Self {
        ProfileUpdate {
            name: form.name,
            last_name: form.last_name,
            username: form.username,
            class_room: form.class_room,
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub current_password: Option<String>,
    pub new_password: Option<String>,
}

/// The caller must be the student the path names
fn ensure_same_student(claims: &AccessClaims, id: Uuid) -> Result<(), AppError> {
    if claims.role == Role::Student && claims.account_id()? == id {
        Ok(())
    } else {
        Err(AppError::Auth(AuthError::Forbidden))
    }
}

/// POST /student/register
pub async fn register_student(
    form: web::Json<RegisterRequest>,
    accounts: web::Data<AccountService>,
) -> Result<HttpResponse, AppError> {
    register_as(Role::Student, form.into_inner(), &accounts).await
}

/// POST /student/login
pub async fn login_student(
    form: web::Json<LoginRequest>,
    accounts: web::Data<AccountService>,
) -> Result<HttpResponse, AppError> {
    login_as(Role::Student, form.into_inner(), &accounts).await
}

/// GET /student/profile
pub async fn student_profile(
    claims: web::ReqData<AccessClaims>,
    accounts: web::Data<AccountService>,
) -> Result<HttpResponse, AppError> {
    let account = accounts
        .get_profile(claims.account_id()?, Some(Role::Student))
        .await?;

    Ok(HttpResponse::Ok().json(json!({ "student": account.view() })))
}

/// PATCH /student/{id}
///
/// Partial update of name, last name, username and class room. Absent
/// fields are left unchanged.
///
/// # Errors
/// - 400: No updatable fields, or a field fails validation
/// - 403: Token belongs to another account
/// - 404: Student no longer exists
/// - 409: Username taken by another student
pub async fn update_student(
    path: web::Path<Uuid>,
    claims: web::ReqData<AccessClaims>,
    form: web::Json<UpdateStudentRequest>,
    accounts: web::Data<AccountService>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    ensure_same_student(&claims, id)?;

    let account = accounts
        .update_profile(id, form.into_inner().into())
        .await?;

    Ok(HttpResponse::Ok().json(json!({ "student": account.view() })))
}

/// PATCH /student/{id}/password
pub async fn change_student_password(
    path: web::Path<Uuid>,
    claims: web::ReqData<AccessClaims>,
    form: web::Json<ChangePasswordRequest>,
    accounts: web::Data<AccountService>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    ensure_same_student(&claims, id)?;

    accounts
        .change_password(
            id,
            form.current_password.as_deref().unwrap_or_default(),
            form.new_password.as_deref().unwrap_or_default(),
        )
        .await?;

    Ok(HttpResponse::Ok().json(json!({ "message": "Password updated" })))
}

/// DELETE /student/{id}
///
/// Deletes the student and revokes all of its sessions.
pub async fn delete_student(
    path: web::Path<Uuid>,
    claims: web::ReqData<AccessClaims>,
    accounts: web::Data<AccountService>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    if claims.role != Role::Admin {
        ensure_same_student(&claims, id)?;
    }

    accounts.delete_profile(id).await?;

    tracing::info!(
        account_id = %id,
        deleted_by = %claims.sub,
        "Student account removed"
    );

    Ok(HttpResponse::Ok().json(json!({ "message": "Student deleted" })))
}
