use actix_web::dev::Server;
use actix_web::{middleware::Logger, web, App, HttpServer};
use std::net::TcpListener;

use crate::auth::{PasswordHasher, TokenIssuer};
use crate::configuration::Settings;
use crate::domain::Role;
use crate::error::{AppError, ValidationError};
use crate::logger::LoggerMiddleware;
use crate::middleware::JwtMiddleware;
use crate::routes::{
    admin_profile, change_student_password, create_booking, deactivate_account, delete_student,
    health_check, list_bookings, login_admin, login_student, login_teacher, logout,
    reactivate_account, refresh, register_admin, register_student, register_teacher,
    student_borrowed, student_profile, teacher_borrowed, teacher_profile, update_student,
};
use crate::security::{cors, SecurityHeaders};
use crate::services::{AccountService, BookingService, LoginPolicy};
use crate::store::Stores;

pub fn run(
    listener: TcpListener,
    stores: Stores,
    settings: Settings,
) -> Result<Server, std::io::Error> {
    let tokens = TokenIssuer::new(settings.jwt.clone());

    let accounts = web::Data::new(AccountService::new(
        stores.accounts.clone(),
        stores.sessions.clone(),
        tokens.clone(),
        PasswordHasher::new(settings.auth.bcrypt_cost),
        LoginPolicy {
            reject_deactivated: settings.auth.reject_deactivated_login,
        },
    ));
    let bookings = web::Data::new(BookingService::new(
        stores.accounts.clone(),
        stores.bookings.clone(),
    ));

    // Malformed or mistyped bodies are client errors with the usual error shape
    let json_config = web::JsonConfig::default().error_handler(|err, _req| {
        AppError::Validation(ValidationError::Malformed(err.to_string())).into()
    });

    // Unparseable path segments (e.g. a non-UUID id) get the same treatment
    let path_config = web::PathConfig::default().error_handler(|err, _req| {
        AppError::Validation(ValidationError::Malformed(format!("path: {}", err))).into()
    });

    let cors_origins = settings.application.cors_allowed_origins.clone();

    let server = HttpServer::new(move || {
        let any_account = JwtMiddleware::new(tokens.clone());
        let admin_only = any_account.clone().allow(Role::Admin);
        let student_only = any_account.clone().allow(Role::Student);
        let teacher_only = any_account.clone().allow(Role::Teacher);

        App::new()
            // Global middleware
            .wrap(cors(&cors_origins))
            .wrap(SecurityHeaders::middleware())
            .wrap(Logger::default())      // Standard logging
            .wrap(LoggerMiddleware)       // Custom logging

            // Shared state
            .app_data(json_config.clone())
            .app_data(path_config.clone())
            .app_data(accounts.clone())
            .app_data(bookings.clone())

            .route("/health_check", web::get().to(health_check))

            // Admin
            .route("/admin/register", web::post().to(register_admin))
            .route("/admin/login", web::post().to(login_admin))
            .service(
                web::resource("/admin/profile/{id}")
                    .wrap(admin_only.clone())
                    .route(web::get().to(admin_profile)),
            )
            .service(
                web::resource("/admin/deactivate/{role}/{username}")
                    .wrap(admin_only.clone())
                    .route(web::patch().to(deactivate_account)),
            )
            .service(
                web::resource("/admin/reactivate/{role}/{username}")
                    .wrap(admin_only)
                    .route(web::patch().to(reactivate_account)),
            )

            // Student. Fixed paths are registered before `/student/{id}`.
            .route("/student/register", web::post().to(register_student))
            .route("/student/login", web::post().to(login_student))
            .service(
                web::resource("/student/profile")
                    .wrap(student_only.clone())
                    .route(web::get().to(student_profile)),
            )
            .route("/student/borrowed/{email}", web::get().to(student_borrowed))
            .service(
                web::resource("/student/{id}/password")
                    .wrap(student_only.clone())
                    .route(web::patch().to(change_student_password)),
            )
            .service(
                web::resource("/student/{id}")
                    .wrap(student_only.allow(Role::Admin))
                    .route(web::patch().to(update_student))
                    .route(web::delete().to(delete_student)),
            )

            // Teacher
            .route("/teacher/register", web::post().to(register_teacher))
            .route("/teacher/login", web::post().to(login_teacher))
            .service(
                web::resource("/teacher/profile")
                    .wrap(teacher_only)
                    .route(web::get().to(teacher_profile)),
            )
            .route("/teacher/borrowed/{email}", web::get().to(teacher_borrowed))

            // Sessions
            .route("/auth/refresh", web::post().to(refresh))
            .route("/auth/logout", web::post().to(logout))

            // Bookings
            .route("/booking", web::post().to(create_booking))
            .route("/bookings", web::get().to(list_bookings))
    })
    .listen(listener)?
    .run();

    Ok(server)
}
