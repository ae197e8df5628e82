mod admin;
mod auth;
mod booking;
mod health_check;
mod student;
mod teacher;

pub use admin::{
    admin_profile, deactivate_account, login_admin, reactivate_account, register_admin,
};
pub use auth::{logout, refresh};
pub use booking::{create_booking, list_bookings, student_borrowed, teacher_borrowed};
pub use health_check::health_check;
pub use student::{
    change_student_password, delete_student, login_student, register_student, student_profile,
    update_student,
};
pub use teacher::{login_teacher, register_teacher, teacher_profile};
