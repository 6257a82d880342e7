mod dispatch_reminder;
mod schedule_followers_reminder;
mod schedule_user_reminder;

use actix_web::web;
pub use dispatch_reminder::{
    DispatchReminderUseCase, DispatchReport, UseCaseError as DispatchError,
};
use schedule_followers_reminder::schedule_followers_reminder_controller;
use schedule_user_reminder::schedule_user_reminder_controller;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route(
        "/reminders/user",
        web::post().to(schedule_user_reminder_controller),
    );
    cfg.route(
        "/reminders/followers",
        web::post().to(schedule_followers_reminder_controller),
    );
}

/// `hours_before` has to be a positive amount of time
fn is_valid_hours_before(hours_before: f64) -> bool {
    hours_before.is_finite() && hours_before > 0.0
}
