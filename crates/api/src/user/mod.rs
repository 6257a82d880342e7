mod get_device_tokens;
mod save_device_token;

use actix_web::web;
use get_device_tokens::get_device_tokens_controller;
use save_device_token::save_device_token_controller;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route(
        "/users/device-token",
        web::post().to(save_device_token_controller),
    );
    cfg.route(
        "/users/device-tokens",
        web::get().to(get_device_tokens_controller),
    );
}
