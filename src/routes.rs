use actix_web::{HttpResponse, Responder, web};
use serde_json::json;

use crate::api::interactions;

async fn index() -> impl Responder {
    HttpResponse::Ok().json(json!({"status": "ok", "service": "deskbot"}))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/")
            .route(web::get().to(index))
            .route(web::post().to(interactions::interactions)),
    );
}
