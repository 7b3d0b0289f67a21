use actix_web::{HttpResponse, Responder, web};
use chrono::Utc;

use crate::AppState;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/api/status").route(web::get().to(get_status)));
    cfg.service(web::resource("/api/connect").route(web::post().to(connect)));
    cfg.service(web::resource("/api/disconnect").route(web::post().to(disconnect)));
}

async fn get_status(state: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "state": state.ingestor.connection_state(),
        "isConnected": state.ingestor.is_connected(),
        "storage": state.config.storage_type.clone(),
        "monitoredGroups": state.groups.len(),
        "categories": state.registry.len(),
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

async fn connect(state: web::Data<AppState>) -> impl Responder {
    match state.ingestor.start().await {
        Ok(()) => HttpResponse::Ok().json(serde_json::json!({ "success": true })),
        Err(e) => {
            log::error!("[STATUS] Failed to start ingestor: {}", e);
            HttpResponse::InternalServerError()
                .json(serde_json::json!({ "success": false, "error": e }))
        }
    }
}

async fn disconnect(state: web::Data<AppState>) -> impl Responder {
    match state.ingestor.stop().await {
        Ok(()) => HttpResponse::Ok().json(serde_json::json!({ "success": true })),
        Err(e) => {
            log::error!("[STATUS] Failed to stop ingestor: {}", e);
            HttpResponse::InternalServerError()
                .json(serde_json::json!({ "success": false, "error": e }))
        }
    }
}
