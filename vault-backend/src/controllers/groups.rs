use actix_web::{HttpResponse, Responder, web};
use serde::{Deserialize, Serialize};

use crate::AppState;
use crate::groups::MonitoredGroup;

#[derive(Serialize)]
struct GroupListResponse {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    groups: Option<Vec<MonitoredGroup>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Serialize)]
struct GroupOperationResponse {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// A transport-side group annotated with its monitored state.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AvailableGroup {
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    jid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    participants: Option<usize>,
    is_monitored: bool,
}

#[derive(Deserialize)]
struct AddGroupRequest {
    name: String,
    jid: Option<String>,
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/groups")
            .route("/available", web::get().to(available_groups))
            .route("", web::get().to(list_groups))
            .route("", web::post().to(add_group))
            .route("/{name}", web::delete().to(remove_group)),
    );
}

async fn list_groups(state: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(GroupListResponse {
        success: true,
        groups: Some(state.groups.list()),
        error: None,
    })
}

async fn add_group(state: web::Data<AppState>, body: web::Json<AddGroupRequest>) -> impl Responder {
    let body = body.into_inner();
    let name = body.name.trim();
    if name.is_empty() {
        return HttpResponse::BadRequest().json(GroupOperationResponse {
            success: false,
            error: Some("Group name is required".to_string()),
        });
    }

    if state.groups.add(name, body.jid).await {
        HttpResponse::Ok().json(GroupOperationResponse {
            success: true,
            error: None,
        })
    } else {
        HttpResponse::Conflict().json(GroupOperationResponse {
            success: false,
            error: Some("Group is already monitored".to_string()),
        })
    }
}

async fn remove_group(state: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    let name = path.into_inner();
    if state.groups.remove(&name).await {
        HttpResponse::Ok().json(GroupOperationResponse {
            success: true,
            error: None,
        })
    } else {
        HttpResponse::NotFound().json(GroupOperationResponse {
            success: false,
            error: Some("Group is not monitored".to_string()),
        })
    }
}

async fn available_groups(state: web::Data<AppState>) -> impl Responder {
    match state.ingestor.list_groups().await {
        Ok(groups) => {
            let annotated: Vec<AvailableGroup> = groups
                .into_iter()
                .map(|g| {
                    let is_monitored = state.groups.is_monitored(&g.name);
                    AvailableGroup {
                        name: g.name,
                        jid: g.jid,
                        participants: g.participants,
                        is_monitored,
                    }
                })
                .collect();
            HttpResponse::Ok().json(serde_json::json!({
                "success": true,
                "groups": annotated,
            }))
        }
        Err(e) => {
            log::error!("[GROUPS] Failed to list available groups: {}", e);
            HttpResponse::InternalServerError().json(GroupOperationResponse {
                success: false,
                error: Some(e),
            })
        }
    }
}
