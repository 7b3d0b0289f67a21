use actix_web::{HttpResponse, Responder, web};
use serde::{Deserialize, Serialize};

use crate::AppState;
use crate::categories::{CategoryDefinition, CategoryUpdate, FieldSet};

#[derive(Serialize)]
struct CategoryListResponse {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    categories: Option<Vec<CategoryDefinition>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Serialize)]
struct CategoryOperationResponse {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl CategoryOperationResponse {
    fn ok() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(message.into()),
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateCategoryRequest {
    name: String,
    description: Option<String>,
    enabled_fields: Option<FieldSet>,
    separator: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeleteCategoryQuery {
    /// Also remove the category's markdown document.
    #[serde(default)]
    delete_file: bool,
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/categories")
            .route("", web::get().to(list_categories))
            .route("", web::post().to(create_category))
            .route("/{name}", web::put().to(update_category))
            .route("/{name}", web::delete().to(delete_category))
            .route("/{name}/document", web::get().to(get_document)),
    );
    cfg.service(web::resource("/api/documents").route(web::get().to(list_documents)));
}

async fn list_categories(state: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(CategoryListResponse {
        success: true,
        categories: Some(state.registry.list()),
        error: None,
    })
}

async fn create_category(
    state: web::Data<AppState>,
    body: web::Json<CreateCategoryRequest>,
) -> impl Responder {
    let body = body.into_inner();
    let name = body.name.trim();
    if name.is_empty() {
        return HttpResponse::BadRequest()
            .json(CategoryOperationResponse::error("Category name is required"));
    }

    if state
        .registry
        .add(name, body.description, body.enabled_fields, body.separator)
        .await
    {
        HttpResponse::Ok().json(CategoryOperationResponse::ok())
    } else {
        HttpResponse::Conflict().json(CategoryOperationResponse::error("Category already exists"))
    }
}

async fn update_category(
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<CategoryUpdate>,
) -> impl Responder {
    let name = path.into_inner();
    if state.registry.update(&name, body.into_inner()).await {
        HttpResponse::Ok().json(CategoryOperationResponse::ok())
    } else {
        HttpResponse::NotFound().json(CategoryOperationResponse::error("Category not found"))
    }
}

async fn delete_category(
    state: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<DeleteCategoryQuery>,
) -> impl Responder {
    let name = path.into_inner();
    let Some(category) = state.registry.get(&name) else {
        return HttpResponse::NotFound()
            .json(CategoryOperationResponse::error("Category not found"));
    };

    if !state.registry.remove(&name).await {
        return HttpResponse::NotFound()
            .json(CategoryOperationResponse::error("Category not found"));
    }

    if query.delete_file {
        state.writer.delete_document(&category).await;
    }

    HttpResponse::Ok().json(CategoryOperationResponse::ok())
}

async fn list_documents(state: web::Data<AppState>) -> impl Responder {
    match state.storage.list_files("categories").await {
        Ok(files) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "documents": files,
        })),
        Err(e) => {
            log::error!("[CATEGORIES] Failed to list documents: {}", e);
            HttpResponse::InternalServerError()
                .json(CategoryOperationResponse::error("Failed to list documents"))
        }
    }
}

async fn get_document(state: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    let name = path.into_inner();
    let Some(category) = state.registry.get(&name) else {
        return HttpResponse::NotFound()
            .json(CategoryOperationResponse::error("Category not found"));
    };

    match state.storage.read_file(&category.markdown_path()).await {
        Ok(Some(content)) => HttpResponse::Ok()
            .content_type("text/markdown; charset=utf-8")
            .body(content),
        Ok(None) => HttpResponse::NotFound().json(CategoryOperationResponse::error(
            "No document for this category yet",
        )),
        Err(e) => {
            log::error!("[CATEGORIES] Failed to read document for {:?}: {}", name, e);
            HttpResponse::InternalServerError()
                .json(CategoryOperationResponse::error("Failed to read document"))
        }
    }
}
