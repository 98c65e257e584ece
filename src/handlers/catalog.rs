use actix_web::{web, HttpResponse, Result};
use crate::models::*;
use crate::services::CatalogService;

#[utoipa::path(
    get,
    path = "/catalog",
    tag = "catalog",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "服务项目与折扣档位", body = CatalogResponse),
        (status = 401, description = "未授权")
    )
)]
pub async fn get_catalog(catalog_service: web::Data<CatalogService>) -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(ApiResponse::success(catalog_service.catalog())))
}

pub fn catalog_config(cfg: &mut web::ServiceConfig) {
    cfg.route("/catalog", web::get().to(get_catalog));
}
