use actix_web::{web, HttpRequest, HttpResponse, Result, ResponseError};
use crate::handlers::tenant_from_request;
use crate::models::*;
use crate::services::ReportService;

#[utoipa::path(
    get,
    path = "/transactions",
    tag = "transaction",
    params(
        ("q" = Option<String>, Query, description = "会员手机号 / 姓名 / 4 位尾号"),
        ("start_date" = Option<String>, Query, description = "开始日期 YYYY-MM-DD"),
        ("end_date" = Option<String>, Query, description = "结束日期 YYYY-MM-DD（含当天）"),
        ("page" = Option<u32>, Query, description = "页码"),
        ("per_page" = Option<u32>, Query, description = "每页数量")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "流水列表", body = TransactionListResponse),
        (status = 400, description = "日期范围无效"),
        (status = 401, description = "未授权")
    )
)]
pub async fn list_transactions(
    report_service: web::Data<ReportService>,
    req: HttpRequest,
    query: web::Query<TransactionListQuery>,
) -> Result<HttpResponse> {
    let tenant = match tenant_from_request(&req) {
        Ok(t) => t,
        Err(e) => return Ok(e.error_response()),
    };

    match report_service.list_transactions(&tenant, &query).await {
        Ok(response) => Ok(HttpResponse::Ok().json(ApiResponse::success(response))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/transactions/{id}/signature",
    tag = "transaction",
    params(
        ("id" = i64, Path, description = "流水ID")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "签字图片", content_type = "image/png"),
        (status = 404, description = "流水不存在或无签字")
    )
)]
pub async fn get_signature(
    report_service: web::Data<ReportService>,
    req: HttpRequest,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    let tenant = match tenant_from_request(&req) {
        Ok(t) => t,
        Err(e) => return Ok(e.error_response()),
    };

    match report_service.signature_png(&tenant, path.into_inner()).await {
        Ok(png) => Ok(HttpResponse::Ok().content_type("image/png").body(png)),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn transaction_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/transactions")
            .route("", web::get().to(list_transactions))
            .route("/{id}/signature", web::get().to(get_signature)),
    );
}
