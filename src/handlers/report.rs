use actix_web::{web, HttpRequest, HttpResponse, Result, ResponseError};
use crate::handlers::tenant_from_request;
use crate::models::*;
use crate::services::ReportService;

#[utoipa::path(
    get,
    path = "/reports/weekly",
    tag = "report",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "最近 7 天按日按类型合计", body = WeeklyReportResponse),
        (status = 401, description = "未授权")
    )
)]
pub async fn weekly_report(
    report_service: web::Data<ReportService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let tenant = match tenant_from_request(&req) {
        Ok(t) => t,
        Err(e) => return Ok(e.error_response()),
    };

    match report_service.weekly_report(&tenant).await {
        Ok(response) => Ok(HttpResponse::Ok().json(ApiResponse::success(response))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn report_config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::scope("/reports").route("/weekly", web::get().to(weekly_report)));
}
