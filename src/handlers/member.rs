use actix_web::{web, HttpRequest, HttpResponse, Result, ResponseError};
use crate::handlers::tenant_from_request;
use crate::models::*;
use crate::services::{LedgerService, MemberService};

#[utoipa::path(
    get,
    path = "/members",
    tag = "member",
    params(
        ("q" = String, Query, description = "手机号 / 姓名 / 4 位手机尾号")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "查找结果", body = MemberSearchResponse),
        (status = 400, description = "查询条件为空"),
        (status = 401, description = "未授权")
    )
)]
pub async fn search_members(
    member_service: web::Data<MemberService>,
    req: HttpRequest,
    query: web::Query<MemberSearchQuery>,
) -> Result<HttpResponse> {
    let tenant = match tenant_from_request(&req) {
        Ok(t) => t,
        Err(e) => return Ok(e.error_response()),
    };

    match member_service.search(&tenant, &query.q).await {
        Ok(response) => Ok(HttpResponse::Ok().json(ApiResponse::success(response))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/members",
    tag = "member",
    request_body = CreateMemberRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "开卡成功", body = MemberResponse),
        (status = 400, description = "请求参数错误"),
        (status = 409, description = "手机号已存在")
    )
)]
pub async fn create_member(
    member_service: web::Data<MemberService>,
    req: HttpRequest,
    request: web::Json<CreateMemberRequest>,
) -> Result<HttpResponse> {
    let tenant = match tenant_from_request(&req) {
        Ok(t) => t,
        Err(e) => return Ok(e.error_response()),
    };

    match member_service.create_member(&tenant, request.into_inner()).await {
        Ok(response) => Ok(HttpResponse::Ok().json(ApiResponse::success_with_message(
            response,
            "会员创建成功",
        ))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/members/{id}",
    tag = "member",
    params(
        ("id" = i64, Path, description = "会员ID")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "会员详情", body = MemberResponse),
        (status = 404, description = "会员不存在")
    )
)]
pub async fn get_member(
    member_service: web::Data<MemberService>,
    req: HttpRequest,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    let tenant = match tenant_from_request(&req) {
        Ok(t) => t,
        Err(e) => return Ok(e.error_response()),
    };

    match member_service.get_member(&tenant, path.into_inner()).await {
        Ok(response) => Ok(HttpResponse::Ok().json(ApiResponse::success(response))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    put,
    path = "/members/{id}",
    tag = "member",
    params(
        ("id" = i64, Path, description = "会员ID")
    ),
    request_body = UpdateMemberRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "修改成功", body = MemberResponse),
        (status = 400, description = "请求参数错误"),
        (status = 404, description = "会员不存在"),
        (status = 409, description = "手机号已存在")
    )
)]
pub async fn update_member(
    member_service: web::Data<MemberService>,
    req: HttpRequest,
    path: web::Path<i64>,
    request: web::Json<UpdateMemberRequest>,
) -> Result<HttpResponse> {
    let tenant = match tenant_from_request(&req) {
        Ok(t) => t,
        Err(e) => return Ok(e.error_response()),
    };

    match member_service
        .update_member(&tenant, path.into_inner(), request.into_inner())
        .await
    {
        Ok(response) => Ok(HttpResponse::Ok().json(ApiResponse::success(response))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    put,
    path = "/members/{id}/note",
    tag = "member",
    params(
        ("id" = i64, Path, description = "会员ID")
    ),
    request_body = UpdateNoteRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "备注已保存", body = MemberResponse),
        (status = 404, description = "会员不存在")
    )
)]
pub async fn update_note(
    member_service: web::Data<MemberService>,
    req: HttpRequest,
    path: web::Path<i64>,
    request: web::Json<UpdateNoteRequest>,
) -> Result<HttpResponse> {
    let tenant = match tenant_from_request(&req) {
        Ok(t) => t,
        Err(e) => return Ok(e.error_response()),
    };

    match member_service
        .update_note(&tenant, path.into_inner(), request.into_inner())
        .await
    {
        Ok(response) => Ok(HttpResponse::Ok().json(ApiResponse::success(response))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/members/{id}/recharge",
    tag = "ledger",
    params(
        ("id" = i64, Path, description = "会员ID")
    ),
    request_body = RechargeRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "充值成功", body = RechargeResponse),
        (status = 400, description = "金额或折扣无效"),
        (status = 404, description = "会员不存在")
    )
)]
pub async fn recharge(
    ledger_service: web::Data<LedgerService>,
    req: HttpRequest,
    path: web::Path<i64>,
    request: web::Json<RechargeRequest>,
) -> Result<HttpResponse> {
    let tenant = match tenant_from_request(&req) {
        Ok(t) => t,
        Err(e) => return Ok(e.error_response()),
    };

    match ledger_service
        .recharge(&tenant, path.into_inner(), request.into_inner())
        .await
    {
        Ok(response) => Ok(HttpResponse::Ok().json(ApiResponse::success_with_message(
            response,
            "充值成功",
        ))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/members/{id}/spend",
    tag = "ledger",
    params(
        ("id" = i64, Path, description = "会员ID")
    ),
    request_body = SpendRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "消费成功", body = SpendResponse),
        (status = 400, description = "请求参数错误"),
        (status = 404, description = "会员不存在"),
        (status = 422, description = "余额不足")
    )
)]
pub async fn spend(
    ledger_service: web::Data<LedgerService>,
    req: HttpRequest,
    path: web::Path<i64>,
    request: web::Json<SpendRequest>,
) -> Result<HttpResponse> {
    let tenant = match tenant_from_request(&req) {
        Ok(t) => t,
        Err(e) => return Ok(e.error_response()),
    };

    match ledger_service
        .spend(&tenant, path.into_inner(), request.into_inner())
        .await
    {
        Ok(response) => Ok(HttpResponse::Ok().json(ApiResponse::success(response))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn member_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/members")
            .route("", web::get().to(search_members))
            .route("", web::post().to(create_member))
            .route("/{id}", web::get().to(get_member))
            .route("/{id}", web::put().to(update_member))
            .route("/{id}/note", web::put().to(update_note))
            .route("/{id}/recharge", web::post().to(recharge))
            .route("/{id}/spend", web::post().to(spend)),
    );
}
