use actix_web::web;
use utoipa::OpenApi;
use utoipa::{
    Modify,
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
};
use utoipa_swagger_ui::SwaggerUi;

use crate::handlers;
use crate::entities::TransactionType;
use crate::models::*;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
            )
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::auth::login,
        handlers::auth::refresh,
        handlers::catalog::get_catalog,
        handlers::member::search_members,
        handlers::member::create_member,
        handlers::member::get_member,
        handlers::member::update_member,
        handlers::member::update_note,
        handlers::member::recharge,
        handlers::member::spend,
        handlers::transaction::list_transactions,
        handlers::transaction::get_signature,
        handlers::report::weekly_report,
    ),
    components(
        schemas(
            LoginRequest,
            RefreshTokenRequest,
            AuthResponse,
            ShopOwnerResponse,
            ServiceCategory,
            DiscountTier,
            CatalogResponse,
            CreateMemberRequest,
            UpdateMemberRequest,
            UpdateNoteRequest,
            AccountResponse,
            MemberResponse,
            SearchStatus,
            MemberSearchResponse,
            RechargeRequest,
            CategorySelection,
            SignatureCapture,
            SpendRequest,
            TransactionType,
            TransactionResponse,
            RechargeResponse,
            SpendResponse,
            DailyTotal,
            WeeklyReportResponse,
            TransactionListItem,
            TransactionListResponse,
            ApiError,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "auth", description = "Shop owner authentication API"),
        (name = "catalog", description = "Service menu and discount tiers"),
        (name = "member", description = "Member registration and lookup API"),
        (name = "ledger", description = "Recharge and spend API"),
        (name = "transaction", description = "Transaction log API"),
        (name = "report", description = "Weekly report API"),
    ),
    info(
        title = "Salon Ledger API",
        version = "1.0.0",
        description = "Salon member ledger REST API documentation"
    ),
    servers(
        (url = "/api/v1", description = "Local server")
    )
)]
pub struct ApiDoc;

pub fn swagger_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()),
    )
    .route(
        "/swagger-ui",
        web::get().to(|| async {
            actix_web::HttpResponse::Found()
                .append_header(("Location", "/swagger-ui/"))
                .finish()
        }),
    );
}
