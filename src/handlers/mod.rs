pub mod auth;
pub mod catalog;
pub mod member;
pub mod report;
pub mod transaction;

pub use auth::auth_config;
pub use catalog::catalog_config;
pub use member::member_config;
pub use report::report_config;
pub use transaction::transaction_config;

use crate::error::{AppError, AppResult};
use crate::models::TenantContext;
use actix_web::{HttpMessage, HttpRequest};

/// 取出认证中间件放入的租户上下文
pub(crate) fn tenant_from_request(req: &HttpRequest) -> AppResult<TenantContext> {
    req.extensions()
        .get::<TenantContext>()
        .cloned()
        .ok_or_else(|| AppError::AuthError("Missing tenant context".to_string()))
}
