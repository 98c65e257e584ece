use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// 请求级租户上下文，由认证中间件从 access token 中解析后放入请求扩展
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenantContext {
    pub username: String,
    pub shop_name: String,
}

impl TenantContext {
    pub fn new(username: impl Into<String>, shop_name: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            shop_name: shop_name.into(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LoginRequest {
    #[schema(example = "lily")]
    pub username: String,
    #[schema(example = "salon2024")]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RefreshTokenRequest {
    pub refresh_token: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ShopOwnerResponse {
    pub username: String,
    pub shop_name: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: i64,
    pub shop: ShopOwnerResponse,
}
