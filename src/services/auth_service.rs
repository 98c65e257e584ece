use crate::entities::shop_owner_entity as owners;
use crate::error::{AppError, AppResult};
use crate::models::*;
use crate::utils::*;
use chrono::Utc;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set};

const INVALID_CREDENTIALS: &str = "用户名或密码错误";

#[derive(Clone)]
pub struct AuthService {
    pool: DatabaseConnection,
    jwt_service: JwtService,
}

impl AuthService {
    pub fn new(pool: DatabaseConnection, jwt_service: JwtService) -> Self {
        Self { pool, jwt_service }
    }

    fn issue_tokens(&self, owner: &owners::Model) -> AppResult<AuthResponse> {
        let access_token = self
            .jwt_service
            .generate_access_token(&owner.username, &owner.shop_name)?;
        let refresh_token = self
            .jwt_service
            .generate_refresh_token(&owner.username, &owner.shop_name)?;

        Ok(AuthResponse {
            access_token,
            refresh_token,
            expires_in: self.jwt_service.get_access_token_expires_in(),
            shop: ShopOwnerResponse {
                username: owner.username.clone(),
                shop_name: owner.shop_name.clone(),
            },
        })
    }

    pub async fn login(&self, request: LoginRequest) -> AppResult<AuthResponse> {
        let username = request.username.trim();
        if username.is_empty() || request.password.is_empty() {
            return Err(AppError::ValidationError(
                "用户名和密码不能为空".to_string(),
            ));
        }

        // 用户不存在与密码错误返回相同信息
        let owner = owners::Entity::find_by_id(username.to_string())
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::AuthError(INVALID_CREDENTIALS.to_string()))?;

        if !verify_password(&request.password, &owner.password_hash)? {
            log::warn!("Failed login attempt for shop owner {}", owner.username);
            return Err(AppError::AuthError(INVALID_CREDENTIALS.to_string()));
        }

        log::info!("Shop owner {} logged in", owner.username);
        self.issue_tokens(&owner)
    }

    pub async fn refresh_token(&self, refresh_token: &str) -> AppResult<AuthResponse> {
        let claims = self.jwt_service.verify_refresh_token(refresh_token)?;

        // 店主被删除后刷新令牌随之失效
        let owner = owners::Entity::find_by_id(claims.sub)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::AuthError("无效的令牌".to_string()))?;

        self.issue_tokens(&owner)
    }

    /// 创建店主账号；已存在时不覆盖，返回 false
    pub async fn ensure_owner(
        &self,
        username: &str,
        password: &str,
        shop_name: &str,
    ) -> AppResult<bool> {
        let username = username.trim();
        if username.is_empty() || username.chars().count() > 64 {
            return Err(AppError::ValidationError(
                "用户名长度必须在1-64字符之间".to_string(),
            ));
        }
        let shop_name = shop_name.trim();
        if shop_name.is_empty() {
            return Err(AppError::ValidationError("店铺名称不能为空".to_string()));
        }

        if owners::Entity::find_by_id(username.to_string())
            .one(&self.pool)
            .await?
            .is_some()
        {
            return Ok(false);
        }

        validate_password(password)?;
        let password_hash = hash_password(password)?;

        owners::ActiveModel {
            username: Set(username.to_string()),
            password_hash: Set(password_hash),
            shop_name: Set(shop_name.to_string()),
            created_at: Set(Utc::now()),
        }
        .insert(&self.pool)
        .await?;

        log::info!("Created shop owner {username} ({shop_name})");
        Ok(true)
    }
}
