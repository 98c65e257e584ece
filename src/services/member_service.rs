use crate::entities::{
    TransactionType, account_entity as accounts, member_entity as members,
    transaction_entity as transactions,
};
use crate::error::{AppError, AppResult};
use crate::models::*;
use crate::utils::{
    NO_DISCOUNT_BP, escape_like, format_cents, format_discount, is_phone_suffix_query,
    normalize_phone, phone_search_key, validate_amount, validate_discount_bp, validate_phone,
};
use chrono::Utc;
use sea_orm::sea_query::{Expr, Func, LikeExpr};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, DbErr,
    EntityTrait, IntoActiveModel, QueryFilter, QueryOrder, Set, SqlErr, TransactionTrait,
};

/// 会员匹配条件：手机号精确 OR 姓名模糊（不区分大小写）OR 4 位尾号
///
/// 尾号分支仅在查询恰好为 4 位数字时加入。
/// 手机号分支先按入库规则去掉空格与横线。
pub(crate) fn member_match_condition(query: &str) -> Condition {
    let name_pattern = format!("%{}%", escape_like(&query.to_lowercase()));
    let phone = phone_search_key(query);
    let mut condition = Condition::any()
        .add(Expr::col((members::Entity, members::Column::Phone)).eq(phone.as_str()))
        .add(
            Expr::expr(Func::lower(Expr::col((
                members::Entity,
                members::Column::Name,
            ))))
            .like(LikeExpr::new(name_pattern).escape('\\')),
        );
    if is_phone_suffix_query(query) {
        condition = condition.add(
            Expr::col((members::Entity, members::Column::Phone))
                .like(LikeExpr::new(format!("%{query}")).escape('\\')),
        );
    }
    condition
}

/// 按租户读取会员，跨店铺访问一律视为不存在
pub(crate) async fn find_tenant_member<C: ConnectionTrait>(
    conn: &C,
    tenant: &TenantContext,
    member_id: i64,
) -> AppResult<members::Model> {
    members::Entity::find_by_id(member_id)
        .filter(members::Column::OwnerUsername.eq(tenant.username.as_str()))
        .one(conn)
        .await?
        .ok_or_else(|| AppError::NotFound("Member not found".to_string()))
}

fn duplicate_phone(phone: &str) -> AppError {
    AppError::DuplicatePhone(format!("手机号 {phone} 已被本店其他会员使用"))
}

fn map_unique_violation(err: DbErr, phone: &str) -> AppError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => duplicate_phone(phone),
        _ => err.into(),
    }
}

fn clean_name(name: &str) -> AppResult<String> {
    let name = name.trim();
    if name.is_empty() || name.chars().count() > 50 {
        return Err(AppError::ValidationError(
            "姓名不能为空且不能超过50个字符".to_string(),
        ));
    }
    Ok(name.to_string())
}

fn clean_phone(phone: &str) -> AppResult<String> {
    let phone = normalize_phone(phone);
    validate_phone(&phone)?;
    Ok(phone)
}

fn validate_birthday(birthday: Option<chrono::NaiveDate>) -> AppResult<()> {
    if let Some(b) = birthday
        && b > Utc::now().date_naive()
    {
        return Err(AppError::ValidationError("生日不能晚于今天".to_string()));
    }
    Ok(())
}

#[derive(Clone)]
pub struct MemberService {
    pool: DatabaseConnection,
}

impl MemberService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    /// 按手机号 / 姓名 / 4 位尾号查找本店会员
    pub async fn search(
        &self,
        tenant: &TenantContext,
        query: &str,
    ) -> AppResult<MemberSearchResponse> {
        let query = query.trim();
        if query.is_empty() {
            return Err(AppError::ValidationError("查询内容不能为空".to_string()));
        }

        let rows = members::Entity::find()
            .find_also_related(accounts::Entity)
            .filter(members::Column::OwnerUsername.eq(tenant.username.as_str()))
            .filter(member_match_condition(query))
            .order_by_asc(members::Column::Id)
            .all(&self.pool)
            .await?;

        let matches: Vec<MemberResponse> = rows
            .into_iter()
            .map(|(m, a)| MemberResponse::from_parts(m, a))
            .collect();

        if matches.len() > 1 {
            log::info!(
                "Member search '{query}' in shop {} is ambiguous: {} matches",
                tenant.username,
                matches.len()
            );
        }

        Ok(MemberSearchResponse::from_matches(matches))
    }

    pub async fn get_member(
        &self,
        tenant: &TenantContext,
        member_id: i64,
    ) -> AppResult<MemberResponse> {
        let member = find_tenant_member(&self.pool, tenant, member_id).await?;
        let account = accounts::Entity::find_by_id(member.id)
            .one(&self.pool)
            .await?;
        Ok(MemberResponse::from_parts(member, account))
    }

    /// 新建会员：会员、账户、（可选）开卡充值流水在同一事务内写入
    pub async fn create_member(
        &self,
        tenant: &TenantContext,
        request: CreateMemberRequest,
    ) -> AppResult<MemberResponse> {
        let name = clean_name(&request.name)?;
        let phone = clean_phone(&request.phone)?;
        validate_birthday(request.birthday)?;
        let initial_balance = request.initial_balance.unwrap_or(0);
        validate_amount(initial_balance, "开卡金额")?;
        let initial_discount_bp = request.initial_discount_bp.unwrap_or(NO_DISCOUNT_BP);
        validate_discount_bp(initial_discount_bp)?;

        let txn = self.pool.begin().await?;

        let existing = members::Entity::find()
            .filter(members::Column::OwnerUsername.eq(tenant.username.as_str()))
            .filter(members::Column::Phone.eq(phone.as_str()))
            .one(&txn)
            .await?;
        if existing.is_some() {
            return Err(duplicate_phone(&phone));
        }

        let now = Utc::now();
        let member = members::ActiveModel {
            name: Set(name),
            phone: Set(phone.clone()),
            birthday: Set(request.birthday),
            note: Set(request.note.unwrap_or_default().trim().to_string()),
            created_at: Set(now),
            owner_username: Set(tenant.username.clone()),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(|e| map_unique_violation(e, &phone))?;

        let account = accounts::ActiveModel {
            member_id: Set(member.id),
            balance: Set(initial_balance),
            current_discount_bp: Set(initial_discount_bp),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;

        if initial_balance > 0 {
            transactions::ActiveModel {
                member_id: Set(member.id),
                transaction_type: Set(TransactionType::Recharge),
                amount: Set(initial_balance),
                detail: Set(format!(
                    "开卡充值{}, 折扣{}",
                    format_cents(initial_balance),
                    format_discount(initial_discount_bp)
                )),
                date: Set(now),
                signature: Set(None),
                owner_username: Set(tenant.username.clone()),
                ..Default::default()
            }
            .insert(&txn)
            .await?;
        }

        txn.commit().await?;

        log::info!(
            "Member {} created in shop {} (opening balance {})",
            member.id,
            tenant.username,
            format_cents(initial_balance)
        );

        Ok(MemberResponse::from_parts(member, Some(account)))
    }

    pub async fn update_note(
        &self,
        tenant: &TenantContext,
        member_id: i64,
        request: UpdateNoteRequest,
    ) -> AppResult<MemberResponse> {
        let member = find_tenant_member(&self.pool, tenant, member_id).await?;
        let mut am = member.into_active_model();
        am.note = Set(request.note.trim().to_string());
        am.update(&self.pool).await?;

        self.get_member(tenant, member_id).await
    }

    /// 修改姓名 / 手机号 / 生日，或直接更正余额
    pub async fn update_member(
        &self,
        tenant: &TenantContext,
        member_id: i64,
        request: UpdateMemberRequest,
    ) -> AppResult<MemberResponse> {
        if request.name.is_none()
            && request.phone.is_none()
            && request.birthday.is_none()
            && request.balance.is_none()
        {
            return Err(AppError::ValidationError("No fields to update".to_string()));
        }

        let name = request.name.as_deref().map(clean_name).transpose()?;
        let phone = request.phone.as_deref().map(clean_phone).transpose()?;
        validate_birthday(request.birthday)?;
        if let Some(balance) = request.balance {
            validate_amount(balance, "余额")?;
        }

        let txn = self.pool.begin().await?;
        let member = find_tenant_member(&txn, tenant, member_id).await?;

        if let Some(phone) = &phone
            && phone != &member.phone
        {
            let taken = members::Entity::find()
                .filter(members::Column::OwnerUsername.eq(tenant.username.as_str()))
                .filter(members::Column::Phone.eq(phone.as_str()))
                .filter(members::Column::Id.ne(member_id))
                .one(&txn)
                .await?;
            if taken.is_some() {
                return Err(duplicate_phone(phone));
            }
        }

        if name.is_some() || phone.is_some() || request.birthday.is_some() {
            let mut am = member.into_active_model();
            if let Some(name) = name {
                am.name = Set(name);
            }
            if let Some(phone) = &phone {
                am.phone = Set(phone.clone());
            }
            if let Some(birthday) = request.birthday {
                am.birthday = Set(Some(birthday));
            }
            am.update(&txn).await.map_err(|e| {
                map_unique_violation(e, phone.as_deref().unwrap_or_default())
            })?;
        }

        if let Some(balance) = request.balance {
            let result = accounts::Entity::update_many()
                .col_expr(accounts::Column::Balance, Expr::value(balance))
                .col_expr(accounts::Column::UpdatedAt, Expr::value(Utc::now()))
                .filter(accounts::Column::MemberId.eq(member_id))
                .exec(&txn)
                .await?;
            if result.rows_affected == 0 {
                return Err(AppError::NotFound("Member account not found".to_string()));
            }
            log::info!(
                "Balance of member {member_id} in shop {} corrected to {}",
                tenant.username,
                format_cents(balance)
            );
        }

        txn.commit().await?;

        self.get_member(tenant, member_id).await
    }
}
