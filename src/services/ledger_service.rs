use crate::entities::{
    TransactionType, account_entity as accounts, transaction_entity as transactions,
};
use crate::error::{AppError, AppResult};
use crate::models::*;
use crate::services::CatalogService;
use crate::services::member_service::find_tenant_member;
use crate::utils::{
    MAX_AMOUNT_CENTS, SignatureRaster, apply_discount, encode_signature, format_cents, format_discount,
    validate_amount, validate_discount_bp,
};
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    QueryFilter, Set, TransactionTrait,
};

#[derive(Clone)]
pub struct LedgerService {
    pool: DatabaseConnection,
    catalog: CatalogService,
}

impl LedgerService {
    pub fn new(pool: DatabaseConnection, catalog: CatalogService) -> Self {
        Self { pool, catalog }
    }

    /// 充值
    ///
    /// - 余额累加 `balance = balance + amount`（单条语句，不做读-改-写）
    /// - 折扣总是被覆盖为本次选择的等级，金额为 0 时也一样
    /// - 同一事务内追加一条 RECHARGE 流水
    pub async fn recharge(
        &self,
        tenant: &TenantContext,
        member_id: i64,
        request: RechargeRequest,
    ) -> AppResult<RechargeResponse> {
        validate_amount(request.amount, "充值金额")?;
        validate_discount_bp(request.discount_bp)?;

        let txn = self.pool.begin().await?;
        let member = find_tenant_member(&txn, tenant, member_id).await?;

        let current = load_account(&txn, member.id).await?;
        if current
            .balance
            .checked_add(request.amount)
            .is_none_or(|b| b > MAX_AMOUNT_CENTS)
        {
            return Err(AppError::ValidationError(format!(
                "充值后余额不能超过 {}",
                format_cents(MAX_AMOUNT_CENTS)
            )));
        }

        let now = Utc::now();
        let result = accounts::Entity::update_many()
            .col_expr(
                accounts::Column::Balance,
                Expr::col(accounts::Column::Balance).add(request.amount),
            )
            .col_expr(
                accounts::Column::CurrentDiscountBp,
                Expr::value(request.discount_bp),
            )
            .col_expr(accounts::Column::UpdatedAt, Expr::value(now))
            .filter(accounts::Column::MemberId.eq(member.id))
            .exec(&txn)
            .await?;
        if result.rows_affected == 0 {
            return Err(AppError::NotFound("Member account not found".to_string()));
        }

        let detail = format!(
            "充值{}, 折扣变{}",
            format_cents(request.amount),
            format_discount(request.discount_bp)
        );
        let record = transactions::ActiveModel {
            member_id: Set(member.id),
            transaction_type: Set(TransactionType::Recharge),
            amount: Set(request.amount),
            detail: Set(detail),
            date: Set(now),
            signature: Set(None),
            owner_username: Set(tenant.username.clone()),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        let account = load_account(&txn, member.id).await?;
        txn.commit().await?;

        log::info!(
            "Recharge {} for member {} in shop {}: balance {}, discount {}",
            format_cents(request.amount),
            member.id,
            tenant.username,
            format_cents(account.balance),
            format_discount(account.current_discount_bp)
        );

        Ok(RechargeResponse {
            account: account.into(),
            transaction: record.into(),
        })
    }

    /// 消费扣款
    ///
    /// 1. 校验项目选择（至少一项 / 大类细项完整 / 在菜单内）
    /// 2. 折后价 = round(原价 × 折扣, 2)
    /// 3. 条件更新 `balance = balance - final WHERE balance >= final`，未命中即余额不足
    /// 4. 同一事务内追加一条 SPEND 流水（附签字）
    pub async fn spend(
        &self,
        tenant: &TenantContext,
        member_id: i64,
        request: SpendRequest,
    ) -> AppResult<SpendResponse> {
        validate_amount(request.price, "订单原价")?;
        let detail = self
            .catalog
            .describe_selection(&request.selections, request.supplement.as_deref())?;

        let signature = match &request.signature {
            Some(capture) => {
                let raster =
                    SignatureRaster::from_base64_rgba(capture.width, capture.height, &capture.rgba)?;
                Some(encode_signature(&raster)?)
            }
            None => None,
        };

        let txn = self.pool.begin().await?;
        let member = find_tenant_member(&txn, tenant, member_id).await?;
        let account = load_account(&txn, member.id).await?;

        let final_price = apply_discount(request.price, account.current_discount_bp);

        let result = accounts::Entity::update_many()
            .col_expr(
                accounts::Column::Balance,
                Expr::col(accounts::Column::Balance).sub(final_price),
            )
            .col_expr(accounts::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(accounts::Column::MemberId.eq(member.id))
            .filter(accounts::Column::Balance.gte(final_price))
            .exec(&txn)
            .await?;
        if result.rows_affected == 0 {
            log::warn!(
                "Spend rejected for member {} in shop {}: balance {}, required {}",
                member.id,
                tenant.username,
                format_cents(account.balance),
                format_cents(final_price)
            );
            return Err(AppError::InsufficientBalance(format!(
                "余额不足: 当前余额 ¥{}, 应扣款 ¥{}",
                format_cents(account.balance),
                format_cents(final_price)
            )));
        }

        let record = transactions::ActiveModel {
            member_id: Set(member.id),
            transaction_type: Set(TransactionType::Spend),
            amount: Set(final_price),
            detail: Set(detail),
            date: Set(Utc::now()),
            signature: Set(signature),
            owner_username: Set(tenant.username.clone()),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        let account = load_account(&txn, member.id).await?;
        txn.commit().await?;

        log::info!(
            "Spend {} (price {}) for member {} in shop {}: balance {}",
            format_cents(final_price),
            format_cents(request.price),
            member.id,
            tenant.username,
            format_cents(account.balance)
        );

        Ok(SpendResponse {
            price: request.price,
            final_price,
            account: account.into(),
            transaction: record.into(),
        })
    }
}

async fn load_account(txn: &DatabaseTransaction, member_id: i64) -> AppResult<accounts::Model> {
    accounts::Entity::find_by_id(member_id)
        .one(txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Member account not found".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::MemberService;
    use crate::test_support::{seed_owner, setup_db};
    use crate::utils::decode_signature;
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;
    use sea_orm::PaginatorTrait;

    struct Fixture {
        db: DatabaseConnection,
        shop: TenantContext,
        ledger: LedgerService,
        members: MemberService,
    }

    async fn fixture() -> Fixture {
        let db = setup_db().await;
        let shop = seed_owner(&db, "lily").await;
        Fixture {
            ledger: LedgerService::new(db.clone(), CatalogService::new()),
            members: MemberService::new(db.clone()),
            db,
            shop,
        }
    }

    // 建档后通过一次充值设定余额与折扣
    async fn member_with(fx: &Fixture, phone: &str, balance: i64, discount_bp: i32) -> i64 {
        let id = fx
            .members
            .create_member(
                &fx.shop,
                CreateMemberRequest {
                    name: "王小美".to_string(),
                    phone: phone.to_string(),
                    birthday: None,
                    note: None,
                    initial_balance: None,
                    initial_discount_bp: None,
                },
            )
            .await
            .unwrap()
            .id;
        fx.ledger
            .recharge(
                &fx.shop,
                id,
                RechargeRequest {
                    amount: balance,
                    discount_bp,
                },
            )
            .await
            .unwrap();
        id
    }

    fn hand_nails() -> Vec<CategorySelection> {
        vec![CategorySelection {
            category: "手部".to_string(),
            sub_items: vec!["卸甲".to_string(), "款式".to_string()],
        }]
    }

    async fn transaction_count(fx: &Fixture) -> u64 {
        transactions::Entity::find().count(&fx.db).await.unwrap()
    }

    #[tokio::test]
    async fn test_recharge_adds_balance_and_sets_discount() {
        let fx = fixture().await;
        let id = member_with(&fx, "13800000000", 10_000, 10_000).await;

        let resp = fx
            .ledger
            .recharge(
                &fx.shop,
                id,
                RechargeRequest {
                    amount: 20_050,
                    discount_bp: 8_800,
                },
            )
            .await
            .unwrap();
        assert_eq!(resp.account.balance, 30_050);
        assert_eq!(resp.account.current_discount_bp, 8_800);
        assert_eq!(resp.transaction.transaction_type, TransactionType::Recharge);
        assert_eq!(resp.transaction.amount, 20_050);
        assert_eq!(resp.transaction.detail, "充值200.50, 折扣变0.88");

        let reread = fx.members.get_member(&fx.shop, id).await.unwrap();
        let account = reread.account.unwrap();
        assert_eq!(account.balance, 30_050);
        assert_eq!(account.current_discount_bp, 8_800);
        assert_eq!(transaction_count(&fx).await, 2);
    }

    #[tokio::test]
    async fn test_zero_recharge_only_changes_discount_tier() {
        let fx = fixture().await;
        let id = member_with(&fx, "13800000000", 10_000, 10_000).await;

        let resp = fx
            .ledger
            .recharge(
                &fx.shop,
                id,
                RechargeRequest {
                    amount: 0,
                    discount_bp: 7_000,
                },
            )
            .await
            .unwrap();
        assert_eq!(resp.account.balance, 10_000);
        assert_eq!(resp.account.current_discount_bp, 7_000);
        assert_eq!(resp.transaction.amount, 0);
    }

    #[tokio::test]
    async fn test_recharge_rejects_negative_amount_and_bad_discount() {
        let fx = fixture().await;
        let id = member_with(&fx, "13800000000", 0, 10_000).await;
        let before = transaction_count(&fx).await;

        let err = fx
            .ledger
            .recharge(
                &fx.shop,
                id,
                RechargeRequest {
                    amount: -1,
                    discount_bp: 9_000,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));

        let err = fx
            .ledger
            .recharge(
                &fx.shop,
                id,
                RechargeRequest {
                    amount: 100,
                    discount_bp: 10_500,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
        assert_eq!(transaction_count(&fx).await, before);
    }

    #[tokio::test]
    async fn test_recharge_beyond_balance_ceiling_rejected() {
        let fx = fixture().await;
        let id = member_with(&fx, "13800000000", MAX_AMOUNT_CENTS - 10, 9_000).await;
        let before = transaction_count(&fx).await;

        let err = fx
            .ledger
            .recharge(
                &fx.shop,
                id,
                RechargeRequest {
                    amount: 100,
                    discount_bp: 8_000,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
        assert_eq!(transaction_count(&fx).await, before);

        let account = accounts::Entity::find_by_id(id)
            .one(&fx.db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(account.balance, MAX_AMOUNT_CENTS - 10);
        assert_eq!(account.current_discount_bp, 9_000);

        let err = fx
            .ledger
            .recharge(
                &fx.shop,
                id,
                RechargeRequest {
                    amount: i64::MAX,
                    discount_bp: 8_000,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }

    #[tokio::test]
    async fn test_spend_applies_discount() {
        let fx = fixture().await;
        let id = member_with(&fx, "13800000000", 10_000, 9_000).await;

        let resp = fx
            .ledger
            .spend(
                &fx.shop,
                id,
                SpendRequest {
                    selections: hand_nails(),
                    supplement: Some("加钻".to_string()),
                    price: 5_000,
                    signature: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(resp.final_price, 4_500);
        assert_eq!(resp.account.balance, 5_500);
        assert_eq!(resp.transaction.transaction_type, TransactionType::Spend);
        assert_eq!(resp.transaction.amount, 4_500);
        assert_eq!(resp.transaction.detail, "手部(卸甲,款式) + 备注[加钻]");
        assert!(!resp.transaction.has_signature);

        let spends = transactions::Entity::find()
            .filter(transactions::Column::TransactionType.eq(TransactionType::Spend))
            .count(&fx.db)
            .await
            .unwrap();
        assert_eq!(spends, 1);
    }

    #[tokio::test]
    async fn test_spend_insufficient_balance_leaves_state_unchanged() {
        let fx = fixture().await;
        let id = member_with(&fx, "13800000000", 1_000, 10_000).await;
        let before = transaction_count(&fx).await;

        let err = fx
            .ledger
            .spend(
                &fx.shop,
                id,
                SpendRequest {
                    selections: hand_nails(),
                    supplement: None,
                    price: 5_000,
                    signature: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InsufficientBalance(_)));

        let account = fx.members.get_member(&fx.shop, id).await.unwrap().account.unwrap();
        assert_eq!(account.balance, 1_000);
        assert_eq!(transaction_count(&fx).await, before);
    }

    #[tokio::test]
    async fn test_spend_exact_balance_allowed() {
        let fx = fixture().await;
        let id = member_with(&fx, "13800000000", 4_500, 9_000).await;

        let resp = fx
            .ledger
            .spend(
                &fx.shop,
                id,
                SpendRequest {
                    selections: hand_nails(),
                    supplement: None,
                    price: 5_000,
                    signature: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(resp.account.balance, 0);
    }

    #[tokio::test]
    async fn test_spend_validation_runs_before_balance_check() {
        let fx = fixture().await;
        // 余额为 0，若先检查余额会得到 InsufficientBalance
        let id = member_with(&fx, "13800000000", 0, 10_000).await;
        let before = transaction_count(&fx).await;

        let err = fx
            .ledger
            .spend(
                &fx.shop,
                id,
                SpendRequest {
                    selections: vec![],
                    supplement: None,
                    price: 5_000,
                    signature: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));

        let err = fx
            .ledger
            .spend(
                &fx.shop,
                id,
                SpendRequest {
                    selections: vec![
                        hand_nails().remove(0),
                        CategorySelection {
                            category: "睫毛".to_string(),
                            sub_items: vec![],
                        },
                    ],
                    supplement: None,
                    price: 5_000,
                    signature: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(msg) if msg.contains("睫毛")));
        assert_eq!(transaction_count(&fx).await, before);
    }

    #[tokio::test]
    async fn test_spend_stores_signature() {
        let fx = fixture().await;
        let id = member_with(&fx, "13800000000", 10_000, 10_000).await;

        let rgba: Vec<u8> = (0..4 * 3 * 4).map(|i| i as u8).collect();
        let resp = fx
            .ledger
            .spend(
                &fx.shop,
                id,
                SpendRequest {
                    selections: hand_nails(),
                    supplement: None,
                    price: 1_000,
                    signature: Some(SignatureCapture {
                        width: 4,
                        height: 3,
                        rgba: STANDARD.encode(&rgba),
                    }),
                },
            )
            .await
            .unwrap();
        assert!(resp.transaction.has_signature);

        let stored = transactions::Entity::find_by_id(resp.transaction.id)
            .one(&fx.db)
            .await
            .unwrap()
            .unwrap();
        let raster = decode_signature(stored.signature.as_deref().unwrap()).unwrap();
        assert_eq!((raster.width, raster.height), (4, 3));
        assert_eq!(raster.rgba, rgba);
    }

    #[tokio::test]
    async fn test_ledger_rejects_member_of_other_shop() {
        let fx = fixture().await;
        let id = member_with(&fx, "13800000000", 10_000, 10_000).await;
        let rose = seed_owner(&fx.db, "rose").await;

        let err = fx
            .ledger
            .recharge(
                &rose,
                id,
                RechargeRequest {
                    amount: 100,
                    discount_bp: 10_000,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
