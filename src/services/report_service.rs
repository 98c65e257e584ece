use crate::entities::{TransactionType, member_entity as members, transaction_entity as transactions};
use crate::error::{AppError, AppResult};
use crate::models::*;
use crate::services::member_service::member_match_condition;
use crate::utils::decode_signature_png;
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, JoinType, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, RelationTrait,
};
use std::collections::BTreeMap;

/// 周报窗口：含今天在内的最近 7 个自然日
pub const REPORT_WINDOW_DAYS: i64 = 7;

const REPORT_TYPES: [TransactionType; 2] = [TransactionType::Recharge, TransactionType::Spend];

/// 生成稠密的 (日期, 类型) 合计表，没有流水的格子填 0
pub fn build_daily_grid(
    start_day: NaiveDate,
    days: i64,
    rows: impl IntoIterator<Item = (NaiveDate, TransactionType, i64)>,
) -> Vec<DailyTotal> {
    let mut sums: BTreeMap<(NaiveDate, TransactionType), i64> = BTreeMap::new();
    for (day, kind, amount) in rows {
        *sums.entry((day, kind)).or_insert(0) += amount;
    }

    (0..days)
        .map(|offset| start_day + Duration::days(offset))
        .flat_map(|day| {
            let sums = &sums;
            REPORT_TYPES.iter().map(move |&kind| DailyTotal {
                day,
                transaction_type: kind,
                total: sums.get(&(day, kind)).copied().unwrap_or(0),
            })
        })
        .collect()
}

fn sum_by_type(rows: &[(TransactionType, i64)]) -> (i64, i64) {
    rows.iter()
        .fold((0, 0), |(recharge, spend), (kind, amount)| match kind {
            TransactionType::Recharge => (recharge + amount, spend),
            TransactionType::Spend => (recharge, spend + amount),
        })
}

#[derive(Clone)]
pub struct ReportService {
    pool: DatabaseConnection,
    utc_offset_minutes: i64,
}

impl ReportService {
    pub fn new(pool: DatabaseConnection, utc_offset_minutes: i32) -> Self {
        Self {
            pool,
            utc_offset_minutes: utc_offset_minutes as i64,
        }
    }

    /// 店铺时区的今天
    pub fn today(&self) -> NaiveDate {
        self.local_day(Utc::now())
    }

    fn local_day(&self, at: DateTime<Utc>) -> NaiveDate {
        (at + Duration::minutes(self.utc_offset_minutes)).date_naive()
    }

    /// 店铺时区某天 00:00 对应的 UTC 时刻
    fn local_midnight_utc(&self, day: NaiveDate) -> DateTime<Utc> {
        let naive = day.and_time(NaiveTime::MIN) - Duration::minutes(self.utc_offset_minutes);
        Utc.from_utc_datetime(&naive)
    }

    pub async fn weekly_report(&self, tenant: &TenantContext) -> AppResult<WeeklyReportResponse> {
        self.weekly_report_until(tenant, self.today()).await
    }

    /// 以 `today` 为最后一天的 7 日合计
    pub async fn weekly_report_until(
        &self,
        tenant: &TenantContext,
        today: NaiveDate,
    ) -> AppResult<WeeklyReportResponse> {
        let start_day = today - Duration::days(REPORT_WINDOW_DAYS - 1);
        let from = self.local_midnight_utc(start_day);
        let until = self.local_midnight_utc(today + Duration::days(1));

        let rows: Vec<(DateTime<Utc>, TransactionType, i64)> = transactions::Entity::find()
            .select_only()
            .column(transactions::Column::Date)
            .column(transactions::Column::TransactionType)
            .column(transactions::Column::Amount)
            .filter(transactions::Column::OwnerUsername.eq(tenant.username.as_str()))
            .filter(transactions::Column::Date.gte(from))
            .filter(transactions::Column::Date.lt(until))
            .into_tuple()
            .all(&self.pool)
            .await?;

        let days = build_daily_grid(
            start_day,
            REPORT_WINDOW_DAYS,
            rows.into_iter()
                .map(|(date, kind, amount)| (self.local_day(date), kind, amount)),
        );
        let (total_recharge, total_spend) = days.iter().fold((0, 0), |(r, s), d| {
            match d.transaction_type {
                TransactionType::Recharge => (r + d.total, s),
                TransactionType::Spend => (r, s + d.total),
            }
        });

        Ok(WeeklyReportResponse {
            start_day,
            end_day: today,
            days,
            total_recharge,
            total_spend,
        })
    }

    fn filtered<Q: QueryFilter>(
        &self,
        select: Q,
        tenant: &TenantContext,
        query: &TransactionListQuery,
    ) -> Q {
        let mut select =
            select.filter(transactions::Column::OwnerUsername.eq(tenant.username.as_str()));
        if let Some(term) = query.q.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            select = select.filter(member_match_condition(term));
        }
        if let Some(start) = query.start_date {
            select = select.filter(transactions::Column::Date.gte(self.local_midnight_utc(start)));
        }
        // 结束日期取次日 00:00 且严格小于，使结束当天整天都包含在内
        if let Some(end) = query.end_date {
            select = select.filter(
                transactions::Column::Date.lt(self.local_midnight_utc(end + Duration::days(1))),
            );
        }
        select
    }

    /// 流水列表：按会员 / 日期筛选，最新在前，附筛选范围内的充值与消费合计
    pub async fn list_transactions(
        &self,
        tenant: &TenantContext,
        query: &TransactionListQuery,
    ) -> AppResult<TransactionListResponse> {
        if let (Some(start), Some(end)) = (query.start_date, query.end_date)
            && start > end
        {
            return Err(AppError::ValidationError(
                "开始日期不能晚于结束日期".to_string(),
            ));
        }

        let params = PaginationParams::new(query.page, query.per_page);

        let base = self.filtered(
            transactions::Entity::find().find_also_related(members::Entity),
            tenant,
            query,
        );
        let total = base.clone().count(&self.pool).await? as i64;
        let rows = base
            .order_by_desc(transactions::Column::Date)
            .order_by_desc(transactions::Column::Id)
            .limit(params.get_limit() as u64)
            .offset(params.get_offset() as u64)
            .all(&self.pool)
            .await?;

        let amounts: Vec<(TransactionType, i64)> = self
            .filtered(
                transactions::Entity::find()
                    .join(JoinType::InnerJoin, transactions::Relation::Member.def()),
                tenant,
                query,
            )
            .select_only()
            .column(transactions::Column::TransactionType)
            .column(transactions::Column::Amount)
            .into_tuple()
            .all(&self.pool)
            .await?;
        let (total_recharge, total_spend) = sum_by_type(&amounts);

        let items = rows
            .into_iter()
            .map(|(t, m)| {
                let (member_name, member_phone) =
                    m.map(|m| (m.name, m.phone)).unwrap_or_default();
                TransactionListItem {
                    id: t.id,
                    member_id: t.member_id,
                    member_name,
                    member_phone,
                    transaction_type: t.transaction_type,
                    amount: t.amount,
                    date: t.date,
                    has_signature: t.signature.as_deref().is_some_and(|s| !s.is_empty()),
                    detail: t.detail,
                }
            })
            .collect();

        Ok(TransactionListResponse {
            items,
            page: params.get_page(),
            page_size: params.get_limit(),
            total,
            total_pages: params.total_pages(total),
            total_recharge,
            total_spend,
        })
    }

    /// 读取某笔流水的签字图片（PNG 字节）
    pub async fn signature_png(
        &self,
        tenant: &TenantContext,
        transaction_id: i64,
    ) -> AppResult<Vec<u8>> {
        let record = transactions::Entity::find_by_id(transaction_id)
            .filter(transactions::Column::OwnerUsername.eq(tenant.username.as_str()))
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Transaction not found".to_string()))?;

        match record.signature.as_deref() {
            Some(encoded) if !encoded.is_empty() => decode_signature_png(encoded),
            _ => Err(AppError::NotFound(
                "Transaction has no signature".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::account_entity as accounts;
    use crate::services::{CatalogService, LedgerService, MemberService};
    use crate::test_support::{seed_owner, setup_db};
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;
    use sea_orm::{ActiveModelTrait, Set};

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_daily_grid_is_dense() {
        let grid = build_daily_grid(
            day("2026-10-10"),
            7,
            vec![
                (day("2026-10-10"), TransactionType::Recharge, 100),
                (day("2026-10-10"), TransactionType::Recharge, 50),
                (day("2026-10-13"), TransactionType::Spend, 70),
            ],
        );
        assert_eq!(grid.len(), 14);
        assert_eq!(grid[0].day, day("2026-10-10"));
        assert_eq!(grid[0].transaction_type, TransactionType::Recharge);
        assert_eq!(grid[0].total, 150);
        assert_eq!(grid[1].total, 0);
        assert_eq!(grid[13].day, day("2026-10-16"));
        let spend_13 = grid
            .iter()
            .find(|d| d.day == day("2026-10-13") && d.transaction_type == TransactionType::Spend)
            .unwrap();
        assert_eq!(spend_13.total, 70);
        assert_eq!(grid.iter().map(|d| d.total).sum::<i64>(), 220);
    }

    #[test]
    fn test_local_day_boundaries() {
        let svc = ReportService::new(DatabaseConnection::Disconnected, 480);
        let midnight = svc.local_midnight_utc(day("2026-10-16"));
        assert_eq!(midnight.to_rfc3339(), "2026-10-15T16:00:00+00:00");
        assert_eq!(svc.local_day(midnight), day("2026-10-16"));
        assert_eq!(
            svc.local_day(midnight - Duration::seconds(1)),
            day("2026-10-15")
        );
    }

    struct Fixture {
        db: DatabaseConnection,
        shop: TenantContext,
        members: MemberService,
        ledger: LedgerService,
        reports: ReportService,
    }

    async fn fixture() -> Fixture {
        let db = setup_db().await;
        let shop = seed_owner(&db, "lily").await;
        Fixture {
            members: MemberService::new(db.clone()),
            ledger: LedgerService::new(db.clone(), CatalogService::new()),
            reports: ReportService::new(db.clone(), 480),
            db,
            shop,
        }
    }

    async fn add_member(fx: &Fixture, shop: &TenantContext, name: &str, phone: &str, opening: i64) -> i64 {
        fx.members
            .create_member(
                shop,
                CreateMemberRequest {
                    name: name.to_string(),
                    phone: phone.to_string(),
                    birthday: None,
                    note: None,
                    initial_balance: Some(opening),
                    initial_discount_bp: Some(9_000),
                },
            )
            .await
            .unwrap()
            .id
    }

    async fn spend(fx: &Fixture, member_id: i64, price: i64, with_signature: bool) -> i64 {
        fx.ledger
            .spend(
                &fx.shop,
                member_id,
                SpendRequest {
                    selections: vec![],
                    supplement: Some("纯色".to_string()),
                    price,
                    signature: with_signature.then(|| SignatureCapture {
                        width: 1,
                        height: 1,
                        rgba: STANDARD.encode([0u8, 0, 0, 255]),
                    }),
                },
            )
            .await
            .unwrap()
            .transaction
            .id
    }

    // 直接写入一条指定时间的历史流水
    async fn backdated(fx: &Fixture, member_id: i64, kind: TransactionType, amount: i64, at: DateTime<Utc>) {
        transactions::ActiveModel {
            member_id: Set(member_id),
            transaction_type: Set(kind),
            amount: Set(amount),
            detail: Set("历史流水".to_string()),
            date: Set(at),
            signature: Set(None),
            owner_username: Set(fx.shop.username.clone()),
            ..Default::default()
        }
        .insert(&fx.db)
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_weekly_report_matches_raw_rows() {
        let fx = fixture().await;
        let alice = add_member(&fx, &fx.shop, "Alice", "13800001234", 100_000).await;
        spend(&fx, alice, 5_000, false).await;
        spend(&fx, alice, 2_000, false).await;

        // 窗口外（8 天前）的流水不计入
        backdated(&fx, alice, TransactionType::Recharge, 999, Utc::now() - Duration::days(8)).await;
        backdated(&fx, alice, TransactionType::Spend, 300, Utc::now() - Duration::days(3)).await;

        let report = fx.reports.weekly_report(&fx.shop).await.unwrap();
        assert_eq!(report.days.len(), 14);
        assert_eq!(report.end_day, fx.reports.today());
        assert_eq!(report.total_recharge, 100_000);
        assert_eq!(report.total_spend, 4_500 + 1_800 + 300);

        let today_spend = report
            .days
            .iter()
            .find(|d| d.day == report.end_day && d.transaction_type == TransactionType::Spend)
            .unwrap();
        assert_eq!(today_spend.total, 6_300);
    }

    #[tokio::test]
    async fn test_weekly_report_is_tenant_scoped() {
        let fx = fixture().await;
        let rose = seed_owner(&fx.db, "rose").await;
        add_member(&fx, &rose, "Bob", "13900005678", 20_000).await;

        let report = fx.reports.weekly_report(&fx.shop).await.unwrap();
        assert_eq!(report.days.len(), 14);
        assert!(report.days.iter().all(|d| d.total == 0));
    }

    #[tokio::test]
    async fn test_list_transactions_filters_and_totals() {
        let fx = fixture().await;
        let alice = add_member(&fx, &fx.shop, "Alice", "13800001234", 100_000).await;
        let bob = add_member(&fx, &fx.shop, "Bob", "13900005678", 50_000).await;
        spend(&fx, alice, 5_000, true).await;
        spend(&fx, bob, 1_000, false).await;

        let all = fx
            .reports
            .list_transactions(&fx.shop, &TransactionListQuery::default())
            .await
            .unwrap();
        assert_eq!(all.total, 4);
        assert_eq!(all.total_recharge, 150_000);
        assert_eq!(all.total_spend, 4_500 + 900);
        // 最新在前
        assert_eq!(all.items[0].member_name, "Bob");
        assert_eq!(all.items[0].transaction_type, TransactionType::Spend);

        let alice_only = fx
            .reports
            .list_transactions(
                &fx.shop,
                &TransactionListQuery {
                    q: Some("1234".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(alice_only.total, 2);
        assert!(alice_only.items.iter().all(|i| i.member_phone == "13800001234"));
        assert_eq!(alice_only.total_recharge, 100_000);
        assert_eq!(alice_only.total_spend, 4_500);
        assert!(alice_only.items.iter().any(|i| i.has_signature));

        let dashed = fx
            .reports
            .list_transactions(
                &fx.shop,
                &TransactionListQuery {
                    q: Some("138-0000-1234".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(dashed.total, 2);
        assert_eq!(dashed.total_spend, 4_500);

        let paged = fx
            .reports
            .list_transactions(
                &fx.shop,
                &TransactionListQuery {
                    per_page: Some(1),
                    page: Some(2),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(paged.items.len(), 1);
        assert_eq!(paged.total_pages, 4);
        // 合计覆盖全部筛选结果，而非当前页
        assert_eq!(paged.total_spend, 4_500 + 900);
    }

    #[tokio::test]
    async fn test_list_transactions_date_range_includes_end_day() {
        let fx = fixture().await;
        let alice = add_member(&fx, &fx.shop, "Alice", "13800001234", 0).await;

        let reports = &fx.reports;
        let d1 = day("2026-03-01");
        // 店铺时区 3 月 1 日 23:30 与 3 月 2 日 00:30
        let late = reports.local_midnight_utc(d1) + Duration::minutes(23 * 60 + 30);
        let next = reports.local_midnight_utc(d1) + Duration::minutes(24 * 60 + 30);
        backdated(&fx, alice, TransactionType::Spend, 100, late).await;
        backdated(&fx, alice, TransactionType::Spend, 200, next).await;

        let listed = reports
            .list_transactions(
                &fx.shop,
                &TransactionListQuery {
                    start_date: Some(d1),
                    end_date: Some(d1),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(listed.total, 1);
        assert_eq!(listed.total_spend, 100);

        let err = reports
            .list_transactions(
                &fx.shop,
                &TransactionListQuery {
                    start_date: Some(day("2026-03-02")),
                    end_date: Some(d1),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }

    #[tokio::test]
    async fn test_signature_png_lookup() {
        let fx = fixture().await;
        let alice = add_member(&fx, &fx.shop, "Alice", "13800001234", 10_000).await;
        let signed = spend(&fx, alice, 1_000, true).await;
        let unsigned = spend(&fx, alice, 1_000, false).await;

        let png = fx.reports.signature_png(&fx.shop, signed).await.unwrap();
        assert_eq!(&png[..4], b"\x89PNG");

        let err = fx.reports.signature_png(&fx.shop, unsigned).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        let rose = seed_owner(&fx.db, "rose").await;
        let err = fx.reports.signature_png(&rose, signed).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        // 余额未被报表读取改变
        let account = accounts::Entity::find_by_id(alice).one(&fx.db).await.unwrap().unwrap();
        assert_eq!(account.balance, 10_000 - 1_800);
    }
}
