use crate::entities::TransactionType;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// 某一天某一类型的合计
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct DailyTotal {
    pub day: NaiveDate,
    pub transaction_type: TransactionType,
    pub total: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct WeeklyReportResponse {
    pub start_day: NaiveDate,
    pub end_day: NaiveDate,
    pub days: Vec<DailyTotal>,
    pub total_recharge: i64,
    pub total_spend: i64,
}

#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct TransactionListQuery {
    /// 会员搜索词（手机号 / 姓名 / 4 位尾号）
    pub q: Option<String>,
    /// 起始日期（含）YYYY-MM-DD
    pub start_date: Option<NaiveDate>,
    /// 结束日期（含）YYYY-MM-DD
    pub end_date: Option<NaiveDate>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TransactionListItem {
    pub id: i64,
    pub member_id: i64,
    pub member_name: String,
    pub member_phone: String,
    pub transaction_type: TransactionType,
    pub amount: i64,
    pub detail: String,
    pub date: DateTime<Utc>,
    pub has_signature: bool,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TransactionListResponse {
    pub items: Vec<TransactionListItem>,
    pub page: i64,
    pub page_size: i64,
    pub total: i64,
    pub total_pages: i64,
    /// 筛选范围内（非仅当前页）的充值合计
    pub total_recharge: i64,
    /// 筛选范围内（非仅当前页）的消费合计
    pub total_spend: i64,
}
