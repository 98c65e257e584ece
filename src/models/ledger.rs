use crate::entities::{TransactionType, transaction_entity};
use crate::models::AccountResponse;
use crate::utils::format_cents;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RechargeRequest {
    /// 充值金额（分），允许为 0（仅调整折扣等级）
    #[schema(example = 100000)]
    pub amount: i64,
    /// 新折扣（basis points），10000 = 原价
    #[schema(example = 9000)]
    pub discount_bp: i32,
}

/// 某个服务大类下勾选的细项
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CategorySelection {
    #[schema(example = "手部")]
    pub category: String,
    #[serde(default)]
    pub sub_items: Vec<String>,
}

/// 画布采集的签字：原始 RGBA 像素（base64）
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SignatureCapture {
    pub width: u32,
    pub height: u32,
    pub rgba: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SpendRequest {
    #[serde(default)]
    pub selections: Vec<CategorySelection>,
    /// 补充说明 / 其他项目
    #[serde(default)]
    pub supplement: Option<String>,
    /// 订单原价总额（分）
    #[schema(example = 5000)]
    pub price: i64,
    #[serde(default)]
    pub signature: Option<SignatureCapture>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TransactionResponse {
    pub id: i64,
    pub member_id: i64,
    pub transaction_type: TransactionType,
    pub amount: i64,
    pub amount_display: String,
    pub detail: String,
    pub date: DateTime<Utc>,
    pub has_signature: bool,
}

impl From<transaction_entity::Model> for TransactionResponse {
    fn from(m: transaction_entity::Model) -> Self {
        Self {
            id: m.id,
            member_id: m.member_id,
            transaction_type: m.transaction_type,
            amount: m.amount,
            amount_display: format_cents(m.amount),
            detail: m.detail,
            date: m.date,
            has_signature: m.signature.as_deref().is_some_and(|s| !s.is_empty()),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RechargeResponse {
    pub account: AccountResponse,
    pub transaction: TransactionResponse,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SpendResponse {
    pub price: i64,
    pub final_price: i64,
    pub account: AccountResponse,
    pub transaction: TransactionResponse,
}
