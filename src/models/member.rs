use crate::entities::{account_entity, member_entity};
use crate::utils::{discount_label, format_cents};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateMemberRequest {
    #[schema(example = "王小美")]
    pub name: String,
    #[schema(example = "13800000000")]
    pub phone: String,
    #[schema(example = "2000-01-01")]
    pub birthday: Option<NaiveDate>,
    #[serde(default)]
    pub note: Option<String>,
    /// 开卡充值金额（分），缺省为 0
    #[serde(default)]
    pub initial_balance: Option<i64>,
    /// 开卡折扣（basis points），缺省为 10000（原价）
    #[serde(default)]
    pub initial_discount_bp: Option<i32>,
}

/// 完整档案修改，未提供的字段保持不变
#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdateMemberRequest {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub birthday: Option<NaiveDate>,
    /// 管理员直接更正余额（分），不写流水
    pub balance: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UpdateNoteRequest {
    pub note: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MemberSearchQuery {
    /// 手机号 / 姓名 / 4 位手机尾号
    pub q: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AccountResponse {
    pub balance: i64,
    pub balance_display: String,
    pub current_discount_bp: i32,
    pub discount_label: String,
}

impl From<account_entity::Model> for AccountResponse {
    fn from(m: account_entity::Model) -> Self {
        Self {
            balance: m.balance,
            balance_display: format_cents(m.balance),
            current_discount_bp: m.current_discount_bp,
            discount_label: discount_label(m.current_discount_bp),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MemberResponse {
    pub id: i64,
    pub name: String,
    pub phone: String,
    pub birthday: Option<NaiveDate>,
    pub note: String,
    pub created_at: DateTime<Utc>,
    pub account: Option<AccountResponse>,
}

impl MemberResponse {
    pub fn from_parts(member: member_entity::Model, account: Option<account_entity::Model>) -> Self {
        Self {
            id: member.id,
            name: member.name,
            phone: member.phone,
            birthday: member.birthday,
            note: member.note,
            created_at: member.created_at,
            account: account.map(AccountResponse::from),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SearchStatus {
    NotFound,
    Resolved,
    Ambiguous,
}

/// 查询结果：0 条 / 1 条 / 多条需要调用方进一步确认
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MemberSearchResponse {
    pub status: SearchStatus,
    pub members: Vec<MemberResponse>,
}

impl MemberSearchResponse {
    pub fn from_matches(members: Vec<MemberResponse>) -> Self {
        let status = match members.len() {
            0 => SearchStatus::NotFound,
            1 => SearchStatus::Resolved,
            _ => SearchStatus::Ambiguous,
        };
        Self { status, members }
    }
}
