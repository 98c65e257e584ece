use crate::error::{AppError, AppResult};
use regex::Regex;
use std::sync::LazyLock;

static PHONE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+?\d{5,20}$").expect("valid phone regex"));

/// 去掉首尾空白以及常见分隔符（空格、横线）
pub fn normalize_phone(phone: &str) -> String {
    phone
        .trim()
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .collect()
}

/// 查询串看起来像手机号（数字、+、空格、横线）时按入库规则规范化，否则原样返回
pub fn phone_search_key(query: &str) -> String {
    let query = query.trim();
    let phone_like = query.chars().any(|c| c.is_ascii_digit())
        && query
            .chars()
            .all(|c| c.is_ascii_digit() || c == '+' || c == '-' || c.is_whitespace());
    if phone_like {
        normalize_phone(query)
    } else {
        query.to_string()
    }
}

/// 验证手机号格式：5-20 位数字，可带前导 +
pub fn validate_phone(phone: &str) -> AppResult<()> {
    if !PHONE_REGEX.is_match(phone) {
        return Err(AppError::ValidationError(
            "手机号格式无效，应为 5-20 位数字".to_string(),
        ));
    }
    Ok(())
}

/// 恰好 4 位数字才视为手机尾号查询
pub fn is_phone_suffix_query(query: &str) -> bool {
    query.len() == 4 && query.bytes().all(|b| b.is_ascii_digit())
}

/// 转义 LIKE 通配符，配合 `ESCAPE '\'` 使用
pub fn escape_like(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
