//! 金额与折扣换算
//!
//! 金额一律以分（cents）为单位的 `i64` 表示；折扣以 basis points 表示，
//! `10000` 即原价，`8800` 即 88 折。

use crate::error::{AppError, AppResult};

pub const NO_DISCOUNT_BP: i32 = 10_000;

/// 单笔金额与账户余额上限：1 亿元
pub const MAX_AMOUNT_CENTS: i64 = 10_000_000_000;

/// 充值时可选的折扣等级（另支持 [0, 10000] 内的自定义值）
pub const DISCOUNT_TIERS_BP: [i32; 7] = [10_000, 9_500, 9_000, 8_800, 8_000, 7_000, 6_000];

pub fn validate_discount_bp(discount_bp: i32) -> AppResult<()> {
    if !(0..=NO_DISCOUNT_BP).contains(&discount_bp) {
        return Err(AppError::ValidationError(
            "折扣必须在 0 到 10000 之间 (10000 表示原价)".to_string(),
        ));
    }
    Ok(())
}

pub fn validate_amount(amount: i64, field: &str) -> AppResult<()> {
    if amount < 0 {
        return Err(AppError::ValidationError(format!("{field}不能为负数")));
    }
    if amount > MAX_AMOUNT_CENTS {
        return Err(AppError::ValidationError(format!(
            "{field}不能超过 {}",
            format_cents(MAX_AMOUNT_CENTS)
        )));
    }
    Ok(())
}

/// 折后价 = 原价 × 折扣，四舍五入到分
pub fn apply_discount(price_cents: i64, discount_bp: i32) -> i64 {
    let raw = price_cents as i128 * discount_bp as i128;
    let half = NO_DISCOUNT_BP as i128 / 2;
    let rounded = if raw >= 0 {
        (raw + half) / NO_DISCOUNT_BP as i128
    } else {
        (raw - half) / NO_DISCOUNT_BP as i128
    };
    rounded as i64
}

/// 4500 -> "45.00"
pub fn format_cents(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    format!("{sign}{}.{:02}", abs / 100, abs % 100)
}

/// 9000 -> "0.90"
pub fn format_discount(discount_bp: i32) -> String {
    let hundredths = (discount_bp.max(0) + 50) / 100;
    format!("{}.{:02}", hundredths / 100, hundredths % 100)
}

/// 折扣展示文案：10000 -> 原价，9000 -> 9折，8800 -> 88折，8850 -> 88.5折
pub fn discount_label(discount_bp: i32) -> String {
    if discount_bp >= NO_DISCOUNT_BP {
        return "原价".to_string();
    }
    if discount_bp % 100 != 0 {
        return format!("{:.1}折", discount_bp as f64 / 100.0);
    }
    let percent = discount_bp / 100;
    if percent % 10 != 0 {
        format!("{percent}折")
    } else {
        format!("{}折", percent / 10)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_discount() {
        assert_eq!(apply_discount(5000, 9000), 4500);
        assert_eq!(apply_discount(5000, NO_DISCOUNT_BP), 5000);
        assert_eq!(apply_discount(12345, 8800), 10864); // 108.636 -> 108.64
        assert_eq!(apply_discount(1, 5000), 1); // 0.005 -> 0.01
        assert_eq!(apply_discount(0, 6000), 0);
        assert_eq!(apply_discount(999, 0), 0);
    }

    #[test]
    fn test_format_cents() {
        assert_eq!(format_cents(4500), "45.00");
        assert_eq!(format_cents(5), "0.05");
        assert_eq!(format_cents(-1050), "-10.50");
    }

    #[test]
    fn test_format_discount() {
        assert_eq!(format_discount(9000), "0.90");
        assert_eq!(format_discount(NO_DISCOUNT_BP), "1.00");
        assert_eq!(format_discount(8800), "0.88");
    }

    #[test]
    fn test_discount_label() {
        assert_eq!(discount_label(10_000), "原价");
        assert_eq!(discount_label(9_500), "95折");
        assert_eq!(discount_label(9_000), "9折");
        assert_eq!(discount_label(8_800), "88折");
        assert_eq!(discount_label(6_000), "6折");
        assert_eq!(discount_label(8_850), "88.5折");
    }

    #[test]
    fn test_validate_amount_bounds() {
        assert!(validate_amount(0, "金额").is_ok());
        assert!(validate_amount(MAX_AMOUNT_CENTS, "金额").is_ok());
        assert!(validate_amount(-1, "金额").is_err());
        assert!(validate_amount(MAX_AMOUNT_CENTS + 1, "金额").is_err());
        assert!(validate_amount(i64::MAX, "金额").is_err());
    }

    #[test]
    fn test_validate_discount_bp() {
        assert!(validate_discount_bp(0).is_ok());
        assert!(validate_discount_bp(10_000).is_ok());
        assert!(validate_discount_bp(10_001).is_err());
        assert!(validate_discount_bp(-1).is_err());
    }
}
