use crate::error::{AppError, AppResult};
use crate::models::{CatalogResponse, CategorySelection, DiscountTier, ServiceCategory};
use crate::utils::{DISCOUNT_TIERS_BP, discount_label};
use std::collections::HashSet;
use std::sync::Arc;

/// 店内服务项目（大类 -> 细项）
const SERVICE_MENU: &[(&str, &[&str])] = &[
    ("手部", &["卸甲", "修补", "延长", "款式", "饰品"]),
    (
        "睫毛",
        &["卸睫毛", "漫画款", "婴儿弯", "YY单根", "设计款", "蛋白矫正"],
    ),
    ("足部", &["卸甲", "水晶矫正", "甲片", "款式", "足部护理"]),
    ("眉毛", &["野生眉", "线条眉", "雾眉", "洗眉"]),
];

#[derive(Clone)]
pub struct CatalogService {
    categories: Arc<Vec<ServiceCategory>>,
}

impl Default for CatalogService {
    fn default() -> Self {
        Self::new()
    }
}

impl CatalogService {
    pub fn new() -> Self {
        let categories = SERVICE_MENU
            .iter()
            .map(|(name, subs)| ServiceCategory {
                name: name.to_string(),
                sub_items: subs.iter().map(|s| s.to_string()).collect(),
            })
            .collect();
        Self {
            categories: Arc::new(categories),
        }
    }

    pub fn catalog(&self) -> CatalogResponse {
        CatalogResponse {
            categories: self.categories.as_ref().clone(),
            discount_tiers: DISCOUNT_TIERS_BP
                .iter()
                .map(|&bp| DiscountTier {
                    discount_bp: bp,
                    label: discount_label(bp),
                })
                .collect(),
        }
    }

    /// 校验消费项目并生成流水详情，例如 `手部(卸甲,款式) + 备注[加钻]`
    ///
    /// 校验顺序：
    /// 1. 至少勾选一个细项或填写补充说明
    /// 2. 每个已选大类都必须勾选细项
    /// 3. 大类与细项都必须在菜单内，大类与同一大类下的细项都不可重复
    pub fn describe_selection(
        &self,
        selections: &[CategorySelection],
        supplement: Option<&str>,
    ) -> AppResult<String> {
        let supplement = supplement.map(str::trim).filter(|s| !s.is_empty());

        let has_items = selections.iter().any(|s| !s.sub_items.is_empty());
        if !has_items && supplement.is_none() {
            return Err(AppError::ValidationError(
                "请至少选择一项服务或填写备注".to_string(),
            ));
        }

        if let Some(incomplete) = selections.iter().find(|s| s.sub_items.is_empty()) {
            return Err(AppError::ValidationError(format!(
                "请将已选大类 [{}] 的具体细项补充完整",
                incomplete.category.trim()
            )));
        }

        let mut seen = HashSet::new();
        let mut parts = Vec::with_capacity(selections.len() + 1);
        for selection in selections {
            let name = selection.category.trim();
            if !seen.insert(name) {
                return Err(AppError::ValidationError(format!("服务大类 [{name}] 重复")));
            }
            let category = self
                .categories
                .iter()
                .find(|c| c.name == name)
                .ok_or_else(|| AppError::ValidationError(format!("未知的服务大类: {name}")))?;

            let mut subs = Vec::with_capacity(selection.sub_items.len());
            for sub in &selection.sub_items {
                let sub = sub.trim();
                if !category.sub_items.iter().any(|s| s == sub) {
                    return Err(AppError::ValidationError(format!(
                        "服务大类 [{name}] 下没有细项: {sub}"
                    )));
                }
                if subs.contains(&sub) {
                    return Err(AppError::ValidationError(format!(
                        "服务大类 [{name}] 的细项 [{sub}] 重复"
                    )));
                }
                subs.push(sub);
            }
            parts.push(format!("{name}({})", subs.join(",")));
        }

        if let Some(text) = supplement {
            parts.push(format!("备注[{text}]"));
        }

        Ok(parts.join(" + "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sel(category: &str, subs: &[&str]) -> CategorySelection {
        CategorySelection {
            category: category.to_string(),
            sub_items: subs.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_detail_string_format() {
        let catalog = CatalogService::new();
        let detail = catalog
            .describe_selection(
                &[sel("手部", &["卸甲", "款式"]), sel("眉毛", &["雾眉"])],
                Some(" 加钻 "),
            )
            .unwrap();
        assert_eq!(detail, "手部(卸甲,款式) + 眉毛(雾眉) + 备注[加钻]");
    }

    #[test]
    fn test_supplement_only_is_accepted() {
        let catalog = CatalogService::new();
        let detail = catalog.describe_selection(&[], Some("纯色")).unwrap();
        assert_eq!(detail, "备注[纯色]");
    }

    #[test]
    fn test_empty_selection_rejected() {
        let catalog = CatalogService::new();
        let err = catalog.describe_selection(&[], Some("   ")).unwrap_err();
        assert!(matches!(err, AppError::ValidationError(msg) if msg.contains("至少")));
    }

    #[test]
    fn test_only_unfilled_category_hits_empty_check_first() {
        let catalog = CatalogService::new();
        let err = catalog
            .describe_selection(&[sel("足部", &[])], None)
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(msg) if msg.contains("至少")));
    }

    #[test]
    fn test_incomplete_category_rejected() {
        let catalog = CatalogService::new();
        let err = catalog
            .describe_selection(&[sel("手部", &["卸甲"]), sel("足部", &[])], None)
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(msg) if msg.contains("足部")));
    }

    #[test]
    fn test_unknown_items_rejected() {
        let catalog = CatalogService::new();
        assert!(
            catalog
                .describe_selection(&[sel("头发", &["剪发"])], None)
                .is_err()
        );
        assert!(
            catalog
                .describe_selection(&[sel("眉毛", &["卸甲"])], None)
                .is_err()
        );
        assert!(
            catalog
                .describe_selection(&[sel("手部", &["卸甲"]), sel("手部", &["款式"])], None)
                .is_err()
        );
    }

    #[test]
    fn test_repeated_sub_item_rejected() {
        let catalog = CatalogService::new();
        let err = catalog
            .describe_selection(&[sel("手部", &["卸甲", "款式", "卸甲"])], None)
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(msg) if msg.contains("卸甲")));
    }

    #[test]
    fn test_catalog_lists_menu_and_tiers() {
        let catalog = CatalogService::new().catalog();
        assert_eq!(catalog.categories.len(), 4);
        assert_eq!(catalog.discount_tiers.len(), 7);
        assert_eq!(catalog.discount_tiers[0].label, "原价");
        assert_eq!(catalog.discount_tiers[3].label, "88折");
    }
}
