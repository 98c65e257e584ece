use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ServiceCategory {
    pub name: String,
    pub sub_items: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DiscountTier {
    pub discount_bp: i32,
    pub label: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CatalogResponse {
    pub categories: Vec<ServiceCategory>,
    pub discount_tiers: Vec<DiscountTier>,
}
