use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A sellable catalog entry shown to customers.
///
/// Identity is immutable; pricing and visibility are not. A service referenced
/// by open orders is only ever soft-deactivated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Service {
    pub id: Uuid,
    pub title: String,
    /// Retail price per delivered unit.
    pub price: Decimal,
    pub features: Vec<String>,
    pub is_popular: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Service {
    pub fn new(title: String, price: Decimal, features: Vec<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            title,
            price,
            features,
            is_popular: false,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }
}
