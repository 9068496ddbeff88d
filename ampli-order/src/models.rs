use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Order status in the fulfillment lifecycle.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Processing,
    InProgress,
    Completed,
    Partial,
    Cancelled,
    Failed,
}

impl OrderStatus {
    /// Terminal states never transition again, not even via status refresh.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            OrderStatus::Completed | OrderStatus::Cancelled | OrderStatus::Failed
        )
    }

    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, next),
            (Pending, Processing)
                | (Pending, Cancelled)
                | (Processing, InProgress)
                | (Processing, Cancelled)
                | (Processing, Failed)
                | (InProgress, Completed)
                | (InProgress, Partial)
                | (InProgress, Cancelled)
                | (InProgress, Failed)
                | (Partial, Completed)
                | (Partial, Failed)
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Processing => "processing",
            OrderStatus::InProgress => "in_progress",
            OrderStatus::Completed => "completed",
            OrderStatus::Partial => "partial",
            OrderStatus::Cancelled => "cancelled",
            OrderStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A customer's purchase of a catalog service, fulfilled by a provider SKU.
///
/// Invariants: `final_price >= 0`, `profit = final_price - provider_cost`,
/// `quantity` within the chosen SKU's bounds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceOrder {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub service_id: Uuid,
    pub provider_service_id: Uuid,
    /// Target link or handle the engagement is delivered to.
    pub link: String,
    pub quantity: i32,
    pub original_price: Decimal,
    pub final_price: Decimal,
    pub provider_cost: Decimal,
    pub profit: Decimal,
    pub status: OrderStatus,
    /// Progress telemetry reported by the provider.
    pub start_count: Option<i32>,
    pub remains: Option<i32>,
    pub provider_order_id: Option<String>,
    pub notes: Option<String>,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl ServiceOrder {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        customer_id: Uuid,
        service_id: Uuid,
        provider_service_id: Uuid,
        link: String,
        quantity: i32,
        original_price: Decimal,
        final_price: Decimal,
        provider_cost: Decimal,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            customer_id,
            service_id,
            provider_service_id,
            link,
            quantity,
            original_price,
            final_price,
            provider_cost,
            profit: final_price - provider_cost,
            status: OrderStatus::Pending,
            start_count: None,
            remains: None,
            provider_order_id: None,
            notes: None,
            metadata: serde_json::json!({}),
            created_at: now,
            updated_at: now,
            completed_at: None,
        }
    }

    /// Apply a status transition, stamping timestamps. Callers check
    /// `can_transition_to` first; persistence enforces it again via the
    /// guarded write.
    pub fn transition(&mut self, next: OrderStatus) {
        self.status = next;
        self.updated_at = Utc::now();
        if next == OrderStatus::Completed {
            self.completed_at = Some(self.updated_at);
        }
    }
}
