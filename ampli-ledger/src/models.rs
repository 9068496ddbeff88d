use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Payment event status.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    Pending,
    Succeeded,
    Failed,
    Refunded,
}

impl TransactionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            TransactionStatus::Pending => "pending",
            TransactionStatus::Succeeded => "succeeded",
            TransactionStatus::Failed => "failed",
            TransactionStatus::Refunded => "refunded",
        }
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A payment event, independent of fulfillment. Order linkage lives in
/// `metadata` only; one transaction may fund several orders.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Uuid,
    pub customer_id: Option<Uuid>,
    pub amount: Decimal,
    pub currency: String,
    pub status: TransactionStatus,
    pub fees: Decimal,
    /// `amount - fees`, set once the transaction succeeds.
    pub net_amount: Option<Decimal>,
    /// The payment gateway's reference, also the idempotency key for webhooks.
    pub gateway_reference: Option<String>,
    pub description: Option<String>,
    pub metadata: serde_json::Value,
    pub processed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Transaction {
    pub fn new(
        customer_id: Option<Uuid>,
        amount: Decimal,
        currency: String,
        fees: Decimal,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            customer_id,
            amount,
            currency,
            status: TransactionStatus::Pending,
            fees,
            net_amount: None,
            gateway_reference: None,
            description: None,
            metadata: serde_json::json!({}),
            processed_at: None,
            created_at: now,
            updated_at: now,
        }
    }
}
