use rust_decimal::Decimal;

/// Seam between the catalog price and the price the customer is charged.
/// Discount campaigns plug in here.
pub trait PricingPolicy: Send + Sync {
    /// Final price for an order given the catalog total for `quantity` units.
    fn final_price(&self, original: Decimal, quantity: i32) -> Decimal;
}

/// No discount rules configured: charge the catalog price.
pub struct PassThrough;

impl PricingPolicy for PassThrough {
    fn final_price(&self, original: Decimal, _quantity: i32) -> Decimal {
        original
    }
}
