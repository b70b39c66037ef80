//! Fee policy
//!
//! Order-level charges on top of the item subtotal. The policy is a
//! seam so deployments can plug in their own fee schedule without
//! touching checkout.

use rust_decimal::Decimal;
use shared::models::DeliveryType;

use crate::orders::money::round_money;

/// Order-level charges applied at checkout.
#[derive(Debug, Clone, Default)]
pub struct FeeBreakdown {
    pub delivery_fee: Decimal,
    pub service_fee: Decimal,
    pub tax: Decimal,
    pub discount: Decimal,
}

pub trait FeePolicy: Send + Sync {
    fn fees(&self, subtotal: Decimal, delivery_type: DeliveryType) -> FeeBreakdown;
}

/// Launch pricing: no fees, no tax, no discounts.
pub struct ZeroFees;

impl FeePolicy for ZeroFees {
    fn fees(&self, _subtotal: Decimal, _delivery_type: DeliveryType) -> FeeBreakdown {
        FeeBreakdown::default()
    }
}

/// Final amount: subtotal + delivery + service + tax - discount.
pub fn order_total(subtotal: Decimal, fees: &FeeBreakdown) -> Decimal {
    round_money(subtotal + fees.delivery_fee + fees.service_fee + fees.tax - fees.discount)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_fees_total_is_subtotal() {
        let subtotal = Decimal::new(12345, 2);
        let fees = ZeroFees.fees(subtotal, DeliveryType::Delivery);
        assert_eq!(order_total(subtotal, &fees), subtotal);
    }

    #[test]
    fn test_total_formula() {
        let fees = FeeBreakdown {
            delivery_fee: Decimal::new(500, 2),
            service_fee: Decimal::new(150, 2),
            tax: Decimal::new(90, 2),
            discount: Decimal::new(200, 2),
        };
        // 100.00 + 5.00 + 1.50 + 0.90 - 2.00 = 105.40
        assert_eq!(
            order_total(Decimal::new(10000, 2), &fees),
            Decimal::new(10540, 2)
        );
    }
}
