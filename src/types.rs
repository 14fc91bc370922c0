//! Domain types exchanged between a session, its venue, and callers.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use solana_pubkey::Pubkey;

use crate::dex::{DexOrderType, DexSide};

pub use crate::dex::OpenOrdersAccount;

// ============================================================================
// Enums
// ============================================================================

/// Order side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// Buy base tokens, pay quote tokens
    Buy,
    /// Sell base tokens, receive quote tokens
    Sell,
}

impl From<Side> for DexSide {
    fn from(side: Side) -> Self {
        match side {
            Side::Buy => DexSide::Bid,
            Side::Sell => DexSide::Ask,
        }
    }
}

/// Order type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum OrderType {
    /// Rests on the book if not immediately matched
    #[default]
    #[serde(rename = "limit")]
    Limit,
    /// Matches what it can immediately, the remainder is discarded
    #[serde(rename = "ioc")]
    ImmediateOrCancel,
    /// Rejected if it would match on entry
    #[serde(rename = "postOnly")]
    PostOnly,
}

impl From<OrderType> for DexOrderType {
    fn from(order_type: OrderType) -> Self {
        match order_type {
            OrderType::Limit => DexOrderType::Limit,
            OrderType::ImmediateOrCancel => DexOrderType::ImmediateOrCancel,
            OrderType::PostOnly => DexOrderType::PostOnly,
        }
    }
}

// ============================================================================
// Orders
// ============================================================================

/// An order request that has not been acknowledged by the venue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewOrder {
    pub side: Side,
    /// Limit price in quote units per base unit
    pub price: Decimal,
    /// Size in base units
    pub size: Decimal,
    pub order_type: OrderType,
    /// Token account debited for the order (quote for buys, base for sells)
    pub payer: Pubkey,
    /// Caller-chosen id echoed back on the resting order and its fills
    pub client_id: Option<u64>,
}

impl NewOrder {
    /// Create a limit order request.
    pub fn limit(side: Side, price: Decimal, size: Decimal, payer: Pubkey) -> Self {
        Self {
            side,
            price,
            size,
            order_type: OrderType::Limit,
            payer,
            client_id: None,
        }
    }

    /// Set the order type.
    pub fn with_order_type(mut self, order_type: OrderType) -> Self {
        self.order_type = order_type;
        self
    }

    /// Set the client order id.
    pub fn with_client_id(mut self, client_id: u64) -> Self {
        self.client_id = Some(client_id);
        self
    }
}

/// An order resting on the venue's book
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    /// Venue-assigned order id
    pub order_id: u128,
    pub client_id: u64,
    pub side: Side,
    pub price: Decimal,
    /// Remaining size in base units
    pub size: Decimal,
    pub price_lots: u64,
    pub size_lots: u64,
    /// Open orders account holding the order
    pub open_orders_address: Pubkey,
    pub fee_tier: u8,
}

/// A matched trade
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fill {
    pub order_id: u128,
    pub client_order_id: u64,
    pub side: Side,
    pub price: Decimal,
    pub size: Decimal,
    /// Fee paid in quote units (negative for maker rebates)
    pub fee_cost: Decimal,
    pub maker: bool,
    pub open_orders: Pubkey,
    /// Event queue sequence number, increasing with time
    pub seq_num: u64,
}

// ============================================================================
// Reports
// ============================================================================

/// Outcome of a completed cancel-all sweep
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CancelReport {
    /// Order ids cancelled, in request order
    pub cancelled: Vec<u128>,
}

/// Outcome of a completed settlement sweep
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SettlementReport {
    /// Open orders accounts settled, in request order
    pub settled: Vec<Pubkey>,
    /// Open orders accounts skipped for having no free balance
    pub skipped: Vec<Pubkey>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_side_serialization() {
        assert_eq!(serde_json::to_string(&Side::Buy).unwrap(), r#""buy""#);
        assert_eq!(serde_json::to_string(&Side::Sell).unwrap(), r#""sell""#);
        let side: Side = serde_json::from_str(r#""sell""#).unwrap();
        assert_eq!(side, Side::Sell);
    }

    #[test]
    fn test_order_type_serialization() {
        assert_eq!(serde_json::to_string(&OrderType::Limit).unwrap(), r#""limit""#);
        assert_eq!(
            serde_json::to_string(&OrderType::ImmediateOrCancel).unwrap(),
            r#""ioc""#
        );
        let order_type: OrderType = serde_json::from_str(r#""postOnly""#).unwrap();
        assert_eq!(order_type, OrderType::PostOnly);
    }

    #[test]
    fn test_wire_conversions() {
        assert_eq!(DexSide::from(Side::Buy), DexSide::Bid);
        assert_eq!(DexSide::from(Side::Sell), DexSide::Ask);
        assert_eq!(
            DexOrderType::from(OrderType::ImmediateOrCancel),
            DexOrderType::ImmediateOrCancel
        );
    }

    #[test]
    fn test_new_order_builder() {
        let payer = Pubkey::new_from_array([1; 32]);
        let order = NewOrder::limit(Side::Buy, dec!(20.5), dec!(10), payer)
            .with_order_type(OrderType::PostOnly)
            .with_client_id(42);
        assert_eq!(order.order_type, OrderType::PostOnly);
        assert_eq!(order.client_id, Some(42));
        assert_eq!(order.price, dec!(20.5));
    }
}
