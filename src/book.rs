//! L2 order book snapshots.
//!
//! Resting orders are aggregated by price lot into levels: bids sorted
//! descending by price, asks ascending.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::dex::DexResult;
use crate::market::Market;
use crate::types::{Order, Side};

/// Aggregated size at one price
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceLevel {
    pub price: Decimal,
    pub size: Decimal,
    pub price_lots: u64,
    pub size_lots: u64,
}

/// Point-in-time view of both sides of a market
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderbookSnapshot {
    /// Bid levels, sorted by price descending
    pub bids: Vec<PriceLevel>,
    /// Ask levels, sorted by price ascending
    pub asks: Vec<PriceLevel>,
}

impl OrderbookSnapshot {
    /// Get the best bid (highest bid price)
    pub fn best_bid(&self) -> Option<&PriceLevel> {
        self.bids.first()
    }

    /// Get the best ask (lowest ask price)
    pub fn best_ask(&self) -> Option<&PriceLevel> {
        self.asks.first()
    }

    /// Get the spread (best_ask - best_bid), floored at zero
    pub fn spread(&self) -> Option<Decimal> {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) => Some((ask.price - bid.price).max(Decimal::ZERO)),
            _ => None,
        }
    }

    /// Get the midpoint price
    pub fn midpoint(&self) -> Option<Decimal> {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) => Some((bid.price + ask.price) / Decimal::TWO),
            _ => None,
        }
    }

    /// Get total bid depth (sum of all bid sizes)
    pub fn total_bid_depth(&self) -> Decimal {
        self.bids.iter().map(|level| level.size).sum()
    }

    /// Get total ask depth (sum of all ask sizes)
    pub fn total_ask_depth(&self) -> Decimal {
        self.asks.iter().map(|level| level.size).sum()
    }
}

/// Aggregate one side's resting orders into at most `depth` levels.
///
/// Input order does not matter. Orders on the other side are ignored.
pub fn aggregate_levels(
    market: &Market,
    orders: &[Order],
    side: Side,
    depth: usize,
) -> DexResult<Vec<PriceLevel>> {
    let mut levels: BTreeMap<u64, u64> = BTreeMap::new();
    for order in orders.iter().filter(|order| order.side == side) {
        let size = levels.entry(order.price_lots).or_insert(0);
        *size = size.saturating_add(order.size_lots);
    }

    let to_level = |(&price_lots, &size_lots): (&u64, &u64)| -> DexResult<PriceLevel> {
        Ok(PriceLevel {
            price: market.price_lots_to_number(price_lots)?,
            size: market.base_size_lots_to_number(size_lots)?,
            price_lots,
            size_lots,
        })
    };

    match side {
        Side::Buy => levels.iter().rev().take(depth).map(to_level).collect(),
        Side::Sell => levels.iter().take(depth).map(to_level).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::test_utils::sol_usdc_market;
    use rust_decimal_macros::dec;
    use solana_pubkey::Pubkey;

    fn order(side: Side, price_lots: u64, size_lots: u64) -> Order {
        Order {
            order_id: ((price_lots as u128) << 64) | size_lots as u128,
            client_id: 0,
            side,
            price: Decimal::ZERO,
            size: Decimal::ZERO,
            price_lots,
            size_lots,
            open_orders_address: Pubkey::default(),
            fee_tier: 0,
        }
    }

    #[test]
    fn test_bids_descending_and_aggregated() {
        let market = sol_usdc_market();
        let orders = vec![
            order(Side::Buy, 20_000, 10),
            order(Side::Buy, 20_500, 5),
            order(Side::Buy, 20_000, 15),
            order(Side::Sell, 30_000, 1),
        ];
        let levels = aggregate_levels(&market, &orders, Side::Buy, 20).unwrap();
        assert_eq!(levels.len(), 2);
        assert_eq!(levels[0].price, dec!(20.5));
        assert_eq!(levels[0].size_lots, 5);
        assert_eq!(levels[1].price, dec!(20));
        assert_eq!(levels[1].size_lots, 25);
        assert_eq!(levels[1].size, dec!(2.5));
    }

    #[test]
    fn test_asks_ascending_and_truncated() {
        let market = sol_usdc_market();
        let orders: Vec<Order> = [23_000, 21_000, 25_000, 22_000]
            .into_iter()
            .map(|price| order(Side::Sell, price, 1))
            .collect();
        let levels = aggregate_levels(&market, &orders, Side::Sell, 3).unwrap();
        let prices: Vec<u64> = levels.iter().map(|l| l.price_lots).collect();
        assert_eq!(prices, vec![21_000, 22_000, 23_000]);
    }

    #[test]
    fn test_zero_depth_is_empty() {
        let market = sol_usdc_market();
        let orders = vec![order(Side::Buy, 1, 1)];
        assert!(aggregate_levels(&market, &orders, Side::Buy, 0).unwrap().is_empty());
    }

    #[test]
    fn test_snapshot_helpers() {
        let market = sol_usdc_market();
        let orders = vec![
            order(Side::Buy, 20_000, 10),
            order(Side::Buy, 19_000, 20),
            order(Side::Sell, 21_000, 5),
        ];
        let snapshot = OrderbookSnapshot {
            bids: aggregate_levels(&market, &orders, Side::Buy, 10).unwrap(),
            asks: aggregate_levels(&market, &orders, Side::Sell, 10).unwrap(),
        };
        assert_eq!(snapshot.best_bid().unwrap().price, dec!(20));
        assert_eq!(snapshot.best_ask().unwrap().price, dec!(21));
        assert_eq!(snapshot.spread(), Some(dec!(1)));
        assert_eq!(snapshot.midpoint(), Some(dec!(20.5)));
        assert_eq!(snapshot.total_bid_depth(), dec!(3));
        assert_eq!(snapshot.total_ask_depth(), dec!(0.5));
    }

    #[test]
    fn test_empty_snapshot() {
        let snapshot = OrderbookSnapshot::default();
        assert!(snapshot.best_bid().is_none());
        assert!(snapshot.spread().is_none());
        assert!(snapshot.midpoint().is_none());
    }
}
