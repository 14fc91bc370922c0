//! Immutable market metadata and lot conversions.
//!
//! The DEX stores prices as quote lots per base lot and sizes as base lots.
//! [`Market`] converts between those and human units using the mint decimals
//! loaded alongside the market state.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use solana_pubkey::Pubkey;

use crate::dex::{
    DexError, DexResult, Event, MarketState, NewOrderV3Params, SelfTradeBehavior, SlabLeaf,
};
use crate::dex::constants::DEFAULT_MATCH_LIMIT;
use crate::types::{Fill, NewOrder, Order, Side};

/// A loaded market. Never changes after `initialize`.
#[derive(Debug, Clone, PartialEq)]
pub struct Market {
    address: Pubkey,
    program_id: Pubkey,
    state: MarketState,
    base_decimals: u8,
    quote_decimals: u8,
    base_multiplier: Decimal,
    quote_multiplier: Decimal,
    tick_size: Decimal,
    min_order_size: Decimal,
}

fn multiplier(decimals: u8) -> DexResult<Decimal> {
    10u64
        .checked_pow(decimals as u32)
        .map(Decimal::from)
        .ok_or_else(|| DexError::InvalidLotSize(format!("{} decimals cannot be scaled", decimals)))
}

/// `value * mul_a * mul_b / (div_a * div_b)` with overflow checks
fn mul_div(
    value: Decimal,
    mul_a: Decimal,
    mul_b: Decimal,
    div_a: Decimal,
    div_b: Decimal,
) -> DexResult<Decimal> {
    let numerator = value
        .checked_mul(mul_a)
        .and_then(|v| v.checked_mul(mul_b))
        .ok_or(DexError::Overflow)?;
    let denominator = div_a.checked_mul(div_b).ok_or(DexError::Overflow)?;
    numerator
        .checked_div(denominator)
        .map(|v| v.normalize())
        .ok_or(DexError::Overflow)
}

fn to_lots(value: Decimal) -> DexResult<u64> {
    value.round().to_u64().ok_or(DexError::Overflow)
}

impl Market {
    /// Build a market from its decoded state and mint decimals.
    pub fn new(
        address: Pubkey,
        program_id: Pubkey,
        state: MarketState,
        base_decimals: u8,
        quote_decimals: u8,
    ) -> DexResult<Self> {
        if state.base_lot_size == 0 || state.quote_lot_size == 0 {
            return Err(DexError::InvalidLotSize(format!(
                "base {} / quote {}",
                state.base_lot_size, state.quote_lot_size
            )));
        }

        let mut market = Self {
            address,
            program_id,
            state,
            base_decimals,
            quote_decimals,
            base_multiplier: multiplier(base_decimals)?,
            quote_multiplier: multiplier(quote_decimals)?,
            tick_size: Decimal::ZERO,
            min_order_size: Decimal::ZERO,
        };
        market.tick_size = market.price_lots_to_number(1)?;
        market.min_order_size = market.base_size_lots_to_number(1)?;
        Ok(market)
    }

    pub fn address(&self) -> &Pubkey {
        &self.address
    }

    pub fn program_id(&self) -> &Pubkey {
        &self.program_id
    }

    /// Decoded on-chain market state
    pub fn state(&self) -> &MarketState {
        &self.state
    }

    pub fn base_mint(&self) -> &Pubkey {
        &self.state.base_mint
    }

    pub fn quote_mint(&self) -> &Pubkey {
        &self.state.quote_mint
    }

    pub fn base_decimals(&self) -> u8 {
        self.base_decimals
    }

    pub fn quote_decimals(&self) -> u8 {
        self.quote_decimals
    }

    pub fn base_lot_size(&self) -> u64 {
        self.state.base_lot_size
    }

    pub fn quote_lot_size(&self) -> u64 {
        self.state.quote_lot_size
    }

    pub fn fee_rate_bps(&self) -> u64 {
        self.state.fee_rate_bps
    }

    /// Smallest price increment in quote units
    pub fn tick_size(&self) -> Decimal {
        self.tick_size
    }

    /// Smallest order size in base units
    pub fn min_order_size(&self) -> Decimal {
        self.min_order_size
    }

    // ========================================================================
    // Lot conversions
    // ========================================================================

    /// Convert a price in lots to quote units per base unit.
    pub fn price_lots_to_number(&self, lots: u64) -> DexResult<Decimal> {
        mul_div(
            Decimal::from(lots),
            Decimal::from(self.state.quote_lot_size),
            self.base_multiplier,
            Decimal::from(self.state.base_lot_size),
            self.quote_multiplier,
        )
    }

    /// Convert a price to lots, rounding to the nearest tick.
    pub fn price_number_to_lots(&self, price: Decimal) -> DexResult<u64> {
        to_lots(mul_div(
            price,
            self.quote_multiplier,
            Decimal::from(self.state.base_lot_size),
            self.base_multiplier,
            Decimal::from(self.state.quote_lot_size),
        )?)
    }

    /// Convert a size in base lots to base units.
    pub fn base_size_lots_to_number(&self, lots: u64) -> DexResult<Decimal> {
        mul_div(
            Decimal::from(lots),
            Decimal::from(self.state.base_lot_size),
            Decimal::ONE,
            self.base_multiplier,
            Decimal::ONE,
        )
    }

    /// Convert a size in base units to lots, rounding to the nearest lot.
    pub fn base_size_number_to_lots(&self, size: Decimal) -> DexResult<u64> {
        to_lots(mul_div(
            size,
            self.base_multiplier,
            Decimal::ONE,
            Decimal::from(self.state.base_lot_size),
            Decimal::ONE,
        )?)
    }

    // ========================================================================
    // Decoding helpers
    // ========================================================================

    /// Build an [`Order`] from a slab leaf on the given side.
    pub fn order_from_leaf(&self, leaf: &SlabLeaf, side: Side) -> DexResult<Order> {
        Ok(Order {
            order_id: leaf.key,
            client_id: leaf.client_order_id,
            side,
            price: self.price_lots_to_number(leaf.price_lots())?,
            size: self.base_size_lots_to_number(leaf.quantity)?,
            price_lots: leaf.price_lots(),
            size_lots: leaf.quantity,
            open_orders_address: leaf.owner,
            fee_tier: leaf.fee_tier,
        })
    }

    /// Build a [`Fill`] from a fill event. Returns `None` for events that moved no base tokens.
    pub fn fill_from_event(&self, event: &Event) -> DexResult<Option<Fill>> {
        let released = Decimal::from(event.native_quantity_released);
        let paid = Decimal::from(event.native_quantity_paid);
        let fee = Decimal::from(event.native_fee_or_rebate);

        // Bids pay quote and receive base; asks pay base and receive quote
        let (side, quote_before_fees, base_native) = if event.is_bid() {
            let quote = if event.is_maker() { paid + fee } else { paid - fee };
            (Side::Buy, quote, released)
        } else {
            let quote = if event.is_maker() { released - fee } else { released + fee };
            (Side::Sell, quote, paid)
        };

        if base_native.is_zero() {
            return Ok(None);
        }

        let price = mul_div(
            quote_before_fees,
            self.base_multiplier,
            Decimal::ONE,
            self.quote_multiplier,
            base_native,
        )?;
        let size = base_native
            .checked_div(self.base_multiplier)
            .ok_or(DexError::Overflow)?
            .normalize();
        let fee_cost = fee
            .checked_div(self.quote_multiplier)
            .ok_or(DexError::Overflow)?
            .normalize();

        Ok(Some(Fill {
            order_id: event.order_id,
            client_order_id: event.client_order_id,
            side,
            price,
            size,
            fee_cost: if event.is_maker() { -fee_cost } else { fee_cost },
            maker: event.is_maker(),
            open_orders: event.open_orders,
            seq_num: event.seq_num,
        }))
    }

    /// Convert an order request into NewOrderV3 fields.
    pub fn new_order_params(&self, order: &NewOrder) -> DexResult<NewOrderV3Params> {
        let limit_price = self.price_number_to_lots(order.price)?;
        let max_base_quantity = self.base_size_number_to_lots(order.size)?;
        let max_native_quote_quantity_including_fees = self
            .state
            .quote_lot_size
            .checked_mul(max_base_quantity)
            .and_then(|v| v.checked_mul(limit_price))
            .ok_or(DexError::Overflow)?;

        Ok(NewOrderV3Params {
            side: order.side.into(),
            limit_price,
            max_base_quantity,
            max_native_quote_quantity_including_fees,
            self_trade_behavior: SelfTradeBehavior::default(),
            order_type: order.order_type.into(),
            client_order_id: order.client_id.unwrap_or_default(),
            limit: DEFAULT_MATCH_LIMIT,
        })
    }
}

#[cfg(test)]
pub(crate) mod test_utils {
    use super::*;

    /// SOL/USDC-shaped market: 9 base decimals, 6 quote decimals,
    /// 0.1 SOL base lots, 0.0001 USDC quote lots.
    pub fn sol_usdc_market() -> Market {
        let state = MarketState {
            own_address: Pubkey::new_from_array([1; 32]),
            base_mint: Pubkey::new_from_array([2; 32]),
            quote_mint: Pubkey::new_from_array([3; 32]),
            bids: Pubkey::new_from_array([4; 32]),
            asks: Pubkey::new_from_array([5; 32]),
            event_queue: Pubkey::new_from_array([6; 32]),
            base_lot_size: 100_000_000,
            quote_lot_size: 100,
            fee_rate_bps: 22,
            ..Default::default()
        };
        Market::new(
            state.own_address,
            Pubkey::new_from_array([9; 32]),
            state,
            9,
            6,
        )
        .unwrap()
    }
}
