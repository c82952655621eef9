// src/types.rs
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Buy,
    Sell,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => write!(f, "BUY"),
            Side::Sell => write!(f, "SELL"),
        }
    }
}

/// Last observed price for a symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub symbol: String,
    pub price: Decimal,
    pub currency: Option<String>,
    pub timestamp: i64, // unix seconds
}

/// Result of an executed paper trade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fill {
    pub side: Side,
    pub symbol: String,
    pub quantity: Decimal,
    pub price: Decimal,
    pub notional: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CashMovement {
    Deposit(Decimal),
    Withdrawal(Decimal),
}

/// What the status line shows. `stale` means the valuation is the last
/// stored one because fresh quotes could not be fetched.
#[derive(Debug, Clone, PartialEq)]
pub struct AccountSnapshot {
    pub user_id: String,
    pub buying_power: Decimal,
    pub investment: Decimal,
    pub account_value: Decimal,
    pub holdings: BTreeMap<String, Decimal>,
    pub stale: bool,
}
