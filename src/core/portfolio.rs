// src/core/portfolio.rs
use crate::types::{CashMovement, Fill, Side};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum PortfolioError {
    #[error("The number you entered needs to be greater than zero! (got {0})")]
    NonPositiveAmount(Decimal),
    #[error("Initial investment cannot be negative (got {0})")]
    NegativeInitialInvestment(Decimal),
    #[error("The quantity needs to be greater than zero! (got {0})")]
    NonPositiveQuantity(Decimal),
    #[error("Invalid price {price} for {symbol}")]
    InvalidPrice { symbol: String, price: Decimal },
    #[error("You do not have enough buying power! (required {required}, available {available})")]
    InsufficientBuyingPower {
        required: Decimal,
        available: Decimal,
    },
    #[error("The stock symbol '{0}' is not in the portfolio.")]
    NotHeld(String),
    #[error("You do not have enough number of '{symbol}' stocks to sell (requested {requested}, held {held})")]
    InsufficientQuantity {
        symbol: String,
        requested: Decimal,
        held: Decimal,
    },
    #[error("No price available for held symbol {0}")]
    MissingPrice(String),
    #[error("The number you entered is too large!")]
    Overflow,
    #[error("Stored portfolio is invalid: {0}")]
    InvalidState(String),
}

/// Cash and positions of a single paper account.
///
/// Every operation validates first and mutates second, so an `Err` always
/// leaves the portfolio exactly as it was. All sums are checked, so an
/// oversized amount is rejected instead of overflowing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "StoredPortfolio")]
pub struct Portfolio {
    buying_power: Decimal,
    investment: Decimal,
    account_value: Decimal,
    holdings: BTreeMap<String, Decimal>,
}

/// On-disk shape, checked before it becomes a `Portfolio`.
#[derive(Deserialize)]
struct StoredPortfolio {
    buying_power: Decimal,
    investment: Decimal,
    account_value: Decimal,
    #[serde(default)]
    holdings: BTreeMap<String, Decimal>,
}

impl TryFrom<StoredPortfolio> for Portfolio {
    type Error = PortfolioError;

    fn try_from(stored: StoredPortfolio) -> Result<Self, Self::Error> {
        if stored.buying_power < Decimal::ZERO {
            return Err(PortfolioError::InvalidState(format!(
                "negative buying power {}",
                stored.buying_power
            )));
        }
        if let Some((symbol, qty)) = stored.holdings.iter().find(|(_, q)| **q <= Decimal::ZERO) {
            return Err(PortfolioError::InvalidState(format!(
                "non-positive quantity {} of {}",
                qty, symbol
            )));
        }
        Ok(Self {
            buying_power: stored.buying_power,
            investment: stored.investment,
            account_value: stored.account_value,
            holdings: stored.holdings,
        })
    }
}

impl Portfolio {
    pub fn open(initial: Decimal) -> Result<Self, PortfolioError> {
        if initial < Decimal::ZERO {
            return Err(PortfolioError::NegativeInitialInvestment(initial));
        }
        Ok(Self {
            buying_power: initial,
            investment: initial,
            account_value: initial,
            holdings: BTreeMap::new(),
        })
    }

    pub fn buying_power(&self) -> Decimal {
        self.buying_power
    }

    pub fn investment(&self) -> Decimal {
        self.investment
    }

    /// Value computed by the last successful `revalue`.
    pub fn account_value(&self) -> Decimal {
        self.account_value
    }

    pub fn holdings(&self) -> &BTreeMap<String, Decimal> {
        &self.holdings
    }

    pub fn quantity(&self, symbol: &str) -> Decimal {
        self.holdings.get(symbol).copied().unwrap_or(Decimal::ZERO)
    }

    pub fn is_flat(&self) -> bool {
        self.holdings.is_empty()
    }

    pub fn deposit(&mut self, amount: Decimal) -> Result<CashMovement, PortfolioError> {
        ensure_positive_amount(amount)?;
        let investment = checked(self.investment.checked_add(amount))?;
        let buying_power = checked(self.buying_power.checked_add(amount))?;
        self.investment = investment;
        self.buying_power = buying_power;
        Ok(CashMovement::Deposit(amount))
    }

    pub fn withdraw(&mut self, amount: Decimal) -> Result<CashMovement, PortfolioError> {
        ensure_positive_amount(amount)?;
        if amount > self.buying_power {
            return Err(PortfolioError::InsufficientBuyingPower {
                required: amount,
                available: self.buying_power,
            });
        }
        let investment = checked(self.investment.checked_sub(amount))?;
        self.investment = investment;
        self.buying_power -= amount;
        Ok(CashMovement::Withdrawal(amount))
    }

    pub fn buy(
        &mut self,
        symbol: &str,
        quantity: Decimal,
        price: Decimal,
    ) -> Result<Fill, PortfolioError> {
        ensure_positive_quantity(quantity)?;
        ensure_valid_price(symbol, price)?;

        let notional = checked(price.checked_mul(quantity))?;
        if notional > self.buying_power {
            return Err(PortfolioError::InsufficientBuyingPower {
                required: notional,
                available: self.buying_power,
            });
        }
        let held = checked(self.quantity(symbol).checked_add(quantity))?;

        self.holdings.insert(symbol.to_string(), held);
        self.buying_power -= notional;

        Ok(Fill {
            side: Side::Buy,
            symbol: symbol.to_string(),
            quantity,
            price,
            notional,
        })
    }

    /// Checks that `quantity` of `symbol` could be sold, without a price.
    pub fn check_sell(&self, symbol: &str, quantity: Decimal) -> Result<(), PortfolioError> {
        ensure_positive_quantity(quantity)?;
        let held = self
            .holdings
            .get(symbol)
            .copied()
            .ok_or_else(|| PortfolioError::NotHeld(symbol.to_string()))?;
        if quantity > held {
            return Err(PortfolioError::InsufficientQuantity {
                symbol: symbol.to_string(),
                requested: quantity,
                held,
            });
        }
        Ok(())
    }

    pub fn sell(
        &mut self,
        symbol: &str,
        quantity: Decimal,
        price: Decimal,
    ) -> Result<Fill, PortfolioError> {
        self.check_sell(symbol, quantity)?;
        ensure_valid_price(symbol, price)?;

        let notional = checked(price.checked_mul(quantity))?;
        let buying_power = checked(self.buying_power.checked_add(notional))?;
        let remaining = self.quantity(symbol) - quantity;
        if remaining.is_zero() {
            self.holdings.remove(symbol);
        } else {
            self.holdings.insert(symbol.to_string(), remaining);
        }
        self.buying_power = buying_power;

        Ok(Fill {
            side: Side::Sell,
            symbol: symbol.to_string(),
            quantity,
            price,
            notional,
        })
    }

    /// Recomputes `account_value` as cash plus the market value of every
    /// held position. Fails without touching state if a price is missing.
    pub fn revalue(&mut self, prices: &HashMap<String, Decimal>) -> Result<Decimal, PortfolioError> {
        let mut value = self.buying_power;
        for (symbol, quantity) in &self.holdings {
            let price = prices
                .get(symbol)
                .ok_or_else(|| PortfolioError::MissingPrice(symbol.clone()))?;
            let position = checked(price.checked_mul(*quantity))?;
            value = checked(value.checked_add(position))?;
        }
        self.account_value = value;
        Ok(value)
    }
}

fn checked(value: Option<Decimal>) -> Result<Decimal, PortfolioError> {
    value.ok_or(PortfolioError::Overflow)
}

fn ensure_positive_amount(amount: Decimal) -> Result<(), PortfolioError> {
    if amount <= Decimal::ZERO {
        return Err(PortfolioError::NonPositiveAmount(amount));
    }
    Ok(())
}

fn ensure_positive_quantity(quantity: Decimal) -> Result<(), PortfolioError> {
    if quantity <= Decimal::ZERO {
        return Err(PortfolioError::NonPositiveQuantity(quantity));
    }
    Ok(())
}

fn ensure_valid_price(symbol: &str, price: Decimal) -> Result<(), PortfolioError> {
    if price <= Decimal::ZERO {
        return Err(PortfolioError::InvalidPrice {
            symbol: symbol.to_string(),
            price,
        });
    }
    Ok(())
}
