// src/tui/menu.rs
use crate::types::AccountSnapshot;
use crate::utils::precision::{display_cash, display_quantity};
use rust_decimal::Decimal;
use std::str::FromStr;
use thiserror::Error;

pub const MENU: &str = "Which operation would you like to do? Please choose an option by entering the corresponding number:\n\
1 - Buy a stock\n\
2 - Sell a stock\n\
3 - Increase your investment\n\
4 - Withdraw from your account\n\
0 - Quit";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    Buy,
    Sell,
    Deposit,
    Withdraw,
    Quit,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Please select 1, 2, 3, 4, or 0")]
pub struct UnknownChoice;

impl FromStr for MenuChoice {
    type Err = UnknownChoice;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "1" => Ok(MenuChoice::Buy),
            "2" => Ok(MenuChoice::Sell),
            "3" => Ok(MenuChoice::Deposit),
            "4" => Ok(MenuChoice::Withdraw),
            "0" => Ok(MenuChoice::Quit),
            _ => Err(UnknownChoice),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AmountError {
    #[error("The value you entered is invalid!")]
    Invalid,
    #[error("The number you entered needs to be greater than zero!")]
    NotPositive,
}

/// Parses a strictly positive decimal typed by the user.
pub fn parse_amount(input: &str) -> Result<Decimal, AmountError> {
    let value = Decimal::from_str(input.trim())
        .or_else(|_| Decimal::from_scientific(input.trim()))
        .map_err(|_| AmountError::Invalid)?;
    if value <= Decimal::ZERO {
        return Err(AmountError::NotPositive);
    }
    Ok(value)
}

pub fn format_status(snapshot: &AccountSnapshot) -> String {
    let holdings = snapshot
        .holdings
        .iter()
        .map(|(symbol, qty)| format!("'{}': {}", symbol, display_quantity(*qty)))
        .collect::<Vec<_>>()
        .join(", ");

    let mut status = format!(
        "Your buying power is: {}, your account value is {}, your investment is {}, and the stocks in your portfolio are {{{}}}",
        display_cash(snapshot.buying_power),
        display_cash(snapshot.account_value),
        display_cash(snapshot.investment),
        holdings
    );
    if snapshot.stale {
        status.push_str("\n(prices unavailable, showing the last known account value)");
    }
    status
}
