// src/core/desk.rs
use crate::connectors::traits::QuoteSource;
use crate::core::portfolio::{Portfolio, PortfolioError};
use crate::storage::{AccountRecord, AccountStore, StorageError};
use crate::types::{AccountSnapshot, CashMovement, Fill, Quote};
use crate::universe::SymbolUniverse;
use chrono::Utc;
use futures::future::try_join_all;
use rust_decimal::Decimal;
use std::collections::HashMap;
use thiserror::Error;
use tracing::{debug, error, info, warn};

#[derive(Debug, Error)]
pub enum DeskError {
    #[error(transparent)]
    Portfolio(#[from] PortfolioError),
    #[error("The symbol you entered is invalid! ({0})")]
    UnknownSymbol(String),
    #[error("Could not get a price: {0:#}")]
    Quote(anyhow::Error),
    #[error("Could not save your account: {0}")]
    Storage(#[from] StorageError),
}

/// Binds one logged-in account to a price feed and its store.
///
/// Mutations run against a copy of the portfolio. The copy is persisted
/// first and only then replaces the in-memory state, so memory and disk
/// never diverge.
pub struct TradingDesk<Q, S> {
    account: AccountRecord,
    quotes: Q,
    store: S,
    universe: SymbolUniverse,
}

impl<Q, S> TradingDesk<Q, S>
where
    Q: QuoteSource,
    S: AccountStore,
{
    pub fn new(account: AccountRecord, quotes: Q, store: S, universe: SymbolUniverse) -> Self {
        Self {
            account,
            quotes,
            store,
            universe,
        }
    }

    pub fn user_id(&self) -> &str {
        &self.account.user_id
    }

    pub fn portfolio(&self) -> &Portfolio {
        &self.account.portfolio
    }

    /// Universe check up front, so the UI can reject a symbol before asking
    /// for a quantity.
    pub fn resolve_symbol(&self, input: &str) -> Result<String, DeskError> {
        self.universe
            .resolve(input)
            .ok_or_else(|| DeskError::UnknownSymbol(input.trim().to_string()))
    }

    pub async fn buy(&mut self, symbol: &str, quantity: Decimal) -> Result<Fill, DeskError> {
        let symbol = self.resolve_symbol(symbol)?;
        if quantity <= Decimal::ZERO {
            return Err(PortfolioError::NonPositiveQuantity(quantity).into());
        }

        let quote = self.quote(&symbol).await?;
        let fill = self
            .commit(|p| p.buy(&symbol, quantity, quote.price))
            .await?;
        info!(
            "Paper {}: {} {} @ {} (Notional: {})",
            fill.side, fill.quantity, fill.symbol, fill.price, fill.notional
        );
        Ok(fill)
    }

    pub async fn sell(&mut self, symbol: &str, quantity: Decimal) -> Result<Fill, DeskError> {
        let symbol = self.resolve_symbol(symbol)?;
        // no quote request for a position that cannot be sold
        self.account.portfolio.check_sell(&symbol, quantity)?;

        let quote = self.quote(&symbol).await?;
        let fill = self
            .commit(|p| p.sell(&symbol, quantity, quote.price))
            .await?;
        info!(
            "Paper {}: {} {} @ {} (Notional: {})",
            fill.side, fill.quantity, fill.symbol, fill.price, fill.notional
        );
        Ok(fill)
    }

    pub async fn deposit(&mut self, amount: Decimal) -> Result<CashMovement, DeskError> {
        let movement = self.commit(|p| p.deposit(amount)).await?;
        info!("Deposit of {} into {}", amount, self.account.user_id);
        Ok(movement)
    }

    pub async fn withdraw(&mut self, amount: Decimal) -> Result<CashMovement, DeskError> {
        let movement = self.commit(|p| p.withdraw(amount)).await?;
        info!("Withdrawal of {} from {}", amount, self.account.user_id);
        Ok(movement)
    }

    /// Revalues the account at live prices and persists the new value.
    /// When a quote or the save fails, the last stored valuation is returned
    /// flagged as stale.
    pub async fn refresh(&mut self) -> AccountSnapshot {
        match self.revalue().await {
            Ok(()) => self.snapshot(false),
            Err(e) => {
                warn!("Valuation refresh failed: {}", e);
                self.snapshot(true)
            }
        }
    }

    async fn revalue(&mut self) -> Result<(), DeskError> {
        let prices = self.current_prices().await?;
        self.commit(|p| p.revalue(&prices)).await?;
        Ok(())
    }

    async fn current_prices(&self) -> Result<HashMap<String, Decimal>, DeskError> {
        if self.account.portfolio.is_flat() {
            return Ok(HashMap::new());
        }
        let symbols: Vec<&String> = self.account.portfolio.holdings().keys().collect();
        let quotes = try_join_all(symbols.iter().map(|s| self.quote(s.as_str()))).await?;
        Ok(quotes
            .into_iter()
            .zip(symbols)
            .map(|(quote, symbol)| (symbol.clone(), quote.price))
            .collect())
    }

    pub fn snapshot(&self, stale: bool) -> AccountSnapshot {
        let portfolio = &self.account.portfolio;
        AccountSnapshot {
            user_id: self.account.user_id.clone(),
            buying_power: portfolio.buying_power(),
            investment: portfolio.investment(),
            account_value: portfolio.account_value(),
            holdings: portfolio.holdings().clone(),
            stale,
        }
    }

    async fn quote(&self, symbol: &str) -> Result<Quote, DeskError> {
        let quote = self.quotes.fetch_quote(symbol).await.map_err(|e| {
            error!("Quote for {} failed: {:#}", symbol, e);
            DeskError::Quote(e)
        })?;
        debug!(
            "{} quoted at {} {}",
            symbol,
            quote.price,
            quote.currency.as_deref().unwrap_or("")
        );
        Ok(quote)
    }

    async fn commit<T, F>(&mut self, apply: F) -> Result<T, DeskError>
    where
        F: FnOnce(&mut Portfolio) -> Result<T, PortfolioError>,
    {
        let mut next = self.account.clone();
        let outcome = apply(&mut next.portfolio)?;
        if next.portfolio == self.account.portfolio {
            return Ok(outcome);
        }

        next.updated_at = Utc::now();
        self.store.save(&next).await?;
        self.account = next;
        Ok(outcome)
    }
}
