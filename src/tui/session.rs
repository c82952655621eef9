// src/tui/session.rs
use super::menu::{format_status, parse_amount, MenuChoice, MENU};
use super::Terminal;
use crate::connectors::traits::QuoteSource;
use crate::core::desk::{DeskError, TradingDesk};
use crate::core::portfolio::{Portfolio, PortfolioError};
use crate::storage::{
    authenticate, register, validate_user_id, AccountRecord, AccountStore, StorageError,
};
use crate::utils::precision::{display_cash, display_quantity};
use anyhow::Result;
use rust_decimal::Decimal;
use tracing::info;

const MAX_LOGIN_ATTEMPTS: usize = 3;

enum Flow {
    Continue,
    Exit,
}

enum Entry {
    Value(Decimal),
    // bad input, already reported
    Rejected,
    Closed,
}

/// Signs an existing user in or opens a new account. `None` when the user
/// gives up or input ends.
pub async fn login<T, S>(term: &mut T, store: &S) -> Result<Option<AccountRecord>>
where
    T: Terminal + ?Sized,
    S: AccountStore + ?Sized,
{
    term.print("Welcome to the Paper Desk trading platform.")?;

    let user_id = loop {
        let Some(input) = term.prompt("Enter your user id: ")? else {
            return Ok(None);
        };
        match validate_user_id(&input) {
            Ok(id) => break id,
            Err(e) => term.print(&e.to_string())?,
        }
    };

    match store.find(&user_id).await? {
        Some(_) => sign_in(term, store, &user_id).await,
        None => sign_up(term, store, &user_id).await,
    }
}

async fn sign_in<T, S>(term: &mut T, store: &S, user_id: &str) -> Result<Option<AccountRecord>>
where
    T: Terminal + ?Sized,
    S: AccountStore + ?Sized,
{
    for _ in 0..MAX_LOGIN_ATTEMPTS {
        let Some(password) = term.prompt_secret("Enter your password: ")? else {
            return Ok(None);
        };
        match authenticate(store, user_id, &password).await {
            Ok(record) => {
                term.print(&format!("Welcome back, {}!", record.user_id))?;
                return Ok(Some(record));
            }
            Err(e @ StorageError::InvalidCredentials) => term.print(&e.to_string())?,
            Err(e) => return Err(e.into()),
        }
    }
    term.print("Too many failed attempts.")?;
    Ok(None)
}

async fn sign_up<T, S>(term: &mut T, store: &S, user_id: &str) -> Result<Option<AccountRecord>>
where
    T: Terminal + ?Sized,
    S: AccountStore + ?Sized,
{
    term.print(&format!("No account found for '{}', let's create one.", user_id))?;

    let password = loop {
        let Some(password) = term.prompt_secret("Choose a password: ")? else {
            return Ok(None);
        };
        if password.is_empty() {
            term.print("The password cannot be empty!")?;
            continue;
        }
        let Some(confirm) = term.prompt_secret("Repeat the password: ")? else {
            return Ok(None);
        };
        if password != confirm {
            term.print("The passwords do not match!")?;
            continue;
        }
        break password;
    };

    let initial = loop {
        let label = "Enter the amount you want to invest in your portfolio: ";
        let Some(input) = term.prompt(label)? else {
            return Ok(None);
        };
        match parse_amount(&input) {
            Ok(amount) => break amount,
            Err(e) => term.print(&e.to_string())?,
        }
    };

    let record = register(store, user_id, &password, Portfolio::open(initial)?).await?;
    term.print("Congratulations!! You have successfully created your portfolio!!")?;
    Ok(Some(record))
}

/// Menu loop: pause, clear, show status, dispatch one operation.
pub async fn run<T, Q, S>(term: &mut T, desk: &mut TradingDesk<Q, S>) -> Result<()>
where
    T: Terminal + ?Sized,
    Q: QuoteSource,
    S: AccountStore,
{
    info!(
        "Session started for {} (buying power {}, {} positions)",
        desk.user_id(),
        desk.portfolio().buying_power(),
        desk.portfolio().holdings().len()
    );
    loop {
        term.pause()?;
        term.clear()?;

        let snapshot = desk.refresh().await;
        term.print(&format!("Account: {}", snapshot.user_id))?;
        term.print(&format_status(&snapshot))?;

        let Some(selection) = term.prompt(MENU)? else {
            break;
        };
        let choice = match selection.parse::<MenuChoice>() {
            Ok(choice) => choice,
            Err(e) => {
                term.print(&e.to_string())?;
                continue;
            }
        };

        if choice == MenuChoice::Quit {
            term.print("Thanks for using our platform!")?;
            break;
        }
        if let Flow::Exit = dispatch(term, desk, choice).await? {
            break;
        }
    }
    info!("Session ended for {}", desk.user_id());
    Ok(())
}

async fn dispatch<T, Q, S>(
    term: &mut T,
    desk: &mut TradingDesk<Q, S>,
    choice: MenuChoice,
) -> Result<Flow>
where
    T: Terminal + ?Sized,
    Q: QuoteSource,
    S: AccountStore,
{
    match choice {
        MenuChoice::Buy | MenuChoice::Sell => {
            let Some(input) = term.prompt("Enter the stock name: ")? else {
                return Ok(Flow::Exit);
            };
            let symbol = match desk.resolve_symbol(&input) {
                Ok(symbol) => symbol,
                Err(e) => {
                    term.print(&e.to_string())?;
                    return Ok(Flow::Continue);
                }
            };

            let verb = if choice == MenuChoice::Buy { "buy" } else { "sell" };
            let label = format!("Enter the number of stock {} you want to {}: ", symbol, verb);
            let quantity = match read_amount(term, &label)? {
                Entry::Value(quantity) => quantity,
                Entry::Rejected => return Ok(Flow::Continue),
                Entry::Closed => return Ok(Flow::Exit),
            };

            let message = if choice == MenuChoice::Buy {
                desk.buy(&symbol, quantity).await.map(|fill| {
                    format!(
                        "You have successfully added {} {} to your portfolio.",
                        display_quantity(fill.quantity),
                        fill.symbol
                    )
                })
            } else {
                desk.sell(&symbol, quantity).await.map(|fill| {
                    format!(
                        "You have successfully sold {} {} from your portfolio.",
                        display_quantity(fill.quantity),
                        fill.symbol
                    )
                })
            };
            report(term, choice, message)?;
        }
        MenuChoice::Deposit | MenuChoice::Withdraw => {
            let label = if choice == MenuChoice::Deposit {
                "How much you want to increase your investment? "
            } else {
                "Enter the number you want to withdraw from your account: "
            };
            let amount = match read_amount(term, label)? {
                Entry::Value(amount) => amount,
                Entry::Rejected => return Ok(Flow::Continue),
                Entry::Closed => return Ok(Flow::Exit),
            };

            let message = if choice == MenuChoice::Deposit {
                desk.deposit(amount).await.map(|_| {
                    format!(
                        "You have successfully added {} to your account.",
                        display_cash(amount)
                    )
                })
            } else {
                desk.withdraw(amount).await.map(|_| {
                    format!(
                        "You have successfully withdrawn {} from your account.",
                        display_cash(amount)
                    )
                })
            };
            report(term, choice, message)?;
        }
        MenuChoice::Quit => return Ok(Flow::Exit),
    }
    Ok(Flow::Continue)
}

fn read_amount<T: Terminal + ?Sized>(term: &mut T, label: &str) -> Result<Entry> {
    let Some(input) = term.prompt(label)? else {
        return Ok(Entry::Closed);
    };
    match parse_amount(&input) {
        Ok(amount) => Ok(Entry::Value(amount)),
        Err(e) => {
            term.print(&e.to_string())?;
            Ok(Entry::Rejected)
        }
    }
}

fn report<T: Terminal + ?Sized>(
    term: &mut T,
    choice: MenuChoice,
    outcome: std::result::Result<String, DeskError>,
) -> Result<()> {
    let line = match outcome {
        Ok(message) => message,
        Err(DeskError::Portfolio(PortfolioError::InsufficientBuyingPower { .. }))
            if choice == MenuChoice::Withdraw =>
        {
            "You do not have enough liquidity!".to_string()
        }
        Err(DeskError::Portfolio(PortfolioError::InsufficientBuyingPower { .. })) => {
            "You do not have enough buying power!".to_string()
        }
        Err(DeskError::Portfolio(PortfolioError::InsufficientQuantity { symbol, .. })) => {
            format!("You do not have enough number of '{}' stocks to sell", symbol)
        }
        Err(e) => e.to_string(),
    };
    term.print(&line)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::JsonAccountStore;
    use crate::types::Quote;
    use crate::universe::SymbolUniverse;
    use anyhow::anyhow;
    use async_trait::async_trait;
    use std::collections::{HashMap, VecDeque};

    struct ScriptedTerminal {
        input: VecDeque<String>,
        output: Vec<String>,
    }

    impl ScriptedTerminal {
        fn new(lines: &[&str]) -> Self {
            Self {
                input: lines.iter().map(|l| l.to_string()).collect(),
                output: Vec::new(),
            }
        }

        fn printed(&self, needle: &str) -> bool {
            self.output.iter().any(|l| l.contains(needle))
        }
    }

    impl Terminal for ScriptedTerminal {
        fn print(&mut self, line: &str) -> Result<()> {
            self.output.push(line.to_string());
            Ok(())
        }

        fn prompt(&mut self, label: &str) -> Result<Option<String>> {
            self.output.push(label.to_string());
            Ok(self.input.pop_front())
        }

        fn prompt_secret(&mut self, label: &str) -> Result<Option<String>> {
            self.prompt(label)
        }

        fn pause(&mut self) -> Result<()> {
            Ok(())
        }

        fn clear(&mut self) -> Result<()> {
            Ok(())
        }
    }

    struct FixedQuotes(HashMap<String, Decimal>);

    #[async_trait]
    impl QuoteSource for FixedQuotes {
        async fn fetch_quote(&self, symbol: &str) -> Result<Quote> {
            let price = self
                .0
                .get(symbol)
                .copied()
                .ok_or_else(|| anyhow!("no quote for {}", symbol))?;
            Ok(Quote {
                symbol: symbol.to_string(),
                price,
                currency: None,
                timestamp: 0,
            })
        }
    }

    fn quotes() -> FixedQuotes {
        FixedQuotes(HashMap::from([("AAPL".to_string(), Decimal::from(100))]))
    }

    #[tokio::test]
    async fn new_user_signs_up_then_trades() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("accounts.json");
        let store = JsonAccountStore::new(&path);

        let mut term = ScriptedTerminal::new(&["alice", "pw", "pw", "abc", "1000"]);
        let record = login(&mut term, &store).await.unwrap().unwrap();
        assert!(term.printed("The value you entered is invalid!"));
        assert!(term.printed("Congratulations!!"));

        let mut term = ScriptedTerminal::new(&[
            "1", "aapl", "3", // buy
            "2", "AAPL", "5", // sell too many
            "4", "5000", // withdraw too much
            "3", "-1", // bad deposit
            "7", // bad menu choice
            "0",
        ]);
        let mut desk = TradingDesk::new(record, quotes(), store, SymbolUniverse::open());
        run(&mut term, &mut desk).await.unwrap();

        assert!(term.printed("You have successfully added 3 AAPL to your portfolio."));
        assert!(term.printed("You do not have enough number of 'AAPL' stocks to sell"));
        assert!(term.printed("You do not have enough liquidity!"));
        assert!(term.printed("The number you entered needs to be greater than zero!"));
        assert!(term.printed("Please select 1, 2, 3, 4, or 0"));
        assert!(term.printed("Thanks for using our platform!"));
        assert_eq!(desk.portfolio().buying_power(), Decimal::from(700));

        let stored = JsonAccountStore::new(&path).find("alice").await.unwrap().unwrap();
        assert_eq!(stored.portfolio.quantity("AAPL"), Decimal::from(3));
    }

    #[tokio::test]
    async fn oversized_entries_are_reported_and_session_continues() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonAccountStore::new(dir.path().join("accounts.json"));
        let record = register(&store, "dave", "pw", Portfolio::open(Decimal::from(500)).unwrap())
            .await
            .unwrap();
        let mut desk = TradingDesk::new(record, quotes(), store, SymbolUniverse::open());

        let max = "79228162514264337593543950335";
        let mut term = ScriptedTerminal::new(&["1", "AAPL", max, "3", max, "3", "1", "0"]);
        run(&mut term, &mut desk).await.unwrap();

        let rejected = term
            .output
            .iter()
            .filter(|l| l.contains("The number you entered is too large!"))
            .count();
        assert_eq!(rejected, 2);
        assert!(term.printed("Thanks for using our platform!"));
        assert_eq!(desk.portfolio().buying_power(), Decimal::from(501));
        assert!(desk.portfolio().is_flat());
    }

    #[tokio::test]
    async fn existing_user_gets_three_password_attempts() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonAccountStore::new(dir.path().join("accounts.json"));
        register(&store, "bob", "right", Portfolio::open(Decimal::from(10)).unwrap())
            .await
            .unwrap();

        let mut term = ScriptedTerminal::new(&["bob", "a", "b", "c", "right"]);
        assert!(login(&mut term, &store).await.unwrap().is_none());
        assert!(term.printed("Too many failed attempts."));

        let mut term = ScriptedTerminal::new(&["bob", "wrong", "right"]);
        let record = login(&mut term, &store).await.unwrap().unwrap();
        assert_eq!(record.user_id, "bob");
        assert!(term.printed("Welcome back, bob!"));
    }

    #[tokio::test]
    async fn unknown_symbol_and_end_of_input() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonAccountStore::new(dir.path().join("accounts.json"));
        let record = register(&store, "carol", "pw", Portfolio::open(Decimal::from(50)).unwrap())
            .await
            .unwrap();
        let universe = SymbolUniverse::from_symbols(["AAPL"]);
        let mut desk = TradingDesk::new(record, quotes(), store, universe);

        let mut term = ScriptedTerminal::new(&["1", "TSLA"]);
        run(&mut term, &mut desk).await.unwrap();
        assert!(term.printed("The symbol you entered is invalid!"));
        assert!(desk.portfolio().is_flat());
    }
}
