// src/universe.rs
use anyhow::{Context, Result};
use std::collections::BTreeSet;
use std::path::Path;
use tracing::info;

/// Symbols the user is allowed to trade.
#[derive(Debug, Clone, Default)]
pub struct SymbolUniverse {
    // None = unrestricted
    symbols: Option<BTreeSet<String>>,
}

impl SymbolUniverse {
    /// Accepts any well-formed symbol.
    pub fn open() -> Self {
        Self { symbols: None }
    }

    pub fn from_symbols<I, S>(symbols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            symbols: Some(
                symbols
                    .into_iter()
                    .filter_map(|s| normalize(s.as_ref()))
                    .collect(),
            ),
        }
    }

    /// `*.csv` files are read by the `Symbol` column (or the first column);
    /// anything else must be a JSON array of strings.
    pub fn load(path: &Path) -> Result<Self> {
        let is_csv = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("csv"))
            .unwrap_or(false);

        let universe = if is_csv {
            Self::from_csv(path)?
        } else {
            let data = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read symbol list {}", path.display()))?;
            let symbols: Vec<String> = serde_json::from_str(&data)
                .with_context(|| format!("Symbol list {} is not a JSON array", path.display()))?;
            Self::from_symbols(symbols)
        };

        info!("Loaded {} tradable symbols from {}", universe.len(), path.display());
        Ok(universe)
    }

    fn from_csv(path: &Path) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_path(path)
            .with_context(|| format!("Failed to open symbol csv {}", path.display()))?;

        let column = reader
            .headers()?
            .iter()
            .position(|h| h.eq_ignore_ascii_case("symbol"))
            .unwrap_or(0);

        let mut symbols = Vec::new();
        for record in reader.records() {
            let record = record.with_context(|| format!("Malformed row in {}", path.display()))?;
            if let Some(field) = record.get(column) {
                symbols.push(field.to_string());
            }
        }
        Ok(Self::from_symbols(symbols))
    }

    pub fn is_restricted(&self) -> bool {
        self.symbols.is_some()
    }

    pub fn len(&self) -> usize {
        self.symbols.as_ref().map(|s| s.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Normalized symbol if it is tradable.
    pub fn resolve(&self, input: &str) -> Option<String> {
        let symbol = normalize(input)?;
        match &self.symbols {
            Some(set) if !set.contains(&symbol) => None,
            _ => Some(symbol),
        }
    }
}

/// Trimmed, uppercased symbol. Empty input or inner whitespace is rejected.
pub fn normalize(input: &str) -> Option<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() || trimmed.chars().any(char::is_whitespace) {
        return None;
    }
    Some(trimmed.to_ascii_uppercase())
}
