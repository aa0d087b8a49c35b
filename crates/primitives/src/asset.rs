//! Asset identifier definitions.

use derive_more::Display;
use serde::{Deserialize, Serialize};

/// Stock ticker symbol identifying one column of a panel.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Display, Serialize, Deserialize)]
pub struct Symbol(pub String);

impl Symbol {
    /// Create a new symbol.
    #[must_use]
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the symbol as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Symbol {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for Symbol {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Generate placeholder symbols `A0`, `A1`, ... for `n` anonymous assets.
#[must_use]
pub fn anonymous_symbols(n: usize) -> Vec<Symbol> {
    (0..n).map(|i| Symbol(format!("A{i}"))).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbol_from_str() {
        let sym: Symbol = "AAPL".into();
        assert_eq!(sym.as_str(), "AAPL");
        assert_eq!(sym.to_string(), "AAPL");
    }

    #[test]
    fn anonymous_symbols_are_indexed() {
        let symbols = anonymous_symbols(3);
        assert_eq!(symbols, vec![Symbol::new("A0"), Symbol::new("A1"), Symbol::new("A2")]);
    }
}
