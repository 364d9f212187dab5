//! Financial symbol disambiguation and currency pair validation

use crate::error::{ResolveError, Result};
use regex::Regex;
use std::sync::LazyLock;

/// Crypto tickers and their CoinGecko ids
const CRYPTO_COINS: [(&str, &str); 29] = [
    ("BTC", "bitcoin"),
    ("ETH", "ethereum"),
    ("XRP", "ripple"),
    ("SOL", "solana"),
    ("ADA", "cardano"),
    ("DOGE", "dogecoin"),
    ("DOT", "polkadot"),
    ("AVAX", "avalanche-2"),
    ("LINK", "chainlink"),
    ("MATIC", "matic-network"),
    ("UNI", "uniswap"),
    ("SHIB", "shiba-inu"),
    ("LTC", "litecoin"),
    ("BCH", "bitcoin-cash"),
    ("ATOM", "cosmos"),
    ("XLM", "stellar"),
    ("ALGO", "algorand"),
    ("FIL", "filecoin"),
    ("NEAR", "near"),
    ("APT", "aptos"),
    ("ARB", "arbitrum"),
    ("OP", "optimism"),
    ("BNB", "binancecoin"),
    ("TRX", "tron"),
    ("ETC", "ethereum-classic"),
    ("XMR", "monero"),
    ("PEPE", "pepe"),
    ("SUI", "sui"),
    ("SEI", "sei-network"),
];

/// Quote currencies commonly appended to crypto tickers (`BTCUSDT`)
const QUOTE_SUFFIXES: [&str; 4] = ["USDT", "USD", "EUR", "GBP"];

static TICKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Z0-9.\-\^=]{1,12}$").unwrap_or_else(|e| panic!("invalid ticker pattern: {e}"))
});

/// What a raw financial symbol refers to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedSymbol {
    Crypto { symbol: String, coin_id: &'static str },
    Equity { ticker: String },
}

/// CoinGecko id for a crypto ticker
pub fn coin_id(symbol: &str) -> Option<&'static str> {
    CRYPTO_COINS
        .iter()
        .find(|(ticker, _)| *ticker == symbol)
        .map(|(_, id)| *id)
}

fn crypto_base(symbol: &str) -> Option<(&str, &'static str)> {
    if let Some(id) = coin_id(symbol) {
        return Some((symbol, id));
    }

    QUOTE_SUFFIXES.iter().find_map(|suffix| {
        let base = symbol.strip_suffix(*suffix).filter(|base| !base.is_empty())?;
        coin_id(base).map(|id| (base, id))
    })
}

/// Resolve a raw symbol, preferring crypto over equities
pub fn resolve_symbol(raw: &str) -> Result<ResolvedSymbol> {
    let symbol = raw.trim().to_uppercase();
    if symbol.is_empty() {
        return Err(ResolveError::SymbolUnresolved(
            "a ticker or crypto symbol is required".to_string(),
        ));
    }

    if let Some((base, coin_id)) = crypto_base(&symbol) {
        return Ok(ResolvedSymbol::Crypto {
            symbol: base.to_string(),
            coin_id,
        });
    }

    if TICKER.is_match(&symbol) {
        Ok(ResolvedSymbol::Equity { ticker: symbol })
    } else {
        Err(ResolveError::SymbolUnresolved(format!(
            "'{}' is neither a known cryptocurrency nor a valid ticker",
            raw.trim()
        )))
    }
}

/// A validated currency conversion request
#[derive(Debug, Clone, PartialEq)]
pub struct CurrencyPair {
    pub from: String,
    pub to: String,
    pub amount: f64,
}

impl CurrencyPair {
    pub fn is_identity(&self) -> bool {
        self.from == self.to
    }
}

fn currency_code(raw: &str, field: &str) -> Result<String> {
    let code = raw.trim().to_uppercase();
    if code.len() == 3 && code.chars().all(|c| c.is_ascii_alphabetic()) {
        Ok(code)
    } else if code.is_empty() {
        Err(ResolveError::InvalidArguments(format!("{field} is required for currency queries")))
    } else {
        Err(ResolveError::InvalidArguments(format!(
            "{field} must be a 3-letter currency code, got '{}'",
            raw.trim()
        )))
    }
}

/// Validate a conversion request; the amount defaults to 1
pub fn resolve_currency_pair(from: &str, to: &str, amount: Option<f64>) -> Result<CurrencyPair> {
    let amount = amount.unwrap_or(1.0);
    if !amount.is_finite() || amount <= 0.0 {
        return Err(ResolveError::InvalidArguments(format!(
            "amount must be a positive number, got {amount}"
        )));
    }

    Ok(CurrencyPair {
        from: currency_code(from, "from_currency")?,
        to: currency_code(to, "to_currency")?,
        amount,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_crypto_wins() {
        assert_eq!(
            resolve_symbol("btc").unwrap(),
            ResolvedSymbol::Crypto {
                symbol: "BTC".to_string(),
                coin_id: "bitcoin"
            }
        );
        assert_eq!(
            resolve_symbol(" avax ").unwrap(),
            ResolvedSymbol::Crypto {
                symbol: "AVAX".to_string(),
                coin_id: "avalanche-2"
            }
        );
    }

    #[test]
    fn test_quote_suffix_is_stripped() {
        for raw in ["BTCUSD", "BTCUSDT", "btceur", "BTCGBP"] {
            assert_eq!(
                resolve_symbol(raw).unwrap(),
                ResolvedSymbol::Crypto {
                    symbol: "BTC".to_string(),
                    coin_id: "bitcoin"
                },
                "{raw}"
            );
        }
    }

    #[test]
    fn test_equity_fallback() {
        assert_eq!(
            resolve_symbol("aapl").unwrap(),
            ResolvedSymbol::Equity {
                ticker: "AAPL".to_string()
            }
        );
        assert_eq!(
            resolve_symbol("BRK.B").unwrap(),
            ResolvedSymbol::Equity {
                ticker: "BRK.B".to_string()
            }
        );
        assert_eq!(
            resolve_symbol("^GSPC").unwrap(),
            ResolvedSymbol::Equity {
                ticker: "^GSPC".to_string()
            }
        );
        // Unknown base with a quote suffix is left untouched
        assert_eq!(
            resolve_symbol("XYZUSD").unwrap(),
            ResolvedSymbol::Equity {
                ticker: "XYZUSD".to_string()
            }
        );
    }

    #[test]
    fn test_unresolvable_symbols() {
        for raw in ["", "   ", "APPLE INC", "THISISWAYTOOLONG", "$$$"] {
            let err = resolve_symbol(raw).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::SymbolUnresolved, "{raw}");
        }
    }

    #[test]
    fn test_currency_pair() {
        let pair = resolve_currency_pair(" usd", "eur ", Some(250.0)).unwrap();
        assert_eq!(pair.from, "USD");
        assert_eq!(pair.to, "EUR");
        assert!((pair.amount - 250.0).abs() < f64::EPSILON);
        assert!(!pair.is_identity());

        let pair = resolve_currency_pair("GBP", "gbp", None).unwrap();
        assert!((pair.amount - 1.0).abs() < f64::EPSILON);
        assert!(pair.is_identity());
    }

    #[test]
    fn test_invalid_currency_pair() {
        for (from, to, amount) in [
            ("US", "EUR", None),
            ("USD", "", None),
            ("USD", "EU1", None),
            ("USD", "EUR", Some(-5.0)),
            ("USD", "EUR", Some(f64::NAN)),
        ] {
            let err = resolve_currency_pair(from, to, amount).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidArguments);
        }
    }
}
