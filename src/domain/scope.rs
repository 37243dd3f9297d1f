//! The symbols and timeframes a batch operates on.

/// Selection of (symbol, timeframe) series.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Scope {
    pub symbols: Vec<String>,
    pub timeframes: Vec<String>,
}

impl Scope {
    pub fn new(symbols: Vec<String>, timeframes: Vec<String>) -> Self {
        Scope {
            symbols,
            timeframes,
        }
    }

    pub fn includes(&self, symbol: &str, timeframe: &str) -> bool {
        self.symbols.iter().any(|s| s == symbol) && self.timeframes.iter().any(|t| t == timeframe)
    }

    /// Every (symbol, timeframe) pair, symbols outermost.
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.symbols.iter().flat_map(move |s| {
            self.timeframes
                .iter()
                .map(move |t| (s.as_str(), t.as_str()))
        })
    }
}

/// Split a comma-separated list, dropping blanks.
pub fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}
