use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Lookback window selector for the analysis queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Timeframe {
    #[default]
    #[serde(rename = "1d")]
    OneDay,
    #[serde(rename = "1w")]
    OneWeek,
    #[serde(rename = "1m")]
    OneMonth,
}

impl Timeframe {
    /// Unrecognized tokens resolve to one day.
    pub fn parse(token: &str) -> Self {
        match token.trim() {
            "1w" => Timeframe::OneWeek,
            "1m" => Timeframe::OneMonth,
            _ => Timeframe::OneDay,
        }
    }

    pub fn lookback(&self) -> Duration {
        match self {
            Timeframe::OneDay => Duration::days(1),
            Timeframe::OneWeek => Duration::days(7),
            Timeframe::OneMonth => Duration::days(30),
        }
    }

    /// `(start, end)` of the window that ends at `end`.
    pub fn window_ending(&self, end: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
        (end - self.lookback(), end)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Timeframe::OneDay => "1d",
            Timeframe::OneWeek => "1w",
            Timeframe::OneMonth => "1m",
        }
    }
}

impl From<&str> for Timeframe {
    fn from(token: &str) -> Self {
        Timeframe::parse(token)
    }
}

impl std::fmt::Display for Timeframe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_tokens() {
        assert_eq!(Timeframe::parse("1d").lookback(), Duration::days(1));
        assert_eq!(Timeframe::parse("1w").lookback(), Duration::days(7));
        assert_eq!(Timeframe::parse("1m").lookback(), Duration::days(30));
    }

    #[test]
    fn test_unknown_token_falls_back_to_one_day() {
        assert_eq!(Timeframe::parse("5y"), Timeframe::OneDay);
        assert_eq!(Timeframe::parse(""), Timeframe::OneDay);
        assert_eq!(Timeframe::from("1W"), Timeframe::OneDay);
    }

    #[test]
    fn test_window_ends_at_given_instant() {
        let end = Utc::now();
        let (start, stop) = Timeframe::OneWeek.window_ending(end);
        assert_eq!(stop, end);
        assert_eq!(end - start, Duration::days(7));
    }

    #[test]
    fn test_serializes_as_token() {
        assert_eq!(serde_json::to_string(&Timeframe::OneMonth).unwrap(), "\"1m\"");
    }
}
