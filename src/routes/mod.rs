pub(crate) mod analysis;
pub(crate) mod health;
pub(crate) mod historical;
pub(crate) mod prices;

use crate::errors::AppError;
use crate::services::symbol_universe::is_valid_symbol;

/// Upper-cases a path symbol and rejects anything that is not a ticker.
pub(crate) fn normalize_symbol(raw: &str) -> Result<String, AppError> {
    let symbol = raw.trim().to_uppercase();
    if !is_valid_symbol(&symbol) {
        return Err(AppError::Validation(format!("Invalid symbol: {}", raw)));
    }
    Ok(symbol)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_symbol() {
        assert_eq!(normalize_symbol(" aapl ").unwrap(), "AAPL");
        assert_eq!(normalize_symbol("brk.b").unwrap(), "BRK.B");
        assert!(normalize_symbol("").is_err());
        assert!(normalize_symbol("A B").is_err());
    }
}
