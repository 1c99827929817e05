//! Code 128 symbol encoding.
//!
//! Produces the module sequence for a barcode: `true` for a dark bar
//! module, `false` for a light one. Drawing happens in the renderer.

use barcoders::sym::code128::Code128;

use crate::error::BlockError;

/// Character set selectors understood by `barcoders`.
const SET_A: char = '\u{00C0}';
const SET_B: char = '\u{0181}';
const SET_C: char = '\u{0106}';

/// Encode `data` as Code 128 modules, including start, checksum and stop.
///
/// Character set B is used unless `data` starts with an explicit set
/// selector.
pub fn encode(data: &str) -> Result<Vec<bool>, BlockError> {
    if data.is_empty() {
        return Err(BlockError::Barcode("empty barcode data".to_string()));
    }

    let with_set = if data.starts_with([SET_A, SET_B, SET_C]) {
        data.to_string()
    } else {
        format!("{}{}", SET_B, data)
    };
    let symbol = Code128::new(&with_set)
        .map_err(|e| BlockError::Barcode(format!("cannot encode {:?}: {}", data, e)))?;
    Ok(symbol.encode().into_iter().map(|m| m == 1).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbol_starts_and_ends_dark() {
        let modules = encode("ABC-123").unwrap();
        assert!(modules.len() > 11 * 4);
        assert!(modules[0]);
        assert!(*modules.last().unwrap());
    }

    #[test]
    fn test_longer_data_longer_symbol() {
        let short = encode("AB").unwrap();
        let long = encode("ABCD").unwrap();
        assert_eq!(long.len() - short.len(), 22);
    }

    #[test]
    fn test_rejects_unencodable() {
        assert!(encode("").is_err());
        assert!(encode("na\u{ef}ve").is_err());
    }
}
