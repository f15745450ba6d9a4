use nom::character::complete::alpha0;
use nom::sequence::pair;

use crate::common::error::ProfileError;
use crate::common::parser::{consume_all, p_u64};

/// Converts a memory request into megabytes.
///
/// A plain number is already in megabytes. Otherwise the number has to carry one of the
/// `K`, `M`, `G` or `T` suffixes, each unit being a thousand times the previous one.
pub fn convert_to_mb(input: &str) -> crate::Result<u64> {
    let trimmed = input.trim();
    let (amount, unit) =
        consume_all(pair(p_u64, alpha0), trimmed).map_err(|_| ProfileError::InvalidOption {
            key: "mem".to_string(),
            value: input.to_string(),
            reason: "expected <amount>[K|M|G|T]".to_string(),
        })?;

    let megabytes = match unit.to_ascii_uppercase().as_str() {
        "" | "M" => Some(amount),
        "K" => Some(amount / 1000),
        "G" => amount.checked_mul(1000),
        "T" => amount.checked_mul(1000 * 1000),
        _ => {
            return Err(ProfileError::InvalidMemoryUnit {
                input: input.to_string(),
                unit: unit.to_string(),
            });
        }
    };
    megabytes.ok_or_else(|| ProfileError::InvalidOption {
        key: "mem".to_string(),
        value: input.to_string(),
        reason: "amount is too large".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::convert_to_mb;
    use crate::common::error::ProfileError;

    #[test]
    fn test_plain_megabytes() {
        assert_eq!(convert_to_mb("1000").unwrap(), 1000);
        assert_eq!(convert_to_mb(&1000.to_string()).unwrap(), 1000);
    }

    #[test]
    fn test_units() {
        assert_eq!(convert_to_mb("1000K").unwrap(), 1);
        assert_eq!(convert_to_mb("1000M").unwrap(), 1000);
        assert_eq!(convert_to_mb("1000G").unwrap(), 1_000_000);
        assert_eq!(convert_to_mb("1000T").unwrap(), 1_000_000_000);
    }

    #[test]
    fn test_lowercase_unit() {
        assert_eq!(convert_to_mb("4g").unwrap(), 4000);
    }

    #[test]
    fn test_kilobytes_truncate() {
        assert_eq!(convert_to_mb("1500K").unwrap(), 1);
        assert_eq!(convert_to_mb("999K").unwrap(), 0);
    }

    #[test]
    fn test_unsupported_unit() {
        match convert_to_mb("1000E") {
            Err(ProfileError::InvalidMemoryUnit { unit, .. }) => assert_eq!(unit, "E"),
            result => panic!("Unexpected result {result:?}"),
        }
    }

    #[test]
    fn test_invalid_amount() {
        assert!(matches!(
            convert_to_mb("G"),
            Err(ProfileError::InvalidOption { .. })
        ));
        assert!(matches!(
            convert_to_mb("1.5G"),
            Err(ProfileError::InvalidOption { .. })
        ));
    }
}
