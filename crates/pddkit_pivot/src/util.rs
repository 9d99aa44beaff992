//! Stateless helpers for source validation.

use polars::prelude::AnyValue;

use crate::conf::{TUP_SLAB_ORDER, TUP_SOURCE_COLUMNS};
use crate::spec::PivotError;

////////////////////////////////////////////////////////////////////////////////
// #region ColumnChecks

/// Fail with every required source column absent from `columns`.
pub fn validate_required_columns(columns: &[String]) -> Result<(), PivotError> {
    let l_missing: Vec<String> = TUP_SOURCE_COLUMNS
        .iter()
        .filter(|c_required| !columns.iter().any(|c_name| c_name == *c_required))
        .map(ToString::to_string)
        .collect();

    if l_missing.is_empty() {
        Ok(())
    } else {
        Err(PivotError::MissingColumns(l_missing))
    }
}

/// Position of a (trimmed) Slab value in the fixed order.
pub fn derive_slab_index(slab: &str) -> Option<usize> {
    TUP_SLAB_ORDER.iter().position(|c_slab| *c_slab == slab)
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region CellValueConversion

/// Stringify and trim a key cell; `None` for null, NaN or blank text.
pub fn derive_key_text_from_any_value(value: AnyValue<'_>) -> Option<String> {
    let c_text = match value {
        AnyValue::Null => return None,
        AnyValue::String(val) => val.to_string(),
        AnyValue::StringOwned(val) => val.to_string(),
        AnyValue::Boolean(val) => if val { "True" } else { "False" }.to_string(),
        AnyValue::UInt8(val) => val.to_string(),
        AnyValue::UInt16(val) => val.to_string(),
        AnyValue::UInt32(val) => val.to_string(),
        AnyValue::UInt64(val) => val.to_string(),
        AnyValue::Int8(val) => val.to_string(),
        AnyValue::Int16(val) => val.to_string(),
        AnyValue::Int32(val) => val.to_string(),
        AnyValue::Int64(val) => val.to_string(),
        AnyValue::Float32(val) if val.is_nan() => return None,
        AnyValue::Float32(val) => val.to_string(),
        AnyValue::Float64(val) if val.is_nan() => return None,
        AnyValue::Float64(val) => val.to_string(),
        other => other.to_string(),
    };

    let c_trimmed = c_text.trim();
    if c_trimmed.is_empty() {
        None
    } else {
        Some(c_trimmed.to_string())
    }
}

/// Convert a measure cell to `f64`.
///
/// Null, NaN and blank text count as zero. Returns the offending text for
/// anything that is not a number.
pub fn derive_measure_from_any_value(value: AnyValue<'_>) -> Result<f64, String> {
    let n_value = match value {
        AnyValue::Null => 0.0,
        AnyValue::UInt8(val) => val as f64,
        AnyValue::UInt16(val) => val as f64,
        AnyValue::UInt32(val) => val as f64,
        AnyValue::UInt64(val) => val as f64,
        AnyValue::Int8(val) => val as f64,
        AnyValue::Int16(val) => val as f64,
        AnyValue::Int32(val) => val as f64,
        AnyValue::Int64(val) => val as f64,
        AnyValue::Float32(val) => val as f64,
        AnyValue::Float64(val) => val,
        AnyValue::String(val) => derive_measure_from_text(val)?,
        AnyValue::StringOwned(val) => derive_measure_from_text(val.as_str())?,
        other => return Err(other.to_string()),
    };

    if n_value.is_nan() {
        return Ok(0.0);
    }
    if n_value.is_infinite() {
        return Err(n_value.to_string());
    }
    Ok(n_value)
}

fn derive_measure_from_text(text: &str) -> Result<f64, String> {
    let c_trimmed = text.trim();
    if c_trimmed.is_empty() {
        return Ok(0.0);
    }
    c_trimmed.parse::<f64>().map_err(|_| text.to_string())
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_required_columns_lists_every_missing_name() {
        let columns = vec!["State".to_string(), "Slab".to_string()];
        let err = validate_required_columns(&columns).unwrap_err();
        match err {
            PivotError::MissingColumns(l_missing) => assert_eq!(
                l_missing,
                vec![
                    "Cluster",
                    "State_Count",
                    "Critical Count",
                    "Non Critical Count"
                ]
            ),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_derive_key_text_trims_and_rejects_blank() {
        assert_eq!(
            derive_key_text_from_any_value(AnyValue::String("  Texas ")),
            Some("Texas".to_string())
        );
        assert_eq!(derive_key_text_from_any_value(AnyValue::String("   ")), None);
        assert_eq!(derive_key_text_from_any_value(AnyValue::Null), None);
        assert_eq!(
            derive_key_text_from_any_value(AnyValue::Int64(42)),
            Some("42".to_string())
        );
        assert_eq!(derive_key_text_from_any_value(AnyValue::Float64(f64::NAN)), None);
    }

    #[test]
    fn test_derive_measure_accepts_numbers_and_numeric_text() {
        assert_eq!(derive_measure_from_any_value(AnyValue::Int64(3)), Ok(3.0));
        assert_eq!(derive_measure_from_any_value(AnyValue::Float64(1.5)), Ok(1.5));
        assert_eq!(derive_measure_from_any_value(AnyValue::String(" 7 ")), Ok(7.0));
        assert_eq!(derive_measure_from_any_value(AnyValue::Null), Ok(0.0));
        assert_eq!(derive_measure_from_any_value(AnyValue::String("")), Ok(0.0));
        assert_eq!(
            derive_measure_from_any_value(AnyValue::String("abc")),
            Err("abc".to_string())
        );
    }

    #[test]
    fn test_derive_slab_index_follows_fixed_order() {
        assert_eq!(derive_slab_index(">365"), Some(0));
        assert_eq!(derive_slab_index("<=60"), Some(4));
        assert_eq!(derive_slab_index(">30"), None);
    }
}
