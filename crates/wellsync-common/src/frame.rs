//! Row-wise column access on polars frames.

use polars::prelude::{AnyValue, DataFrame, DataType, NamedFrom, PolarsResult, Series};

use crate::value::FieldValue;

/// Returns true when the frame has a column with exactly this name.
pub fn has_column(df: &DataFrame, name: &str) -> bool {
    df.get_column_names().iter().any(|column| column.as_str() == name)
}

/// Reads a whole column as [`FieldValue`]s, in row order.
pub fn column_values(df: &DataFrame, name: &str) -> PolarsResult<Vec<FieldValue>> {
    let column = df.column(name)?;
    let mut values = Vec::with_capacity(df.height());
    for idx in 0..df.height() {
        let value = column.get(idx).unwrap_or(AnyValue::Null);
        values.push(FieldValue::from_any(value));
    }
    Ok(values)
}

/// Builds a series from field values, choosing the narrowest dtype that
/// holds every non-null value.
pub fn series_from_values(name: &str, values: &[FieldValue]) -> Series {
    let present = values.iter().filter(|value| !value.is_null());
    let mut all_int = true;
    let mut all_numeric = true;
    let mut all_bool = true;
    let mut any = false;
    for value in present {
        any = true;
        all_int &= matches!(value, FieldValue::Integer(_));
        all_numeric &= matches!(value, FieldValue::Integer(_) | FieldValue::Float(_));
        all_bool &= matches!(value, FieldValue::Boolean(_));
    }
    if any && all_int {
        let data: Vec<Option<i64>> = values.iter().map(FieldValue::as_i64).collect();
        Series::new(name.into(), data)
    } else if any && all_numeric {
        let data: Vec<Option<f64>> = values.iter().map(FieldValue::as_f64).collect();
        Series::new(name.into(), data)
    } else if any && all_bool {
        let data: Vec<Option<bool>> = values
            .iter()
            .map(|value| match value {
                FieldValue::Boolean(b) => Some(*b),
                _ => None,
            })
            .collect();
        Series::new(name.into(), data)
    } else {
        let data: Vec<Option<String>> = values.iter().map(FieldValue::as_text).collect();
        Series::new(name.into(), data)
    }
}

/// Builds a series holding `values` converted to `dtype`.
///
/// Values that do not convert become null. Used when writing back into an
/// existing column whose dtype must not drift.
pub fn series_with_dtype(
    name: &str,
    values: &[FieldValue],
    dtype: &DataType,
) -> PolarsResult<Series> {
    match dtype {
        DataType::String => {
            let data: Vec<Option<String>> = values.iter().map(FieldValue::as_text).collect();
            Ok(Series::new(name.into(), data))
        }
        DataType::Float64 | DataType::Float32 => {
            let data: Vec<Option<f64>> = values.iter().map(FieldValue::as_f64).collect();
            Series::new(name.into(), data).cast(dtype)
        }
        dtype if dtype.is_integer() => {
            let data: Vec<Option<i64>> = values.iter().map(FieldValue::as_i64).collect();
            Series::new(name.into(), data).cast(dtype)
        }
        _ => series_from_values(name, values).cast(dtype),
    }
}
