//! Conversion from polars DataFrames.
//!
//! Columns keep the dtype polars already assigned; nothing is re-inferred here.

use polars::prelude::{Column as PolarsColumn, DataFrame, DataType};

use crate::error::{Result, ResultExt};

use super::{AttributeType, Column, Table};

/// Check if a DataType is numeric (integer or float).
#[inline]
pub fn is_numeric_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

/// Attribute type a polars dtype maps to.
pub fn attribute_type_for(dtype: &DataType) -> AttributeType {
    if is_numeric_dtype(dtype) {
        AttributeType::Numeric
    } else if matches!(dtype, DataType::Boolean) {
        AttributeType::Binary
    } else {
        AttributeType::Nominal
    }
}

impl Table {
    /// Build a table from an already-typed DataFrame.
    ///
    /// Numeric dtypes become numeric columns, booleans become binary columns
    /// and everything else is read as nominal text. Nulls are replaced by the
    /// missing-value token of the target attribute type.
    pub fn from_dataframe(name: impl Into<String>, df: &DataFrame) -> Result<Self> {
        let columns = df
            .get_columns()
            .iter()
            .map(convert_column)
            .collect::<Result<Vec<_>>>()?;

        Table::new(name, columns)
    }
}

fn convert_column(column: &PolarsColumn) -> Result<Column> {
    let name = column.name().to_string();
    let series = column.as_materialized_series();

    match attribute_type_for(series.dtype()) {
        AttributeType::Numeric | AttributeType::Ordinal => {
            let cast = series
                .cast(&DataType::Float32)
                .context(format!("Casting column '{}' to Float32", name))?;
            let values = cast
                .f32()
                .context(format!("Reading column '{}'", name))?
                .into_iter()
                .map(|v| v.unwrap_or(0.0))
                .collect();
            Ok(Column::new_numeric(name, values))
        }
        AttributeType::Binary => {
            let values = series
                .bool()
                .context(format!("Reading column '{}'", name))?
                .into_iter()
                .map(|v| v.unwrap_or(false))
                .collect();
            Ok(Column::new_binary(name, values))
        }
        AttributeType::Nominal => {
            let cast = series
                .cast(&DataType::String)
                .context(format!("Casting column '{}' to String", name))?;
            let missing = AttributeType::Nominal.default_missing_value();
            let values = cast
                .str()
                .context(format!("Reading column '{}'", name))?
                .into_iter()
                .map(|v| v.unwrap_or(missing).to_string())
                .collect();
            Ok(Column::new_nominal(name, values))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_is_numeric_dtype() {
        assert!(is_numeric_dtype(&DataType::Int64));
        assert!(is_numeric_dtype(&DataType::Float64));
        assert!(!is_numeric_dtype(&DataType::String));
        assert!(!is_numeric_dtype(&DataType::Boolean));
    }

    #[test]
    fn test_from_dataframe_maps_dtypes() {
        let df = df! {
            "age" => [Some(31i64), None, Some(45)],
            "smoker" => [Some(true), Some(false), None],
            "city" => [Some("Leiden"), None, Some("Delft")],
        }
        .unwrap();

        let table = Table::from_dataframe("people", &df).unwrap();
        assert_eq!(table.row_count(), 3);
        assert_eq!(table.column_count(), 3);

        let age = table.column(0).unwrap();
        assert_eq!(age.attribute_type(), AttributeType::Numeric);
        assert_eq!(age.numeric_values().unwrap(), &[31.0, 0.0, 45.0]);

        let smoker = table.column(1).unwrap();
        assert_eq!(smoker.attribute_type(), AttributeType::Binary);
        assert_eq!(smoker.binary_at(2), Some(false));

        let city = table.column(2).unwrap();
        assert_eq!(city.attribute_type(), AttributeType::Nominal);
        assert_eq!(city.string_at(1), Some("?".to_string()));
        assert_eq!(city.index(), 2);
    }
}
