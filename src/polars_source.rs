//! Loading series straight out of a polars `DataFrame`.

use eyre::{Result, WrapErr};
use polars::prelude::*;

use crate::data_types::{SeriesId, SeriesStore, StyleTag};

impl SeriesStore {
    /// Registers every `y_cols` column against one shared buffer built from `x_col`.
    ///
    /// Columns are cast to `f64`; null cells become NaN so they show up as gaps.
    /// Each series is tagged with its column name.
    pub fn add_from_dataframe(
        &mut self,
        df: &DataFrame,
        x_col: &str,
        y_cols: &[&str],
    ) -> Result<Vec<SeriesId>> {
        let x = column_values(df, x_col)?;
        let ys = y_cols
            .iter()
            .map(|name| Ok((column_values(df, name)?, StyleTag::new(*name))))
            .collect::<Result<Vec<_>>>()?;
        let ids = self.add_shared(x, ys)?;
        Ok(ids)
    }
}

fn column_values(df: &DataFrame, name: &str) -> Result<Vec<f64>> {
    let column = df
        .column(name)
        .wrap_err_with(|| format!("missing column '{name}'"))?;
    let casted = column
        .cast(&DataType::Float64)
        .wrap_err_with(|| format!("column '{name}' is not numeric"))?;
    let values = casted.as_materialized_series().f64()?;
    Ok(values
        .into_iter()
        .map(|v| v.unwrap_or(f64::NAN))
        .collect())
}
