//! Typed plot-argument parsing.
//!
//! Positional plot calls (`y`, `x y`, `x y style`, `x1 y1 x2 y2`, ..., then
//! trailing options) are expressed as a list of tagged [`PlotArg`]s and parsed
//! with the grammar
//!
//! ```text
//! call   := group+ option*
//! group  := ydata [style] | xdata ydata [style]
//! xdata  := Numeric
//! ydata  := Numeric | Columns
//! ```
//!
//! A group with `Columns` as its y data registers every column against one
//! shared x buffer.

use serde_json::{Map, Value};

use crate::data_types::{SeriesId, SeriesStore, StyleTag};
use crate::error::{DecimateError, Result};

#[derive(Clone, Debug, PartialEq)]
pub enum PlotArg {
    Numeric(Vec<f64>),
    /// Several y series of equal length.
    Columns(Vec<Vec<f64>>),
    Style(StyleTag),
    /// Pass-through option, e.g. `("LineWidth", 2)`.
    Option(String, Value),
}

impl PlotArg {
    pub fn option(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Option(key.into(), value.into())
    }

    fn kind(&self) -> &'static str {
        match self {
            Self::Numeric(_) => "numeric",
            Self::Columns(_) => "columns",
            Self::Style(_) => "style",
            Self::Option(..) => "option",
        }
    }
}

impl From<Vec<f64>> for PlotArg {
    fn from(values: Vec<f64>) -> Self {
        Self::Numeric(values)
    }
}

impl From<&[f64]> for PlotArg {
    fn from(values: &[f64]) -> Self {
        Self::Numeric(values.to_vec())
    }
}

impl From<Vec<Vec<f64>>> for PlotArg {
    fn from(columns: Vec<Vec<f64>>) -> Self {
        Self::Columns(columns)
    }
}

impl From<&str> for PlotArg {
    fn from(style: &str) -> Self {
        Self::Style(StyleTag::new(style))
    }
}

/// One `[x] y [style]` group.
#[derive(Clone, Debug, PartialEq)]
pub struct SeriesGroup {
    /// `None` means the implicit x `1..=n`.
    pub x: Option<Vec<f64>>,
    pub ys: Vec<Vec<f64>>,
    pub style: StyleTag,
}

impl SeriesGroup {
    pub fn sample_count(&self) -> usize {
        self.ys.first().map_or(0, Vec::len)
    }

    /// Explicit x, or `1..=n` when none was given.
    pub fn x_values(&self) -> Vec<f64> {
        match &self.x {
            Some(x) => x.clone(),
            None => (1..=self.sample_count()).map(|i| i as f64).collect(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ParsedPlot {
    pub groups: Vec<SeriesGroup>,
    pub options: Map<String, Value>,
}

impl ParsedPlot {
    /// Registers every group into `store`, sharing x buffers within a group.
    pub fn register(self, store: &mut SeriesStore) -> Result<Vec<SeriesId>> {
        let mut ids = Vec::new();
        for group in self.groups {
            let x = group.x_values();
            let style = group.style;
            let ys = group.ys.into_iter().map(|y| (y, style.clone())).collect();
            ids.extend(store.add_shared(x, ys)?);
        }
        Ok(ids)
    }

    /// Builds a fresh store and hands the pass-through options back.
    pub fn into_store(mut self) -> Result<(SeriesStore, Map<String, Value>)> {
        let options = std::mem::take(&mut self.options);
        let mut store = SeriesStore::new();
        self.register(&mut store)?;
        Ok((store, options))
    }
}

pub struct PlotSpecParser;

impl PlotSpecParser {
    pub fn parse(args: impl IntoIterator<Item = PlotArg>) -> Result<ParsedPlot> {
        let mut args = args.into_iter().peekable();
        let mut parsed = ParsedPlot::default();

        while let Some(arg) = args.next() {
            let mut group = match arg {
                PlotArg::Option(key, value) => {
                    parsed.options.insert(key, value);
                    continue;
                }
                PlotArg::Style(style) => {
                    return Err(DecimateError::invalid_input(format!(
                        "style '{}' has no preceding data",
                        style.as_str()
                    )));
                }
                _ if !parsed.options.is_empty() => {
                    return Err(DecimateError::invalid_input(format!(
                        "{} argument after options",
                        arg.kind()
                    )));
                }
                PlotArg::Numeric(first) => {
                    let next_y =
                        args.next_if(|a| matches!(a, PlotArg::Numeric(_) | PlotArg::Columns(_)));
                    let ys = match next_y {
                        Some(PlotArg::Numeric(y)) => Some(vec![y]),
                        Some(PlotArg::Columns(columns)) => Some(columns),
                        _ => None,
                    };
                    match ys {
                        Some(ys) => SeriesGroup {
                            x: Some(first),
                            ys,
                            style: StyleTag::default(),
                        },
                        None => SeriesGroup {
                            x: None,
                            ys: vec![first],
                            style: StyleTag::default(),
                        },
                    }
                }
                PlotArg::Columns(columns) => SeriesGroup {
                    x: None,
                    ys: columns,
                    style: StyleTag::default(),
                },
            };

            if let Some(PlotArg::Style(style)) = args.next_if(|a| matches!(a, PlotArg::Style(_))) {
                group.style = style;
            }
            validate_group(&group)?;
            parsed.groups.push(group);
        }

        if parsed.groups.is_empty() {
            return Err(DecimateError::invalid_input("no data to plot"));
        }
        Ok(parsed)
    }
}

fn validate_group(group: &SeriesGroup) -> Result<()> {
    let Some(first) = group.ys.first() else {
        return Err(DecimateError::invalid_input("columns argument holds no series"));
    };
    if group.ys.iter().any(|y| y.len() != first.len()) {
        return Err(DecimateError::invalid_input("columns have different lengths"));
    }
    if let Some(x) = &group.x {
        if x.len() != first.len() {
            return Err(DecimateError::invalid_input(format!(
                "x has {} samples but y has {}",
                x.len(),
                first.len()
            )));
        }
    }
    Ok(())
}
