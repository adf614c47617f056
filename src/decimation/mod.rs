pub mod common;
pub mod min_max;

pub use common::{bin_index, BinExtrema, EdgeScan};
pub use min_max::{reduce, reduce_many_par, reduce_view};
