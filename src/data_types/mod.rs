pub mod data;
pub mod datasource;
pub mod state;

pub use data::*;
pub use datasource::*;
pub use state::*;
