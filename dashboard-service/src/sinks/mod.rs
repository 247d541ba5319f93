pub mod table;

pub use table::{SortKey, TableSink};
