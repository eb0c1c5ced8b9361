mod column;
mod table;

pub use column::{ColumnDefinition, TableSchema};
pub use table::TableBuilder;
