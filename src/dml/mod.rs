mod batch;
mod insert;
mod update;

pub use batch::BATCH_SIZE;
pub use insert::InsertBuilder;
pub use update::UpdateBuilder;

use chrono::{NaiveDate, NaiveDateTime};
use indexmap::IndexMap;

use crate::dialect::validate_identifier;
use crate::error::SqlManagerError;
use crate::types::RowValues;

/// Staged column values, in the order they were first set.
pub type StagedValues = IndexMap<String, RowValues>;

/// Setters shared by the insert and update builders.
pub trait StageValues: Sized {
    fn staged_mut(&mut self) -> &mut StagedValues;

    /// Stage a value; setting the same column again replaces the value in place.
    #[must_use]
    fn set_value(mut self, column: &str, value: impl Into<RowValues>) -> Self {
        self.staged_mut().insert(column.to_string(), value.into());
        self
    }

    #[must_use]
    fn set_string(self, column: &str, value: &str) -> Self {
        self.set_value(column, value)
    }

    #[must_use]
    fn set_integer(self, column: &str, value: i32) -> Self {
        self.set_value(column, value)
    }

    #[must_use]
    fn set_long(self, column: &str, value: i64) -> Self {
        self.set_value(column, value)
    }

    #[must_use]
    fn set_double(self, column: &str, value: f64) -> Self {
        self.set_value(column, value)
    }

    #[must_use]
    fn set_boolean(self, column: &str, value: bool) -> Self {
        self.set_value(column, value)
    }

    #[must_use]
    fn set_date(self, column: &str, value: NaiveDate) -> Self {
        self.set_value(column, value)
    }

    #[must_use]
    fn set_timestamp(self, column: &str, value: NaiveDateTime) -> Self {
        self.set_value(column, value)
    }

    #[must_use]
    fn set_null(self, column: &str) -> Self {
        self.set_value(column, RowValues::Null)
    }
}

fn validate_columns<'a>(
    table: &str,
    columns: impl IntoIterator<Item = &'a String>,
) -> Result<(), SqlManagerError> {
    validate_identifier(table)?;
    for column in columns {
        validate_identifier(column)?;
    }
    Ok(())
}
