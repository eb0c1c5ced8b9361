// SQLite backend
//
// - config: opening a rusqlite connection from `SqliteOptions`
// - params: parameter conversion between `RowValues` and rusqlite values
// - query: result extraction
// - connection: the shared rusqlite handle and the blocking hop around it

pub mod config;
pub mod connection;
pub mod params;
pub mod query;

pub use connection::SqliteConnection;
pub use params::Params;
pub use query::build_result_set;
