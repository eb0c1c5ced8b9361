// MySQL backend
//
// - config: mysql_async connection options built from `MysqlOptions`
// - params: parameter conversion between `RowValues` and mysql_async values
// - query: result extraction
// - connection: connection wrapper and statement execution

pub mod config;
pub mod connection;
pub mod params;
pub mod query;

pub use connection::MysqlConnection;
pub use params::Params;
pub use query::build_result_set;
