//! Table models: what the SQL backend needs to know about each admin table.

pub mod registry;
pub mod tables;

pub use registry::ModelRegistry;
pub use tables::{AdminTable, BOOKINGS, CABINS, GUESTS, SETTINGS};

/// Contract for a table the SQL backend can query and write.
///
/// Column types drive the casts applied to bound parameters, so JSON payloads
/// (strings for timestamps, numbers for integers) land in correctly typed columns.
pub trait TableModel: Send + Sync {
    /// Returns the name of the database table for this model.
    fn table_name(&self) -> &str;

    /// Returns the name of the primary key field for this model.
    fn primary_key_field(&self) -> &str;

    /// Returns the SQL CREATE TABLE statement for this model.
    fn get_create_table_sql(&self) -> &str;

    /// Postgres type name of `column`, if the column is known.
    fn column_type(&self, column: &str) -> Option<&str>;
}
