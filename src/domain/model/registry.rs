//! ModelRegistry for mapping table names to TableModel implementations.

use crate::domain::model::{AdminTable, TableModel};
use std::sync::Arc;

/// Registered tables, kept in registration order so DDL runs parents first.
pub struct ModelRegistry {
    models: Vec<Arc<dyn TableModel>>,
}

impl ModelRegistry {
    /// Creates a new empty ModelRegistry.
    pub fn new() -> Self {
        Self { models: Vec::new() }
    }

    /// The four tables behind the admin dashboard.
    pub fn admin() -> Self {
        let mut reg = Self::new();
        reg.register(AdminTable::cabins());
        reg.register(AdminTable::guests());
        reg.register(AdminTable::bookings());
        reg.register(AdminTable::settings());
        reg
    }

    /// Registers a model, replacing any earlier model for the same table.
    pub fn register<M: TableModel + 'static>(&mut self, model: M) {
        self.models
            .retain(|m| m.table_name() != model.table_name());
        self.models.push(Arc::new(model));
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn TableModel>> {
        self.models.iter().find(|m| m.table_name() == name).cloned()
    }

    pub fn list_models(&self) -> Vec<String> {
        self.models
            .iter()
            .map(|m| m.table_name().to_string())
            .collect()
    }

    /// CREATE TABLE statements in registration order.
    pub fn get_all_create_table_sql(&self) -> Vec<&str> {
        self.models
            .iter()
            .map(|model| model.get_create_table_sql())
            .collect()
    }
}

impl Default for ModelRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_registry_orders_parents_before_bookings() {
        let reg = ModelRegistry::admin();
        assert_eq!(
            reg.list_models(),
            vec!["cabins", "guests", "bookings", "settings"]
        );
        let bookings = reg.get("bookings").unwrap();
        assert_eq!(bookings.column_type("startDate"), Some("timestamptz"));
        assert_eq!(bookings.column_type("nope"), None);
        assert_eq!(bookings.primary_key_field(), "id");
    }

    #[test]
    fn register_replaces_same_table() {
        let mut reg = ModelRegistry::admin();
        reg.register(AdminTable::cabins());
        assert_eq!(reg.list_models().len(), 4);
        assert_eq!(reg.list_models()[3], "cabins");
    }
}
