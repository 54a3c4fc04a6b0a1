pub use sea_orm_migration::prelude::*;

mod m20240919_000001_create_todo_lists_table;
mod m20240919_191832_add_todo_list_items;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240919_000001_create_todo_lists_table::Migration),
            Box::new(m20240919_191832_add_todo_list_items::Migration),
        ]
    }
}
