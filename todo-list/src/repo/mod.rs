use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::item::{Item, ItemId};
use crate::list::{ListId, TodoList};

pub mod database;
pub mod memory;

pub use database::DatabaseRepository;
pub use memory::InMemoryRepository;

/// Error type for any failure of the underlying store.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Represents an error reported by the database.
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),
    /// Represents a store that cannot currently serve requests.
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

/// Attributes of an item that has not been persisted yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewItem {
    pub description: String,
    pub completed_at: Option<DateTime<Utc>>,
    pub todo_list_id: ListId,
}

/// Storage access for todo lists.
#[async_trait]
pub trait ListRepository: Send + Sync {
    /// Returns every list ordered by ID.
    async fn find_all_lists(&self) -> Result<Vec<TodoList>, StorageError>;

    async fn find_list_by_id(&self, id: ListId) -> Result<Option<TodoList>, StorageError>;

    async fn insert_list(&self, name: String) -> Result<TodoList, StorageError>;

    async fn save_list(&self, list: &TodoList) -> Result<TodoList, StorageError>;

    /// Deletes a list together with all of its items. Returns false if no list was deleted.
    async fn delete_list(&self, id: ListId) -> Result<bool, StorageError>;
}

/// Storage access for todo list items. Lookups are always scoped to the owning list.
#[async_trait]
pub trait ItemRepository: Send + Sync {
    /// Returns the items of a list ordered by ID.
    async fn find_items_by_list(&self, list_id: ListId) -> Result<Vec<Item>, StorageError>;

    async fn find_item_by_id(
        &self,
        list_id: ListId,
        id: ItemId,
    ) -> Result<Option<Item>, StorageError>;

    /// Returns the items of a list without a completion timestamp, ordered by ID.
    async fn find_pending_by_list(&self, list_id: ListId) -> Result<Vec<Item>, StorageError>;

    async fn has_pending_items(&self, list_id: ListId) -> Result<bool, StorageError>;

    async fn insert_item(&self, item: NewItem) -> Result<Item, StorageError>;

    async fn save_item(&self, item: &Item) -> Result<Item, StorageError>;

    async fn delete_item(&self, id: ItemId) -> Result<bool, StorageError>;
}

/// A store holding both lists and their items.
pub trait Repository: ListRepository + ItemRepository {}

impl<T: ListRepository + ItemRepository + ?Sized> Repository for T {}
