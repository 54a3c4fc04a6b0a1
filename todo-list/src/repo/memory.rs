use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use super::{ItemRepository, ListRepository, NewItem, StorageError};
use crate::item::{Item, ItemId};
use crate::list::{ListId, TodoList};

#[derive(Debug, Default)]
struct Tables {
    lists: BTreeMap<ListId, TodoList>,
    items: BTreeMap<ItemId, Item>,
    last_list_id: ListId,
    last_item_id: ItemId,
}

/// Repository that keeps lists and items in process memory.
///
/// IDs are assigned sequentially starting at 1. [`InMemoryRepository::set_unavailable`]
/// makes every call fail with [`StorageError::Unavailable`] until it is reset.
#[derive(Debug, Default)]
pub struct InMemoryRepository {
    tables: Mutex<Tables>,
    unavailable: AtomicBool,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulates an outage of the store.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn tables(&self) -> Result<MutexGuard<'_, Tables>, StorageError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable(
                "in-memory store is offline".to_string(),
            ));
        }
        self.tables
            .lock()
            .map_err(|_| StorageError::Unavailable("in-memory store is poisoned".to_string()))
    }
}

#[async_trait]
impl ListRepository for InMemoryRepository {
    async fn find_all_lists(&self) -> Result<Vec<TodoList>, StorageError> {
        Ok(self.tables()?.lists.values().cloned().collect())
    }

    async fn find_list_by_id(&self, id: ListId) -> Result<Option<TodoList>, StorageError> {
        Ok(self.tables()?.lists.get(&id).cloned())
    }

    async fn insert_list(&self, name: String) -> Result<TodoList, StorageError> {
        let mut tables = self.tables()?;
        tables.last_list_id += 1;
        let list = TodoList::new(tables.last_list_id, name);
        tables.lists.insert(list.id(), list.clone());
        Ok(list)
    }

    async fn save_list(&self, list: &TodoList) -> Result<TodoList, StorageError> {
        let mut tables = self.tables()?;
        let stored = tables.lists.get_mut(&list.id()).ok_or_else(|| {
            StorageError::Unavailable(format!("todo list {} does not exist", list.id()))
        })?;
        *stored = list.clone();
        Ok(list.clone())
    }

    async fn delete_list(&self, id: ListId) -> Result<bool, StorageError> {
        let mut tables = self.tables()?;
        if tables.lists.remove(&id).is_none() {
            return Ok(false);
        }
        tables.items.retain(|_, item| item.todo_list_id() != id);
        Ok(true)
    }
}

#[async_trait]
impl ItemRepository for InMemoryRepository {
    async fn find_items_by_list(&self, list_id: ListId) -> Result<Vec<Item>, StorageError> {
        let tables = self.tables()?;
        let items = tables
            .items
            .values()
            .filter(|item| item.todo_list_id() == list_id)
            .cloned()
            .collect();
        Ok(items)
    }

    async fn find_item_by_id(
        &self,
        list_id: ListId,
        id: ItemId,
    ) -> Result<Option<Item>, StorageError> {
        let tables = self.tables()?;
        let item = tables
            .items
            .get(&id)
            .filter(|item| item.todo_list_id() == list_id)
            .cloned();
        Ok(item)
    }

    async fn find_pending_by_list(&self, list_id: ListId) -> Result<Vec<Item>, StorageError> {
        let tables = self.tables()?;
        let items = tables
            .items
            .values()
            .filter(|item| item.todo_list_id() == list_id && item.is_pending())
            .cloned()
            .collect();
        Ok(items)
    }

    async fn has_pending_items(&self, list_id: ListId) -> Result<bool, StorageError> {
        let tables = self.tables()?;
        Ok(tables
            .items
            .values()
            .any(|item| item.todo_list_id() == list_id && item.is_pending()))
    }

    async fn insert_item(&self, item: NewItem) -> Result<Item, StorageError> {
        let mut tables = self.tables()?;
        // Mirrors the foreign key on todo_list_items.todo_list_id.
        if !tables.lists.contains_key(&item.todo_list_id) {
            return Err(StorageError::Unavailable(format!(
                "todo list {} does not exist",
                item.todo_list_id
            )));
        }
        tables.last_item_id += 1;
        let created = Item::new(
            tables.last_item_id,
            item.description,
            item.completed_at,
            item.todo_list_id,
        );
        tables.items.insert(created.id(), created.clone());
        Ok(created)
    }

    async fn save_item(&self, item: &Item) -> Result<Item, StorageError> {
        let mut tables = self.tables()?;
        let stored = tables.items.get_mut(&item.id()).ok_or_else(|| {
            StorageError::Unavailable(format!("todo list item {} does not exist", item.id()))
        })?;
        *stored = item.clone();
        Ok(item.clone())
    }

    async fn delete_item(&self, id: ItemId) -> Result<bool, StorageError> {
        Ok(self.tables()?.items.remove(&id).is_some())
    }
}
