use async_trait::async_trait;
use sea_orm::*;
use std::sync::Arc;

use super::{ItemRepository, ListRepository, NewItem, StorageError};
use crate::entities::*;
use crate::item::{Item, ItemId};
use crate::list::{ListId, TodoList};

/// Repository backed by a relational database through sea-orm.
#[derive(Clone, Debug)]
pub struct DatabaseRepository {
    db: Arc<DatabaseConnection>,
}

impl DatabaseRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ListRepository for DatabaseRepository {
    #[tracing::instrument(skip(self))]
    async fn find_all_lists(&self) -> Result<Vec<TodoList>, StorageError> {
        let lists = todo_list::Entity::find()
            .order_by_asc(todo_list::Column::Id)
            .all(self.db.as_ref())
            .await?
            .into_iter()
            .map(TodoList::from)
            .collect();
        Ok(lists)
    }

    #[tracing::instrument(skip(self))]
    async fn find_list_by_id(&self, id: ListId) -> Result<Option<TodoList>, StorageError> {
        let list = todo_list::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await?
            .map(TodoList::from);
        Ok(list)
    }

    #[tracing::instrument(skip(self))]
    async fn insert_list(&self, name: String) -> Result<TodoList, StorageError> {
        let active_model = todo_list::ActiveModel {
            name: ActiveValue::Set(name),
            ..Default::default()
        };
        let created_model = active_model.insert(self.db.as_ref()).await?;
        Ok(TodoList::from(created_model))
    }

    #[tracing::instrument(skip(self))]
    async fn save_list(&self, list: &TodoList) -> Result<TodoList, StorageError> {
        let active_model = todo_list::ActiveModel {
            id: ActiveValue::Unchanged(list.id()),
            name: ActiveValue::Set(list.name().to_string()),
        };
        let updated_model = active_model.update(self.db.as_ref()).await?;
        Ok(TodoList::from(updated_model))
    }

    #[tracing::instrument(skip(self))]
    async fn delete_list(&self, id: ListId) -> Result<bool, StorageError> {
        let txn = self.db.begin().await?;
        todo_list_item::Entity::delete_many()
            .filter(todo_list_item::Column::TodoListId.eq(id))
            .exec(&txn)
            .await?;
        let result = todo_list::Entity::delete_by_id(id).exec(&txn).await?;
        txn.commit().await?;
        Ok(result.rows_affected > 0)
    }
}

#[async_trait]
impl ItemRepository for DatabaseRepository {
    #[tracing::instrument(skip(self))]
    async fn find_items_by_list(&self, list_id: ListId) -> Result<Vec<Item>, StorageError> {
        let items = todo_list_item::Entity::find()
            .filter(todo_list_item::Column::TodoListId.eq(list_id))
            .order_by_asc(todo_list_item::Column::Id)
            .all(self.db.as_ref())
            .await?
            .into_iter()
            .map(Item::from)
            .collect();
        Ok(items)
    }

    #[tracing::instrument(skip(self))]
    async fn find_item_by_id(
        &self,
        list_id: ListId,
        id: ItemId,
    ) -> Result<Option<Item>, StorageError> {
        let item = todo_list_item::Entity::find_by_id(id)
            .filter(todo_list_item::Column::TodoListId.eq(list_id))
            .one(self.db.as_ref())
            .await?
            .map(Item::from);
        Ok(item)
    }

    #[tracing::instrument(skip(self))]
    async fn find_pending_by_list(&self, list_id: ListId) -> Result<Vec<Item>, StorageError> {
        let items = todo_list_item::Entity::find()
            .filter(todo_list_item::Column::TodoListId.eq(list_id))
            .filter(todo_list_item::Column::CompletedAt.is_null())
            .order_by_asc(todo_list_item::Column::Id)
            .all(self.db.as_ref())
            .await?
            .into_iter()
            .map(Item::from)
            .collect();
        Ok(items)
    }

    #[tracing::instrument(skip(self))]
    async fn has_pending_items(&self, list_id: ListId) -> Result<bool, StorageError> {
        let pending_count = todo_list_item::Entity::find()
            .filter(todo_list_item::Column::TodoListId.eq(list_id))
            .filter(todo_list_item::Column::CompletedAt.is_null())
            .count(self.db.as_ref())
            .await?;
        Ok(pending_count > 0)
    }

    #[tracing::instrument(skip(self))]
    async fn insert_item(&self, item: NewItem) -> Result<Item, StorageError> {
        let active_model = todo_list_item::ActiveModel {
            description: ActiveValue::Set(item.description),
            completed_at: ActiveValue::Set(item.completed_at),
            todo_list_id: ActiveValue::Set(item.todo_list_id),
            ..Default::default()
        };
        let created_model = active_model.insert(self.db.as_ref()).await?;
        Ok(Item::from(created_model))
    }

    #[tracing::instrument(skip(self))]
    async fn save_item(&self, item: &Item) -> Result<Item, StorageError> {
        let active_model = todo_list_item::ActiveModel {
            id: ActiveValue::Unchanged(item.id()),
            description: ActiveValue::Set(item.description().to_string()),
            completed_at: ActiveValue::Set(item.completed_at()),
            todo_list_id: ActiveValue::Unchanged(item.todo_list_id()),
        };
        let updated_model = active_model.update(self.db.as_ref()).await?;
        Ok(Item::from(updated_model))
    }

    #[tracing::instrument(skip(self))]
    async fn delete_item(&self, id: ItemId) -> Result<bool, StorageError> {
        let result = todo_list_item::Entity::delete_by_id(id)
            .exec(self.db.as_ref())
            .await?;
        Ok(result.rows_affected > 0)
    }
}
