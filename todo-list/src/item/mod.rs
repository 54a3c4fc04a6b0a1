use chrono::{DateTime, Utc};

use crate::entities::*;
use crate::list::ListId;
use crate::repo::{NewItem, Repository, StorageError};
use crate::validation::{self, ValidationErrors};

pub mod api;
pub mod web;

pub use web::create_item_router;

pub type ItemId = i32;

/// A single task belonging to a todo list.
///
/// An item is pending while `completed_at` is absent and completed once it is set.
/// Completion is one-way: a timestamp that is already set can never change again.
#[derive(Debug, PartialEq, Clone, Eq, Hash)]
pub struct Item {
    id: ItemId,
    description: String,
    completed_at: Option<DateTime<Utc>>,
    todo_list_id: ListId,
}

impl Item {
    pub fn new(
        id: ItemId,
        description: String,
        completed_at: Option<DateTime<Utc>>,
        todo_list_id: ListId,
    ) -> Self {
        Self {
            id,
            description,
            completed_at,
            todo_list_id,
        }
    }

    /// Returns the ID of the item.
    pub fn id(&self) -> ItemId {
        self.id
    }

    /// Returns the description of the item.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns when the item was completed, if it was.
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    /// Returns the ID of the list owning the item.
    pub fn todo_list_id(&self) -> ListId {
        self.todo_list_id
    }

    pub fn is_pending(&self) -> bool {
        self.completed_at.is_none()
    }

    pub fn is_completed(&self) -> bool {
        self.completed_at.is_some()
    }

    /// Applies `changes` if they are valid, leaving the item untouched otherwise.
    ///
    /// The completion guard only fires when `completed_at` actually changes and a
    /// timestamp was already set. Description edits on a completed item pass.
    pub fn apply(&mut self, changes: ItemChanges) -> Result<(), ValidationErrors> {
        let description = changes
            .description
            .unwrap_or_else(|| self.description.clone());
        let completed_at = changes.completed_at.unwrap_or(self.completed_at);

        let mut errors = ValidationErrors::new();
        validation::validate_presence(&mut errors, "description", &description);
        if completed_at != self.completed_at && self.completed_at.is_some() {
            errors.add("completed_at", validation::ALREADY_COMPLETED);
        }
        errors.into_result(())?;

        self.description = description;
        self.completed_at = completed_at;
        Ok(())
    }

    /// Marks the item as completed at `now`.
    ///
    /// Completing an item twice is a validation failure, not a no-op.
    pub fn complete(&mut self, now: DateTime<Utc>) -> Result<(), ValidationErrors> {
        self.apply(ItemChanges::completed_at(Some(now)))
    }
}

impl From<todo_list_item::Model> for Item {
    fn from(model: todo_list_item::Model) -> Self {
        Item::new(
            model.id,
            model.description,
            model.completed_at,
            model.todo_list_id,
        )
    }
}

/// A partial update of an item. `None` leaves the attribute as it is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemChanges {
    pub description: Option<String>,
    pub completed_at: Option<Option<DateTime<Utc>>>,
}

impl ItemChanges {
    pub fn description(description: impl Into<String>) -> Self {
        Self {
            description: Some(description.into()),
            ..Default::default()
        }
    }

    pub fn completed_at(completed_at: Option<DateTime<Utc>>) -> Self {
        Self {
            completed_at: Some(completed_at),
            ..Default::default()
        }
    }
}

/// Error type for ItemService operations.
#[derive(Debug, thiserror::Error)]
pub enum ItemServiceError {
    /// Represents rejected attributes, keyed by field.
    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),
    /// Represents a missing owning list.
    #[error("Todo list with ID {0} not found")]
    ListNotFound(ListId),
    /// Represents a missing item, or one that belongs to another list.
    #[error("Todo list item with ID {0} not found")]
    ItemNotFound(ItemId),
    /// Represents a failure of the underlying store.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl From<ValidationErrors> for ItemServiceError {
    fn from(errors: ValidationErrors) -> Self {
        Self::Validation(errors)
    }
}

pub struct ItemService<'a, R: ?Sized> {
    repo: &'a R,
}

impl<'a, R: Repository + ?Sized> ItemService<'a, R> {
    pub fn new(repo: &'a R) -> Self {
        ItemService { repo }
    }

    /// Creates a new item in a list.
    ///
    /// # Arguments
    ///
    /// * `list_id` - The ID of the owning list.
    /// * `description` - The description of the task.
    /// * `completed_at` - An optional completion timestamp; `None` creates a pending item.
    ///
    /// # Returns
    ///
    /// A `Result` containing the created `Item`, or a validation, not found or storage error.
    #[tracing::instrument(skip(self))]
    pub async fn create_item(
        &self,
        list_id: ListId,
        description: String,
        completed_at: Option<DateTime<Utc>>,
    ) -> Result<Item, ItemServiceError> {
        let mut errors = ValidationErrors::new();
        validation::validate_presence(&mut errors, "description", &description);
        errors.into_result(())?;

        self.ensure_list_exists(list_id).await?;

        let item = self
            .repo
            .insert_item(NewItem {
                description,
                completed_at,
                todo_list_id: list_id,
            })
            .await?;
        Ok(item)
    }

    /// Retrieves all items of a list ordered by ID.
    #[tracing::instrument(skip(self))]
    pub async fn get_items(&self, list_id: ListId) -> Result<Vec<Item>, ItemServiceError> {
        self.ensure_list_exists(list_id).await?;
        Ok(self.repo.find_items_by_list(list_id).await?)
    }

    /// Retrieves an item by its ID within its owning list.
    #[tracing::instrument(skip(self))]
    pub async fn get_item(&self, list_id: ListId, id: ItemId) -> Result<Item, ItemServiceError> {
        self.ensure_list_exists(list_id).await?;
        self.repo
            .find_item_by_id(list_id, id)
            .await?
            .ok_or(ItemServiceError::ItemNotFound(id))
    }

    /// Updates an item with the given changes and persists it.
    ///
    /// # Returns
    ///
    /// A `Result` containing the updated `Item`. Invalid changes are rejected with
    /// [`ItemServiceError::Validation`] and nothing is written.
    #[tracing::instrument(skip(self))]
    pub async fn update_item(
        &self,
        list_id: ListId,
        id: ItemId,
        changes: ItemChanges,
    ) -> Result<Item, ItemServiceError> {
        let mut item = self.get_item(list_id, id).await?;
        item.apply(changes)?;
        Ok(self.repo.save_item(&item).await?)
    }

    /// Marks an item as completed now.
    ///
    /// Fails with a validation error on `completed_at` if the item is already completed.
    #[tracing::instrument(skip(self))]
    pub async fn complete_item(
        &self,
        list_id: ListId,
        id: ItemId,
    ) -> Result<Item, ItemServiceError> {
        let mut item = self.get_item(list_id, id).await?;
        item.complete(Utc::now())?;
        let completed = self.repo.save_item(&item).await?;
        tracing::info!("Completed item {} of list {}", id, list_id);
        Ok(completed)
    }

    /// Deletes an item by its ID within its owning list.
    ///
    /// # Returns
    ///
    /// A `Result` containing the deleted `Item` if successful.
    #[tracing::instrument(skip(self))]
    pub async fn delete_item(&self, list_id: ListId, id: ItemId) -> Result<Item, ItemServiceError> {
        let item = self.get_item(list_id, id).await?;
        if !self.repo.delete_item(id).await? {
            return Err(ItemServiceError::ItemNotFound(id));
        }
        Ok(item)
    }

    async fn ensure_list_exists(&self, list_id: ListId) -> Result<(), ItemServiceError> {
        match self.repo.find_list_by_id(list_id).await? {
            Some(_) => Ok(()),
            None => Err(ItemServiceError::ListNotFound(list_id)),
        }
    }
}
