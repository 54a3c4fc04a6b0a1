use crate::entities::*;
use crate::item::{Item, ItemId, ItemService, ItemServiceError};
use crate::repo::{Repository, StorageError};
use crate::validation::{self, ValidationErrors};

pub mod api;
pub mod web;

pub use web::create_list_router;

pub type ListId = i32;

/// A named collection of items.
#[derive(Debug, PartialEq, Clone, Eq, Hash)]
pub struct TodoList {
    id: ListId,
    name: String,
}

impl TodoList {
    pub fn new(id: ListId, name: String) -> Self {
        Self { id, name }
    }

    /// Returns the ID of the list.
    pub fn id(&self) -> ListId {
        self.id
    }

    /// Returns the name of the list.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Renames the list, rejecting blank names.
    pub fn rename(&mut self, name: String) -> Result<(), ValidationErrors> {
        validate_name(&name)?;
        self.name = name;
        Ok(())
    }
}

impl From<todo_list::Model> for TodoList {
    fn from(model: todo_list::Model) -> Self {
        TodoList::new(model.id, model.name)
    }
}

fn validate_name(name: &str) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    validation::validate_presence(&mut errors, "name", name);
    errors.into_result(())
}

/// A list together with its derived completion status.
#[derive(Debug, PartialEq, Clone, Eq)]
pub struct ListSummary {
    list: TodoList,
    pending: bool,
}

impl ListSummary {
    pub fn new(list: TodoList, pending: bool) -> Self {
        Self { list, pending }
    }

    pub fn list(&self) -> &TodoList {
        &self.list
    }

    /// True while at least one item of the list is pending.
    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// True when no item of the list is pending, including lists without items.
    pub fn is_completed(&self) -> bool {
        !self.pending
    }
}

/// An item that could not be completed during a bulk completion.
#[derive(Debug)]
pub struct ItemFailure {
    pub item_id: ItemId,
    pub error: ItemServiceError,
}

/// Outcome of completing every pending item of a list.
///
/// Items are attempted independently; a failure never stops the remaining items
/// and never reverts items completed before it.
#[derive(Debug)]
pub struct CompletionReport {
    list_id: ListId,
    completed: Vec<Item>,
    failures: Vec<ItemFailure>,
}

impl CompletionReport {
    fn new(list_id: ListId) -> Self {
        Self {
            list_id,
            completed: Vec::new(),
            failures: Vec::new(),
        }
    }

    pub fn list_id(&self) -> ListId {
        self.list_id
    }

    /// Items completed by this run, in processing order.
    pub fn completed(&self) -> &[Item] {
        &self.completed
    }

    pub fn failures(&self) -> &[ItemFailure] {
        &self.failures
    }

    pub fn is_partial(&self) -> bool {
        !self.failures.is_empty()
    }
}

/// Error type for ListService operations.
#[derive(Debug, thiserror::Error)]
pub enum ListServiceError {
    /// Represents rejected attributes, keyed by field.
    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),
    /// Represents a list not found error.
    #[error("Todo list with ID {0} not found")]
    ListNotFound(ListId),
    /// Represents a failure of the underlying store.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl From<ValidationErrors> for ListServiceError {
    fn from(errors: ValidationErrors) -> Self {
        Self::Validation(errors)
    }
}

pub struct ListService<'a, R: ?Sized> {
    repo: &'a R,
}

impl<'a, R: Repository + ?Sized> ListService<'a, R> {
    pub fn new(repo: &'a R) -> Self {
        ListService { repo }
    }

    /// Creates a new list.
    ///
    /// # Arguments
    ///
    /// * `name` - The name of the list. Must not be blank.
    ///
    /// # Returns
    ///
    /// A `Result` containing the created `TodoList` if successful, or an error otherwise.
    #[tracing::instrument(skip(self))]
    pub async fn create_list(&self, name: String) -> Result<TodoList, ListServiceError> {
        validate_name(&name)?;
        Ok(self.repo.insert_list(name).await?)
    }

    /// Retrieves all lists ordered by ID.
    #[tracing::instrument(skip(self))]
    pub async fn get_all_lists(&self) -> Result<Vec<TodoList>, ListServiceError> {
        Ok(self.repo.find_all_lists().await?)
    }

    /// Retrieves all lists along with their pending/completed status.
    #[tracing::instrument(skip(self))]
    pub async fn get_list_summaries(&self) -> Result<Vec<ListSummary>, ListServiceError> {
        let lists = self.repo.find_all_lists().await?;
        let mut summaries = Vec::with_capacity(lists.len());
        for list in lists {
            let pending = self.repo.has_pending_items(list.id()).await?;
            summaries.push(ListSummary::new(list, pending));
        }
        Ok(summaries)
    }

    /// Retrieves a list by its ID.
    #[tracing::instrument(skip(self))]
    pub async fn get_list(&self, id: ListId) -> Result<TodoList, ListServiceError> {
        self.repo
            .find_list_by_id(id)
            .await?
            .ok_or(ListServiceError::ListNotFound(id))
    }

    /// Renames a list.
    ///
    /// # Arguments
    ///
    /// * `id` - The ID of the list to rename.
    /// * `new_name` - The new name. Must not be blank.
    ///
    /// # Returns
    ///
    /// A `Result` containing the updated `TodoList` if successful, or an error otherwise.
    #[tracing::instrument(skip(self))]
    pub async fn update_list(
        &self,
        id: ListId,
        new_name: String,
    ) -> Result<TodoList, ListServiceError> {
        let mut list = self.get_list(id).await?;
        list.rename(new_name)?;
        Ok(self.repo.save_list(&list).await?)
    }

    /// Deletes a list and, with it, all of its items.
    ///
    /// # Returns
    ///
    /// A `Result` containing the deleted `TodoList` if successful, or an error otherwise.
    #[tracing::instrument(skip(self))]
    pub async fn delete_list(&self, id: ListId) -> Result<TodoList, ListServiceError> {
        let list = self.get_list(id).await?;
        if !self.repo.delete_list(id).await? {
            return Err(ListServiceError::ListNotFound(id));
        }
        Ok(list)
    }

    /// True if any item of the list is pending.
    #[tracing::instrument(skip(self))]
    pub async fn is_pending(&self, id: ListId) -> Result<bool, ListServiceError> {
        let list = self.get_list(id).await?;
        Ok(self.repo.has_pending_items(list.id()).await?)
    }

    /// True if no item of the list is pending.
    #[tracing::instrument(skip(self))]
    pub async fn is_completed(&self, id: ListId) -> Result<bool, ListServiceError> {
        Ok(!self.is_pending(id).await?)
    }

    /// Completes every item of the list that is pending at query time.
    ///
    /// Each item is completed on its own; failures are collected in the report rather
    /// than aborting the run. There is no transaction around the loop.
    ///
    /// # Returns
    ///
    /// A `Result` containing the `CompletionReport`, or an error if the list could not be
    /// loaded or its pending items could not be queried.
    #[tracing::instrument(skip(self))]
    pub async fn complete_list(&self, id: ListId) -> Result<CompletionReport, ListServiceError> {
        let list = self.get_list(id).await?;
        let pending_items = self.repo.find_pending_by_list(list.id()).await?;
        let item_service = ItemService::new(self.repo);

        let mut report = CompletionReport::new(list.id());
        for item in pending_items {
            match item_service.complete_item(list.id(), item.id()).await {
                Ok(completed) => report.completed.push(completed),
                Err(error) => {
                    tracing::warn!(
                        "Failed to complete item {} of list {}: {}",
                        item.id(),
                        list.id(),
                        error
                    );
                    report.failures.push(ItemFailure {
                        item_id: item.id(),
                        error,
                    });
                }
            }
        }

        tracing::info!(
            "Completed {} item(s) of list {} with {} failure(s)",
            report.completed.len(),
            list.id(),
            report.failures.len()
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::Item;
    use crate::repo::{ItemRepository, ListRepository, NewItem};
    use async_trait::async_trait;
    use chrono::Utc;
    use mockall::mock;
    use mockall::predicate::eq;

    mock! {
        pub Store {}

        #[async_trait]
        impl ListRepository for Store {
            async fn find_all_lists(&self) -> Result<Vec<TodoList>, StorageError>;
            async fn find_list_by_id(&self, id: ListId) -> Result<Option<TodoList>, StorageError>;
            async fn insert_list(&self, name: String) -> Result<TodoList, StorageError>;
            async fn save_list(&self, list: &TodoList) -> Result<TodoList, StorageError>;
            async fn delete_list(&self, id: ListId) -> Result<bool, StorageError>;
        }

        #[async_trait]
        impl ItemRepository for Store {
            async fn find_items_by_list(&self, list_id: ListId) -> Result<Vec<Item>, StorageError>;
            async fn find_item_by_id(&self, list_id: ListId, id: ItemId) -> Result<Option<Item>, StorageError>;
            async fn find_pending_by_list(&self, list_id: ListId) -> Result<Vec<Item>, StorageError>;
            async fn has_pending_items(&self, list_id: ListId) -> Result<bool, StorageError>;
            async fn insert_item(&self, item: NewItem) -> Result<Item, StorageError>;
            async fn save_item(&self, item: &Item) -> Result<Item, StorageError>;
            async fn delete_item(&self, id: ItemId) -> Result<bool, StorageError>;
        }
    }

    fn unavailable() -> StorageError {
        StorageError::Unavailable("connection refused".to_string())
    }

    #[tokio::test]
    async fn rejects_blank_name_without_touching_storage() {
        let store = MockStore::new();
        let service = ListService::new(&store);

        let result = service.create_list("".to_string()).await;

        match result {
            Err(ListServiceError::Validation(errors)) => assert!(errors.contains("name")),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn propagates_storage_error_from_pending_query() {
        let mut store = MockStore::new();
        store
            .expect_find_list_by_id()
            .with(eq(7))
            .returning(|id| Ok(Some(TodoList::new(id, "Setup project".to_string()))));
        store
            .expect_find_pending_by_list()
            .returning(|_| Err(unavailable()));
        let service = ListService::new(&store);

        let result = service.complete_list(7).await;

        assert!(matches!(result, Err(ListServiceError::Storage(_))));
    }

    #[tokio::test]
    async fn collects_item_failures_and_keeps_going() {
        let mut store = MockStore::new();
        store
            .expect_find_list_by_id()
            .returning(|id| Ok(Some(TodoList::new(id, "Setup project".to_string()))));
        store.expect_find_pending_by_list().returning(|list_id| {
            Ok(vec![
                Item::new(1, "Task 1".to_string(), None, list_id),
                Item::new(2, "Task 2".to_string(), None, list_id),
            ])
        });
        store
            .expect_find_item_by_id()
            .returning(|list_id, id| Ok(Some(Item::new(id, format!("Task {id}"), None, list_id))));
        store
            .expect_save_item()
            .withf(|item| item.id() == 1)
            .returning(|_| Err(unavailable()));
        store
            .expect_save_item()
            .withf(|item| item.id() == 2)
            .returning(|item| Ok(Item::clone(item)));
        let service = ListService::new(&store);

        let report = service.complete_list(3).await.unwrap();

        assert!(report.is_partial());
        assert_eq!(report.failures().len(), 1);
        assert_eq!(report.failures()[0].item_id, 1);
        assert_eq!(report.completed().len(), 1);
        assert_eq!(report.completed()[0].id(), 2);
        assert!(report.completed()[0].completed_at().unwrap() <= Utc::now());
    }

    #[tokio::test]
    async fn list_without_items_is_completed() {
        let mut store = MockStore::new();
        store
            .expect_find_list_by_id()
            .returning(|id| Ok(Some(TodoList::new(id, "Empty".to_string()))));
        store.expect_has_pending_items().returning(|_| Ok(false));
        let service = ListService::new(&store);

        assert!(service.is_completed(1).await.unwrap());
        assert!(!service.is_pending(1).await.unwrap());
    }
}
