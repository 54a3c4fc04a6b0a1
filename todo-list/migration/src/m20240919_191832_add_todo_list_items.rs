use sea_orm_migration::prelude::*;
use sea_orm_migration::schema::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

const FK_ITEMS_TO_LISTS: &str = "fk-todo_list_items-todo_list_id";
const IDX_ITEMS_LIST_ID: &str = "idx-todo_list_items-todo_list_id";

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(TodoListItems::Table)
                    .if_not_exists()
                    .col(pk_auto(TodoListItems::Id))
                    .col(string(TodoListItems::Description))
                    .col(timestamp_with_time_zone_null(TodoListItems::CompletedAt))
                    .col(integer(TodoListItems::TodoListId))
                    .foreign_key(
                        ForeignKey::create()
                            .name(FK_ITEMS_TO_LISTS)
                            .from(TodoListItems::Table, TodoListItems::TodoListId)
                            .to(TodoLists::Table, TodoLists::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::NoAction),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name(IDX_ITEMS_LIST_ID)
                    .table(TodoListItems::Table)
                    .col(TodoListItems::TodoListId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name(IDX_ITEMS_LIST_ID)
                    .table(TodoListItems::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_table(Table::drop().table(TodoListItems::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum TodoLists {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum TodoListItems {
    Table,
    Id,
    Description,
    CompletedAt,
    TodoListId,
}
