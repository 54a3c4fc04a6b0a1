use sea_orm_migration::prelude::*;
use sea_orm_migration::schema::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(TodoLists::Table)
                    .if_not_exists()
                    .col(pk_auto(TodoLists::Id))
                    .col(string(TodoLists::Name))
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(TodoLists::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum TodoLists {
    Table,
    Id,
    Name,
}
