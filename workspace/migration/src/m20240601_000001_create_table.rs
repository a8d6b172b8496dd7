use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create collections table
        manager
            .create_table(
                Table::create()
                    .table(Collections::Table)
                    .if_not_exists()
                    .col(pk_auto(Collections::Id))
                    .col(string(Collections::Name).unique_key())
                    .col(string_null(Collections::Description))
                    .to_owned(),
            )
            .await?;

        // Create cards table
        manager
            .create_table(
                Table::create()
                    .table(Cards::Table)
                    .if_not_exists()
                    .col(pk_auto(Cards::Id))
                    .col(string(Cards::Name))
                    .col(string_null(Cards::SetName))
                    .col(string_null(Cards::CardNumber))
                    .col(string_null(Cards::Rarity))
                    .col(string_null(Cards::Color))
                    .col(integer(Cards::Quantity).default(1))
                    .col(decimal_len(Cards::PurchasePriceOriginal, 16, 4).default(0))
                    .col(string(Cards::OriginalCurrency).default("SGD"))
                    .col(decimal_len(Cards::PurchasePriceSgd, 16, 4).default(0))
                    .col(decimal_len(Cards::CurrentValueSgd, 16, 4).default(0))
                    .col(string_null(Cards::ImageUrl))
                    .col(date(Cards::PurchaseDate))
                    .col(integer_null(Cards::CollectionId))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_card_collection")
                            .from(Cards::Table, Cards::CollectionId)
                            .to(Collections::Table, Collections::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create expenses table
        manager
            .create_table(
                Table::create()
                    .table(Expenses::Table)
                    .if_not_exists()
                    .col(pk_auto(Expenses::Id))
                    .col(string(Expenses::Description))
                    .col(decimal_len(Expenses::AmountSgd, 16, 4))
                    .col(string(Expenses::Category))
                    .col(date(Expenses::ExpenseDate))
                    .col(integer_null(Expenses::CardId))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_expense_card")
                            .from(Expenses::Table, Expenses::CardId)
                            .to(Cards::Table, Cards::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create wishlist_items table
        manager
            .create_table(
                Table::create()
                    .table(WishlistItems::Table)
                    .if_not_exists()
                    .col(pk_auto(WishlistItems::Id))
                    .col(string(WishlistItems::CardName))
                    .col(string_null(WishlistItems::SetName))
                    .col(decimal_len(WishlistItems::TargetPriceSgd, 16, 4).default(0))
                    .col(string_len(WishlistItems::Priority, 20).default("Medium"))
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(WishlistItems::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Expenses::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Cards::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Collections::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Collections {
    Table,
    Id,
    Name,
    Description,
}

#[derive(DeriveIden)]
enum Cards {
    Table,
    Id,
    Name,
    SetName,
    CardNumber,
    Rarity,
    Color,
    Quantity,
    PurchasePriceOriginal,
    OriginalCurrency,
    PurchasePriceSgd,
    CurrentValueSgd,
    ImageUrl,
    PurchaseDate,
    CollectionId,
}

#[derive(DeriveIden)]
enum Expenses {
    Table,
    Id,
    Description,
    AmountSgd,
    Category,
    ExpenseDate,
    CardId,
}

#[derive(DeriveIden)]
enum WishlistItems {
    Table,
    Id,
    CardName,
    SetName,
    TargetPriceSgd,
    Priority,
}
