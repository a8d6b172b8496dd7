//! This file serves as the root for all SeaORM entity modules.
//! The four entities of the card tracker live here: a `Collection` groups
//! owned `Card`s, an `Expense` may point at a card, and a `WishlistItem`
//! stands alone.

pub mod card;
pub mod collection;
pub mod expense;
pub mod wishlist_item;

pub mod prelude {
    //! A prelude module for easy importing of all entities.
    pub use super::card::Entity as Card;
    pub use super::collection::Entity as Collection;
    pub use super::expense::Entity as Expense;
    pub use super::wishlist_item::Entity as WishlistItem;
}

#[cfg(test)]
mod test {
    use chrono::NaiveDate;
    use migration::{Migrator, MigratorTrait};
    use rust_decimal::Decimal;
    use sea_orm::{
        ActiveModelTrait, ColumnTrait, ConnectionTrait, Database, DatabaseConnection, DbErr,
        EntityTrait, QueryFilter, Set,
    };

    use super::*;
    use prelude::*;

    async fn setup_db() -> Result<DatabaseConnection, DbErr> {
        // Connect to the SQLite database
        let db = Database::connect("sqlite::memory:").await?;

        // Enable foreign keys
        db.execute_unprepared("PRAGMA foreign_keys = ON;").await?;

        // Apply migrations
        Migrator::up(&db, None).await.expect("Migrations failed.");
        Ok(db)
    }

    fn sample_card(name: &str, collection_id: Option<i32>) -> card::ActiveModel {
        card::ActiveModel {
            name: Set(name.to_string()),
            set_name: Set(Some("OP01".to_string())),
            card_number: Set(Some("OP01-025".to_string())),
            rarity: Set(Some("Super Rare".to_string())),
            color: Set(Some("Green".to_string())),
            quantity: Set(1),
            purchase_price_original: Set(Decimal::new(2500, 2)), // 25.00
            original_currency: Set("SGD".to_string()),
            purchase_price_sgd: Set(Decimal::new(2500, 2)),
            current_value_sgd: Set(Decimal::ZERO),
            image_url: Set(None),
            purchase_date: Set(NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()),
            collection_id: Set(collection_id),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_entity_integration() -> Result<(), DbErr> {
        let db = setup_db().await?;

        // Create a collection
        let op01 = collection::ActiveModel {
            name: Set("OP01 Romance Dawn".to_string()),
            description: Set(Some("First set binder".to_string())),
            ..Default::default()
        }
        .insert(&db)
        .await?;

        // Create cards, one inside the collection and one uncategorized
        let zoro = sample_card("Roronoa Zoro", Some(op01.id)).insert(&db).await?;
        let luffy = sample_card("Monkey D. Luffy", None).insert(&db).await?;

        // Create an expense linked to a card
        let sleeves = expense::ActiveModel {
            description: Set("Card sleeves".to_string()),
            amount_sgd: Set(Decimal::new(1250, 2)), // 12.50
            category: Set("Supplies".to_string()),
            expense_date: Set(NaiveDate::from_ymd_opt(2024, 6, 2).unwrap()),
            card_id: Set(Some(zoro.id)),
            ..Default::default()
        }
        .insert(&db)
        .await?;

        // Create a wishlist item
        let wanted = wishlist_item::ActiveModel {
            card_name: Set("Shanks".to_string()),
            set_name: Set(Some("OP01".to_string())),
            target_price_sgd: Set(Decimal::new(8000, 2)), // 80.00
            priority: Set(wishlist_item::Priority::High),
            ..Default::default()
        }
        .insert(&db)
        .await?;

        // Read back and verify
        let collections = Collection::find().all(&db).await?;
        assert_eq!(collections.len(), 1);
        assert_eq!(collections[0].name, "OP01 Romance Dawn");

        let cards = Card::find().all(&db).await?;
        assert_eq!(cards.len(), 2);
        assert!(cards.iter().any(|c| c.name == "Roronoa Zoro"));
        assert!(cards.iter().any(|c| c.collection_id.is_none()));

        let expenses = Expense::find().all(&db).await?;
        assert_eq!(expenses.len(), 1);
        assert_eq!(expenses[0].card_id, Some(zoro.id));
        assert_eq!(expenses[0].amount_sgd, Decimal::new(1250, 2));

        let wishlist = WishlistItem::find().all(&db).await?;
        assert_eq!(wishlist.len(), 1);
        assert_eq!(wishlist[0].id, wanted.id);
        assert_eq!(wishlist[0].priority, wishlist_item::Priority::High);

        // Deleting a card must null out the expense reference, not block
        Card::delete_by_id(zoro.id).exec(&db).await?;
        let orphaned = Expense::find_by_id(sleeves.id).one(&db).await?.unwrap();
        assert_eq!(orphaned.card_id, None);

        // Deleting a collection cascades to its cards at the schema level
        Collection::delete_by_id(op01.id).exec(&db).await?;
        let remaining = Card::find().all(&db).await?;
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, luffy.id);

        // The uncategorized card is untouched
        let uncategorized = Card::find()
            .filter(card::Column::CollectionId.is_null())
            .all(&db)
            .await?;
        assert_eq!(uncategorized.len(), 1);

        Ok(())
    }

    #[tokio::test]
    async fn test_collection_name_unique() -> Result<(), DbErr> {
        let db = setup_db().await?;

        collection::ActiveModel {
            name: Set("Binder".to_string()),
            description: Set(None),
            ..Default::default()
        }
        .insert(&db)
        .await?;

        let duplicate = collection::ActiveModel {
            name: Set("Binder".to_string()),
            description: Set(Some("second".to_string())),
            ..Default::default()
        }
        .insert(&db)
        .await;

        assert!(duplicate.is_err());
        assert_eq!(Collection::find().all(&db).await?.len(), 1);
        Ok(())
    }
}
