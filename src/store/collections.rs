use model::entities::{card, collection};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set, SqlErr,
    TransactionTrait,
};
use tracing::{debug, info};

use super::StoreError;

/// Create a collection, enforcing name uniqueness.
pub async fn create_collection(
    db: &DatabaseConnection,
    name: &str,
    description: Option<String>,
) -> Result<collection::Model, StoreError> {
    let existing = collection::Entity::find()
        .filter(collection::Column::Name.eq(name))
        .one(db)
        .await?;
    if existing.is_some() {
        return Err(StoreError::DuplicateName(name.to_string()));
    }

    let new_collection = collection::ActiveModel {
        name: Set(name.to_string()),
        description: Set(description),
        ..Default::default()
    };

    // The unique index is the authority; a concurrent insert between the
    // check above and this insert still surfaces as DuplicateName.
    new_collection.insert(db).await.map_err(|e| {
        if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
            StoreError::DuplicateName(name.to_string())
        } else {
            StoreError::Database(e)
        }
    })
}

/// Update name and/or description of a collection.
pub async fn update_collection(
    db: &DatabaseConnection,
    id: i32,
    name: Option<String>,
    description: Option<String>,
) -> Result<collection::Model, StoreError> {
    let existing = collection::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or(StoreError::NotFound {
            entity: "collection",
            id,
        })?;

    if let Some(new_name) = name.as_deref() {
        if new_name != existing.name {
            let clash = collection::Entity::find()
                .filter(collection::Column::Name.eq(new_name))
                .one(db)
                .await?;
            if clash.is_some() {
                return Err(StoreError::DuplicateName(new_name.to_string()));
            }
        }
    }

    let attempted_name = name.clone().unwrap_or_else(|| existing.name.clone());
    let mut active: collection::ActiveModel = existing.into();
    if let Some(name) = name {
        active.name = Set(name);
    }
    if let Some(description) = description {
        active.description = Set(Some(description));
    }

    active.update(db).await.map_err(|e| {
        if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
            StoreError::DuplicateName(attempted_name.clone())
        } else {
            StoreError::Database(e)
        }
    })
}

/// Delete a collection and every card it owns, atomically.
///
/// Returns the number of cards removed. The whole cascade runs in one
/// transaction: either all rows go, or none do.
pub async fn delete_collection(db: &DatabaseConnection, id: i32) -> Result<u64, StoreError> {
    let txn = db.begin().await?;

    let collection =
        collection::Entity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or(StoreError::NotFound {
                entity: "collection",
                id,
            })?;

    let deleted = card::Entity::delete_many()
        .filter(card::Column::CollectionId.eq(collection.id))
        .exec(&txn)
        .await?;
    debug!(
        "deleting collection {} removes {} owned card(s)",
        id, deleted.rows_affected
    );

    collection::Entity::delete_by_id(id).exec(&txn).await?;
    txn.commit().await?;

    info!("collection {} deleted with {} card(s)", id, deleted.rows_affected);
    Ok(deleted.rows_affected)
}
