use chrono::NaiveDate;
use common::BASE_CURRENCY;
use model::entities::card;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set, TransactionTrait};
use services::currency::RateProvider;
use tracing::{debug, warn};

use super::StoreError;

/// Warning surfaced when the rate lookup fails and the cached SGD price
/// degrades to zero instead of blocking the save.
pub const RATE_WARNING: &str = "Failed to get exchange rate, SGD purchase price set to 0";

/// Everything needed to write a card row, minus the derived SGD price.
#[derive(Debug, Clone)]
pub struct CardInput {
    pub name: String,
    pub set_name: Option<String>,
    pub card_number: Option<String>,
    pub rarity: Option<String>,
    pub color: Option<String>,
    pub quantity: i32,
    pub purchase_price_original: Decimal,
    pub original_currency: String,
    pub current_value_sgd: Decimal,
    pub image_url: Option<String>,
    pub purchase_date: NaiveDate,
    pub collection_id: Option<i32>,
}

/// A persisted card plus the conversion warning, if any.
pub struct SavedCard {
    pub card: card::Model,
    pub warning: Option<String>,
}

/// Convert an amount into SGD.
///
/// Same-currency amounts pass through untouched without a rate call. A
/// failed lookup degrades the amount to zero with a warning — the record
/// is never lost over a missing rate.
pub async fn convert_to_sgd(
    rates: &dyn RateProvider,
    amount: Decimal,
    currency: &str,
) -> (Decimal, Option<String>) {
    if currency == BASE_CURRENCY {
        return (amount, None);
    }
    match rates.convert_rate(currency, BASE_CURRENCY).await {
        Some(rate) => (amount * rate, None),
        None => {
            warn!(
                "no {}->{} rate available, storing zero SGD price",
                currency, BASE_CURRENCY
            );
            (Decimal::ZERO, Some(RATE_WARNING.to_string()))
        }
    }
}

fn active_model(input: CardInput, purchase_price_sgd: Decimal) -> card::ActiveModel {
    card::ActiveModel {
        name: Set(input.name),
        set_name: Set(input.set_name),
        card_number: Set(input.card_number),
        rarity: Set(input.rarity),
        color: Set(input.color),
        quantity: Set(input.quantity),
        purchase_price_original: Set(input.purchase_price_original),
        original_currency: Set(input.original_currency),
        purchase_price_sgd: Set(purchase_price_sgd),
        current_value_sgd: Set(input.current_value_sgd),
        image_url: Set(input.image_url),
        purchase_date: Set(input.purchase_date),
        collection_id: Set(input.collection_id),
        ..Default::default()
    }
}

/// Create one card, computing its cached SGD purchase price.
pub async fn create_card(
    db: &DatabaseConnection,
    rates: &dyn RateProvider,
    input: CardInput,
) -> Result<SavedCard, StoreError> {
    let (purchase_price_sgd, warning) =
        convert_to_sgd(rates, input.purchase_price_original, &input.original_currency).await;

    let model = active_model(input, purchase_price_sgd).insert(db).await?;
    debug!("card {} created", model.id);
    Ok(SavedCard {
        card: model,
        warning,
    })
}

/// Create a batch of cards in one transaction.
///
/// Conversions happen before the transaction opens (no external calls
/// mid-transaction); the inserts are then all-or-nothing. Returns the
/// persisted cards and any conversion warnings.
pub async fn create_cards(
    db: &DatabaseConnection,
    rates: &dyn RateProvider,
    inputs: Vec<CardInput>,
) -> Result<(Vec<card::Model>, Vec<String>), StoreError> {
    let mut prepared = Vec::with_capacity(inputs.len());
    let mut warnings = Vec::new();

    for input in inputs {
        let (purchase_price_sgd, warning) =
            convert_to_sgd(rates, input.purchase_price_original, &input.original_currency).await;
        if let Some(warning) = warning {
            warnings.push(format!("{}: {}", input.name, warning));
        }
        prepared.push(active_model(input, purchase_price_sgd));
    }

    let txn = db.begin().await?;
    let mut models = Vec::with_capacity(prepared.len());
    for active in prepared {
        models.push(active.insert(&txn).await?);
    }
    txn.commit().await?;

    Ok((models, warnings))
}

/// Replace a card's fields, recomputing the cached SGD price whenever the
/// original price or currency changed.
pub async fn update_card(
    db: &DatabaseConnection,
    rates: &dyn RateProvider,
    id: i32,
    input: CardInput,
) -> Result<SavedCard, StoreError> {
    let existing = card::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or(StoreError::NotFound { entity: "card", id })?;

    let valuation_changed = existing.purchase_price_original != input.purchase_price_original
        || existing.original_currency != input.original_currency;

    let (purchase_price_sgd, warning) = if valuation_changed {
        convert_to_sgd(rates, input.purchase_price_original, &input.original_currency).await
    } else {
        (existing.purchase_price_sgd, None)
    };

    let mut active = active_model(input, purchase_price_sgd);
    active.id = Set(existing.id);

    let model = active.update(db).await?;
    debug!("card {} updated", model.id);
    Ok(SavedCard {
        card: model,
        warning,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use migration::{Migrator, MigratorTrait};
    use sea_orm::{ConnectionTrait, Database};
    use services::currency::FakeRateProvider;

    async fn setup_db() -> DatabaseConnection {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db.execute_unprepared("PRAGMA foreign_keys = ON;")
            .await
            .unwrap();
        Migrator::up(&db, None).await.unwrap();
        db
    }

    fn input(price: Decimal, currency: &str) -> CardInput {
        CardInput {
            name: "Zoro".to_string(),
            set_name: Some("OP01".to_string()),
            card_number: Some("OP01-025".to_string()),
            rarity: Some("Super Rare".to_string()),
            color: Some("Green".to_string()),
            quantity: 2,
            purchase_price_original: price,
            original_currency: currency.to_string(),
            current_value_sgd: Decimal::ZERO,
            image_url: None,
            purchase_date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            collection_id: None,
        }
    }

    #[tokio::test]
    async fn test_sgd_purchase_skips_conversion_entirely() {
        let db = setup_db().await;
        let rates = FakeRateProvider::with_rate(Decimal::new(135, 2));

        let saved = create_card(&db, &rates, input(Decimal::new(2500, 2), "SGD"))
            .await
            .unwrap();

        assert_eq!(saved.card.purchase_price_sgd, Decimal::new(2500, 2));
        assert!(saved.warning.is_none());
        assert_eq!(rates.calls(), 0);
    }

    #[tokio::test]
    async fn test_foreign_purchase_converts_with_stubbed_rate() {
        let db = setup_db().await;
        let rates = FakeRateProvider::with_rate(Decimal::new(135, 2)); // 1.35

        let saved = create_card(&db, &rates, input(Decimal::new(2500, 2), "USD"))
            .await
            .unwrap();

        // 25.00 * 1.35 = 33.75
        assert_eq!(saved.card.purchase_price_sgd, Decimal::new(3375, 2));
        assert!(saved.warning.is_none());
        assert_eq!(rates.calls(), 1);
    }

    #[tokio::test]
    async fn test_missing_rate_degrades_to_zero_with_warning() {
        let db = setup_db().await;
        let rates = FakeRateProvider::unavailable();

        let saved = create_card(&db, &rates, input(Decimal::new(2500, 2), "USD"))
            .await
            .unwrap();

        // The record is saved regardless; only the valuation degrades.
        assert_eq!(saved.card.purchase_price_sgd, Decimal::ZERO);
        assert_eq!(saved.warning.as_deref(), Some(RATE_WARNING));
        assert_eq!(
            saved.card.purchase_price_original,
            Decimal::new(2500, 2)
        );
    }

    #[tokio::test]
    async fn test_update_recomputes_when_currency_changes() {
        let db = setup_db().await;
        let rates = FakeRateProvider::with_rate(Decimal::new(135, 2));

        let saved = create_card(&db, &rates, input(Decimal::new(2500, 2), "SGD"))
            .await
            .unwrap();
        assert_eq!(rates.calls(), 0);

        let updated = update_card(&db, &rates, saved.card.id, input(Decimal::new(2500, 2), "USD"))
            .await
            .unwrap();

        assert_eq!(updated.card.purchase_price_sgd, Decimal::new(3375, 2));
        assert_eq!(rates.calls(), 1);
    }

    #[tokio::test]
    async fn test_update_keeps_cached_price_when_valuation_unchanged() {
        let db = setup_db().await;
        let rates = FakeRateProvider::with_rate(Decimal::new(135, 2));

        let saved = create_card(&db, &rates, input(Decimal::new(2500, 2), "USD"))
            .await
            .unwrap();
        assert_eq!(rates.calls(), 1);

        // Change an unrelated field only: no recompute, no extra call.
        let mut changed = input(Decimal::new(2500, 2), "USD");
        changed.rarity = Some("Leader".to_string());
        let updated = update_card(&db, &rates, saved.card.id, changed).await.unwrap();

        assert_eq!(updated.card.purchase_price_sgd, Decimal::new(3375, 2));
        assert_eq!(rates.calls(), 1);
    }

    #[tokio::test]
    async fn test_batch_create_persists_all_and_collects_warnings() {
        let db = setup_db().await;
        let rates = FakeRateProvider::unavailable();

        let (models, warnings) = create_cards(
            &db,
            &rates,
            vec![
                input(Decimal::new(2500, 2), "SGD"),
                input(Decimal::new(1000, 2), "USD"),
            ],
        )
        .await
        .unwrap();

        assert_eq!(models.len(), 2);
        assert_eq!(models[0].purchase_price_sgd, Decimal::new(2500, 2));
        assert_eq!(models[1].purchase_price_sgd, Decimal::ZERO);
        assert_eq!(warnings.len(), 1);
        assert_eq!(card::Entity::find().all(&db).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_update_missing_card_is_not_found() {
        let db = setup_db().await;
        let rates = FakeRateProvider::with_rate(Decimal::ONE);

        let result = update_card(&db, &rates, 42, input(Decimal::ONE, "SGD")).await;
        assert!(matches!(result, Err(StoreError::NotFound { .. })));
    }
}
