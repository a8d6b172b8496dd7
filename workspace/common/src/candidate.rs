use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A card record proposed by the AI extractor, not yet persisted.
///
/// Every field is already normalized and default-filled by the extractor:
/// handlers can persist a candidate without further massaging.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CardCandidate {
    pub name: String,
    pub set_name: String,
    /// Composite `"<SET>-<NUMBER>"` form where both parts were known.
    pub card_number: String,
    pub rarity: String,
    pub color: String,
    pub quantity: i32,
    pub purchase_price_original: Decimal,
    /// ISO 4217 code of the purchase currency.
    pub original_currency: String,
    pub purchase_date: NaiveDate,
    pub image_url: String,
}

impl CardCandidate {
    /// A blank candidate carrying the documented per-field defaults.
    pub fn empty(today: NaiveDate) -> Self {
        Self {
            name: "Unknown Card".to_string(),
            set_name: String::new(),
            card_number: String::new(),
            rarity: String::new(),
            color: String::new(),
            quantity: 1,
            purchase_price_original: Decimal::ZERO,
            original_currency: crate::BASE_CURRENCY.to_string(),
            purchase_date: today,
            image_url: String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_candidate_defaults() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let candidate = CardCandidate::empty(today);
        assert_eq!(candidate.name, "Unknown Card");
        assert_eq!(candidate.quantity, 1);
        assert_eq!(candidate.purchase_price_original, Decimal::ZERO);
        assert_eq!(candidate.original_currency, "SGD");
        assert_eq!(candidate.purchase_date, today);
        assert!(candidate.card_number.is_empty());
    }
}
