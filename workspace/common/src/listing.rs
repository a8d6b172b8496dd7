use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// One marketplace listing matched against a normalized card number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PriceListing {
    /// Displayed listing title.
    pub title: String,
    /// The normalized card number the listing matched.
    pub card_number: String,
    /// Rarity tag shown on the listing, when present.
    pub rarity: Option<String>,
    /// Listed price in major units, thousands separators stripped.
    pub price: i64,
}
