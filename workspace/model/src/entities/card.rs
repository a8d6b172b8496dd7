use sea_orm::entity::prelude::*;

/// A single owned card, or a stack of identical copies.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "cards")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    pub set_name: Option<String>,
    /// Optionally a normalized `"<SET>-<NUMBER>"` composite, e.g. "OP01-025".
    pub card_number: Option<String>,
    pub rarity: Option<String>,
    pub color: Option<String>,
    /// Number of identical copies. Always positive.
    pub quantity: i32,
    /// Price paid, in the currency it was paid in.
    pub purchase_price_original: Decimal,
    /// ISO 4217 code of the purchase currency.
    pub original_currency: String,
    /// Derived cache: the purchase price converted to SGD at last save.
    /// Recomputed whenever the original price or currency changes; never
    /// authoritative.
    pub purchase_price_sgd: Decimal,
    /// Current estimated market value in SGD.
    pub current_value_sgd: Decimal,
    pub image_url: Option<String>,
    pub purchase_date: Date,
    /// A card may be uncategorized.
    pub collection_id: Option<i32>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// A card optionally belongs to one collection.
    #[sea_orm(
        belongs_to = "super::collection::Entity",
        from = "Column::CollectionId",
        to = "super::collection::Column::Id"
    )]
    Collection,
    /// Expenses may reference this card (weak, non-owning back-reference).
    #[sea_orm(has_many = "super::expense::Entity")]
    Expense,
}

impl Related<super::collection::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Collection.def()
    }
}

impl Related<super::expense::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Expense.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
