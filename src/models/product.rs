//! Module containg product model for query, insert, update
use chrono::NaiveDateTime;
use validator::Validate;

use models::validation_rules::*;
use models::{Category, Money};
use schema::products;

/// Payload for querying products
#[derive(Debug, Serialize, Deserialize, Associations, Queryable, Clone, Identifiable, PartialEq)]
#[belongs_to(Category)]
#[table_name = "products"]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: i32,
    pub name_en: String,
    pub name_ar: String,
    pub description_en: Option<String>,
    pub description_ar: Option<String>,
    pub price: Money,
    pub category_id: i32,
    pub image: Option<String>,
    pub stock: i32,
    pub is_active: bool,
    pub is_featured: bool,
    pub is_available: bool,
    pub sort_order: i32,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Product {
    /// Whether the product may be put into an order
    pub fn is_orderable(&self) -> bool {
        self.is_active && self.is_available
    }
}

/// Payload for creating products
#[derive(Serialize, Deserialize, Validate, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    #[validate(custom = "validate_not_blank")]
    pub name_en: String,
    #[validate(custom = "validate_not_blank")]
    pub name_ar: String,
    pub description_en: Option<String>,
    pub description_ar: Option<String>,
    #[validate(custom = "validate_non_negative_money")]
    pub price: Money,
    pub category_id: i32,
    pub image: Option<String>,
    #[validate(range(min = "0", max = "2147483647"))]
    pub stock: Option<i32>,
    pub is_active: Option<bool>,
    pub is_featured: Option<bool>,
    pub is_available: Option<bool>,
    pub sort_order: Option<i32>,
}

/// Row inserted into `products`
#[derive(Insertable, Clone, Debug)]
#[table_name = "products"]
pub struct InsertProduct {
    pub name_en: String,
    pub name_ar: String,
    pub description_en: Option<String>,
    pub description_ar: Option<String>,
    pub price: Money,
    pub category_id: i32,
    pub image: Option<String>,
    pub stock: i32,
    pub is_active: bool,
    pub is_featured: bool,
    pub is_available: bool,
    pub sort_order: i32,
}

impl InsertProduct {
    pub fn new(payload: NewProduct, sort_order: i32) -> Self {
        Self {
            name_en: payload.name_en,
            name_ar: payload.name_ar,
            description_en: payload.description_en,
            description_ar: payload.description_ar,
            price: payload.price,
            category_id: payload.category_id,
            image: payload.image,
            stock: payload.stock.unwrap_or(0),
            is_active: payload.is_active.unwrap_or(true),
            is_featured: payload.is_featured.unwrap_or(false),
            is_available: payload.is_available.unwrap_or(true),
            sort_order: payload.sort_order.unwrap_or(sort_order),
        }
    }
}

/// Payload for updating products
#[derive(Serialize, Deserialize, AsChangeset, Validate, Clone, Debug, Default)]
#[table_name = "products"]
#[serde(rename_all = "camelCase")]
pub struct UpdateProduct {
    #[validate(custom = "validate_not_blank")]
    pub name_en: Option<String>,
    #[validate(custom = "validate_not_blank")]
    pub name_ar: Option<String>,
    pub description_en: Option<String>,
    pub description_ar: Option<String>,
    #[validate(custom = "validate_non_negative_money")]
    pub price: Option<Money>,
    pub category_id: Option<i32>,
    pub image: Option<String>,
    #[validate(range(min = "0", max = "2147483647"))]
    pub stock: Option<i32>,
    pub is_active: Option<bool>,
    pub is_featured: Option<bool>,
    pub is_available: Option<bool>,
    pub sort_order: Option<i32>,
    #[serde(skip)]
    pub updated_at: Option<NaiveDateTime>,
}

/// Payload for moving a product to another category
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct MoveProduct {
    pub category_id: i32,
}

#[derive(Clone, Debug, Default)]
pub struct ProductsSearch {
    pub search: Option<String>,
    pub category_id: Option<i32>,
    pub featured: Option<bool>,
    /// Only active products in active categories
    pub public_only: bool,
}
