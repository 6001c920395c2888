//! Catalog categories. Categories form one flat list ranked by `sort_order`.
use chrono::NaiveDateTime;
use validator::Validate;

use models::validation_rules::*;
use schema::categories;

#[derive(Debug, Serialize, Deserialize, Queryable, Clone, Identifiable, PartialEq)]
#[table_name = "categories"]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: i32,
    pub name_en: String,
    pub name_ar: String,
    pub description_en: Option<String>,
    pub description_ar: Option<String>,
    pub slug: String,
    pub image: Option<String>,
    pub is_active: bool,
    pub sort_order: i32,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Payload for creating categories. Missing `sort_order` puts the category last.
#[derive(Serialize, Deserialize, Clone, Validate, Debug)]
#[serde(rename_all = "camelCase")]
pub struct NewCategory {
    #[validate(custom = "validate_not_blank")]
    pub name_en: String,
    #[validate(custom = "validate_not_blank")]
    pub name_ar: String,
    pub description_en: Option<String>,
    pub description_ar: Option<String>,
    #[validate(custom = "validate_slug")]
    pub slug: String,
    pub image: Option<String>,
    pub is_active: Option<bool>,
    pub sort_order: Option<i32>,
}

/// Row inserted into `categories`
#[derive(Insertable, Clone, Debug)]
#[table_name = "categories"]
pub struct InsertCategory {
    pub name_en: String,
    pub name_ar: String,
    pub description_en: Option<String>,
    pub description_ar: Option<String>,
    pub slug: String,
    pub image: Option<String>,
    pub is_active: bool,
    pub sort_order: i32,
}

impl InsertCategory {
    pub fn new(payload: NewCategory, sort_order: i32) -> Self {
        Self {
            name_en: payload.name_en,
            name_ar: payload.name_ar,
            description_en: payload.description_en,
            description_ar: payload.description_ar,
            slug: payload.slug,
            image: payload.image,
            is_active: payload.is_active.unwrap_or(true),
            sort_order: payload.sort_order.unwrap_or(sort_order),
        }
    }
}

/// Payload for updating categories
#[derive(Serialize, Deserialize, AsChangeset, Validate, Clone, Debug, Default)]
#[table_name = "categories"]
#[serde(rename_all = "camelCase")]
pub struct UpdateCategory {
    #[validate(custom = "validate_not_blank")]
    pub name_en: Option<String>,
    #[validate(custom = "validate_not_blank")]
    pub name_ar: Option<String>,
    pub description_en: Option<String>,
    pub description_ar: Option<String>,
    #[validate(custom = "validate_slug")]
    pub slug: Option<String>,
    pub image: Option<String>,
    pub is_active: Option<bool>,
    pub sort_order: Option<i32>,
    #[serde(skip)]
    pub updated_at: Option<NaiveDateTime>,
}

/// Admin view of a single category
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CategoryWithCount {
    #[serde(flatten)]
    pub category: Category,
    pub product_count: i64,
}

/// Result of the cascading category delete
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DeletedCategory {
    pub id: i32,
    pub deleted_products: usize,
}

#[derive(Clone, Debug, Default)]
pub struct CategoriesSearch {
    pub search: Option<String>,
    pub active_only: bool,
}
