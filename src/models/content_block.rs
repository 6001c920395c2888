//! CMS-like content sections (about, contact, footer, hero, legal pages)
use chrono::NaiveDateTime;
use serde_json;
use validator::Validate;

use models::validation_rules::*;
use schema::content_blocks;

#[derive(Debug, Serialize, Deserialize, Queryable, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ContentBlock {
    pub section: String,
    pub content: serde_json::Value,
    pub updated_at: NaiveDateTime,
}

/// Payload for replacing a section
#[derive(Serialize, Deserialize, Validate, Clone, Debug)]
pub struct UpdateContent {
    #[validate(custom = "validate_json_object")]
    pub content: serde_json::Value,
}

#[derive(Insertable, AsChangeset, Clone, Debug)]
#[table_name = "content_blocks"]
pub struct UpsertContent {
    pub section: String,
    pub content: serde_json::Value,
    pub updated_at: NaiveDateTime,
}
