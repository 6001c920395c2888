//! Storefront customer accounts
use chrono::NaiveDateTime;
use validator::Validate;

use models::validation_rules::*;
use schema::website_users;

#[derive(Debug, Serialize, Queryable, Clone, Identifiable, PartialEq)]
#[table_name = "website_users"]
#[serde(rename_all = "camelCase")]
pub struct WebsiteUser {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl WebsiteUser {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Registration payload
#[derive(Serialize, Deserialize, Validate, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct NewWebsiteUser {
    #[validate(custom = "validate_not_blank")]
    pub first_name: String,
    #[validate(custom = "validate_not_blank")]
    pub last_name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = "8"))]
    pub phone: String,
    #[validate(length(min = "6"))]
    pub password: String,
}

#[derive(Insertable, Clone, Debug)]
#[table_name = "website_users"]
pub struct InsertWebsiteUser {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub password_hash: String,
}

/// Admin update of a customer account
#[derive(Serialize, Deserialize, AsChangeset, Validate, Clone, Debug, Default)]
#[table_name = "website_users"]
#[serde(rename_all = "camelCase")]
pub struct UpdateWebsiteUser {
    #[validate(custom = "validate_not_blank")]
    pub first_name: Option<String>,
    #[validate(custom = "validate_not_blank")]
    pub last_name: Option<String>,
    #[validate(length(min = "8"))]
    pub phone: Option<String>,
    pub is_active: Option<bool>,
    #[serde(skip)]
    pub updated_at: Option<NaiveDateTime>,
}

/// Login payload shared by customers (email) and admins (username or email)
#[derive(Serialize, Deserialize, Validate, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct LoginPayload {
    #[validate(length(min = "1"))]
    pub login: String,
    #[validate(length(min = "1"))]
    pub password: String,
}
