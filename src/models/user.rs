//! Back-office accounts
use chrono::NaiveDateTime;
use diesel::sql_types::VarChar;
use validator::Validate;

use schema::users;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, AsExpression, FromSqlRow)]
#[sql_type = "VarChar"]
#[serde(rename_all = "snake_case")]
pub enum AdminRole {
    Administrator,
    Moderator,
}

impl_varchar_sql!(AdminRole {
    Administrator => "administrator",
    Moderator => "moderator",
});

#[derive(Debug, Serialize, Queryable, Clone, Identifiable, PartialEq)]
#[table_name = "users"]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i32,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: AdminRole,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Serialize, Deserialize, Validate, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    #[validate(length(min = "3", max = "64"))]
    pub username: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = "6"))]
    pub password: String,
    pub role: AdminRole,
}

#[derive(Insertable, Clone, Debug)]
#[table_name = "users"]
pub struct InsertUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role: AdminRole,
}

/// Payload for updating admin accounts. A new `password` is hashed by the service.
#[derive(Serialize, Deserialize, Validate, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUser {
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(min = "6"))]
    pub password: Option<String>,
    pub role: Option<AdminRole>,
    pub is_active: Option<bool>,
}

#[derive(AsChangeset, Clone, Debug, Default)]
#[table_name = "users"]
pub struct UserChangeset {
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub role: Option<AdminRole>,
    pub is_active: Option<bool>,
    pub updated_at: Option<NaiveDateTime>,
}
