//! Cookie sessions and the per-request session context
use chrono::NaiveDateTime;
use diesel::sql_types::VarChar;

use models::AdminRole;
use schema::sessions;

/// Namespace of a session token. Customer and admin sessions never mix.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, AsExpression, FromSqlRow)]
#[sql_type = "VarChar"]
#[serde(rename_all = "snake_case")]
pub enum SessionKind {
    Customer,
    Admin,
}

impl_varchar_sql!(SessionKind {
    Customer => "customer",
    Admin => "admin",
});

#[derive(Debug, Queryable, Clone, Identifiable, PartialEq)]
#[table_name = "sessions"]
pub struct Session {
    pub id: String,
    pub kind: SessionKind,
    pub subject_id: i32,
    pub expires_at: NaiveDateTime,
    pub created_at: NaiveDateTime,
}

#[derive(Insertable, Clone, Debug)]
#[table_name = "sessions"]
pub struct NewSession {
    pub id: String,
    pub kind: SessionKind,
    pub subject_id: i32,
    pub expires_at: NaiveDateTime,
}

/// Who is making the request
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionContext {
    Guest,
    Customer { id: i32 },
    Admin { id: i32, role: AdminRole },
}

impl Default for SessionContext {
    fn default() -> Self {
        SessionContext::Guest
    }
}

impl SessionContext {
    pub fn customer_id(&self) -> Option<i32> {
        match *self {
            SessionContext::Customer { id } => Some(id),
            _ => None,
        }
    }

    pub fn admin_id(&self) -> Option<i32> {
        match *self {
            SessionContext::Admin { id, .. } => Some(id),
            _ => None,
        }
    }
}
