//! Saved delivery addresses of website users
use chrono::NaiveDateTime;
use validator::Validate;

use models::validation_rules::*;
use models::CustomerInfo;
use schema::user_addresses;

#[derive(Debug, Serialize, Deserialize, Queryable, Clone, Identifiable, PartialEq)]
#[table_name = "user_addresses"]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub id: i32,
    pub user_id: i32,
    pub title: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub area: String,
    pub is_default: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Address {
    pub fn is_owned_by(&self, user_id: i32) -> bool {
        self.user_id == user_id
    }
}

/// Address form, used both for saved addresses and the authenticated
/// checkout "new address" sub-form
#[derive(Serialize, Deserialize, Validate, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewAddress {
    pub title: Option<String>,
    #[validate(custom = "validate_not_blank")]
    pub first_name: String,
    #[validate(custom = "validate_not_blank")]
    pub last_name: String,
    #[validate(length(min = "8"))]
    pub phone: String,
    #[validate(length(min = "10"))]
    pub address: String,
    #[validate(length(min = "2"))]
    pub city: String,
    #[validate(length(min = "2"))]
    pub area: String,
    #[serde(default)]
    pub is_default: bool,
}

impl<'a> From<&'a CustomerInfo> for NewAddress {
    fn from(info: &'a CustomerInfo) -> Self {
        Self {
            title: None,
            first_name: info.first_name.clone(),
            last_name: info.last_name.clone(),
            phone: info.phone.clone(),
            address: info.address.clone(),
            city: info.city.clone(),
            area: info.area.clone(),
            is_default: false,
        }
    }
}

/// Row inserted into `user_addresses`
#[derive(Insertable, Clone, Debug, PartialEq)]
#[table_name = "user_addresses"]
pub struct InsertAddress {
    pub user_id: i32,
    pub title: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub area: String,
    pub is_default: bool,
}

impl InsertAddress {
    pub fn new(user_id: i32, payload: NewAddress) -> Self {
        Self {
            user_id,
            title: payload.title,
            first_name: payload.first_name,
            last_name: payload.last_name,
            phone: payload.phone,
            address: payload.address,
            city: payload.city,
            area: payload.area,
            is_default: payload.is_default,
        }
    }
}

#[derive(Serialize, Deserialize, AsChangeset, Validate, Clone, Debug, Default)]
#[table_name = "user_addresses"]
#[serde(rename_all = "camelCase")]
pub struct UpdateAddress {
    pub title: Option<String>,
    #[validate(custom = "validate_not_blank")]
    pub first_name: Option<String>,
    #[validate(custom = "validate_not_blank")]
    pub last_name: Option<String>,
    #[validate(length(min = "8"))]
    pub phone: Option<String>,
    #[validate(length(min = "10"))]
    pub address: Option<String>,
    #[validate(length(min = "2"))]
    pub city: Option<String>,
    #[validate(length(min = "2"))]
    pub area: Option<String>,
    pub is_default: Option<bool>,
    #[serde(skip)]
    pub updated_at: Option<NaiveDateTime>,
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn saved_address(user_id: i32) -> Address {
        let stamp = NaiveDate::from_ymd(2024, 3, 9).and_hms(10, 0, 0);
        Address {
            id: 7,
            user_id,
            title: Some("Home".to_string()),
            first_name: "Sara".to_string(),
            last_name: "Haddad".to_string(),
            phone: "0791234567".to_string(),
            address: "12 Rainbow Street, Jabal Amman".to_string(),
            city: "Amman".to_string(),
            area: "Jabal Amman".to_string(),
            is_default: true,
            created_at: stamp,
            updated_at: stamp,
        }
    }

    #[test]
    fn address_belongs_to_its_user_only() {
        let address = saved_address(3);
        assert!(address.is_owned_by(3));
        assert!(!address.is_owned_by(4));
    }
}
