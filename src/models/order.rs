//! Orders, their statuses and the checkout payload
use chrono::NaiveDateTime;
use diesel::sql_types::VarChar;
use validator::{Validate, ValidationErrors};

use models::validation_rules::*;
use models::{Money, OrderItem};
use schema::orders;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, AsExpression, FromSqlRow)]
#[sql_type = "VarChar"]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Preparing,
    Ready,
    Delivered,
    Cancelled,
}

impl_varchar_sql!(OrderStatus {
    Pending => "pending",
    Confirmed => "confirmed",
    Preparing => "preparing",
    Ready => "ready",
    Delivered => "delivered",
    Cancelled => "cancelled",
});

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, AsExpression, FromSqlRow)]
#[sql_type = "VarChar"]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Failed,
}

impl_varchar_sql!(PaymentStatus {
    Pending => "pending",
    Paid => "paid",
    Failed => "failed",
});

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, AsExpression, FromSqlRow)]
#[sql_type = "VarChar"]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    CashOnDelivery,
}

impl_varchar_sql!(PaymentMethod {
    CashOnDelivery => "cash_on_delivery",
});

#[derive(Debug, Serialize, Deserialize, Queryable, Clone, Identifiable, PartialEq)]
#[table_name = "orders"]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: i32,
    pub order_number: String,
    pub website_user_id: Option<i32>,
    pub customer_name: String,
    pub customer_phone: String,
    pub customer_email: String,
    pub delivery_address: String,
    pub delivery_city: String,
    pub delivery_area: String,
    pub total_amount: Money,
    pub status: OrderStatus,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub notes: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Row inserted into `orders`
#[derive(Insertable, Clone, Debug, PartialEq)]
#[table_name = "orders"]
pub struct NewOrder {
    pub order_number: String,
    pub website_user_id: Option<i32>,
    pub customer_name: String,
    pub customer_phone: String,
    pub customer_email: String,
    pub delivery_address: String,
    pub delivery_city: String,
    pub delivery_area: String,
    pub total_amount: Money,
    pub status: OrderStatus,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub notes: Option<String>,
}

/// Admin update of an order
#[derive(Serialize, Deserialize, AsChangeset, Clone, Debug, Default)]
#[table_name = "orders"]
#[serde(rename_all = "camelCase")]
pub struct UpdateOrder {
    pub status: Option<OrderStatus>,
    pub payment_status: Option<PaymentStatus>,
    pub notes: Option<String>,
    #[serde(skip)]
    pub updated_at: Option<NaiveDateTime>,
}

/// Upper bound of units in one order line
pub const MAX_ITEM_QUANTITY: i32 = 999;

/// A cart line as submitted by the client
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemRequest {
    pub product_id: i32,
    pub quantity: i32,
}

/// Guest checkout contact and delivery fields
#[derive(Serialize, Deserialize, Validate, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CustomerInfo {
    #[validate(custom = "validate_not_blank")]
    pub first_name: String,
    #[validate(custom = "validate_not_blank")]
    pub last_name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = "8"))]
    pub phone: String,
    #[validate(length(min = "10"))]
    pub address: String,
    #[validate(length(min = "2"))]
    pub city: String,
    #[validate(length(min = "2"))]
    pub area: String,
}

/// Order placement payload. Guests fill the contact fields; customers send
/// either `selectedAddressId` or the contact fields (optionally saved as a
/// new address with `saveAddress`).
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub area: String,
    pub items: Vec<OrderItemRequest>,
    pub total_amount: Money,
    pub payment_method: PaymentMethod,
    pub selected_address_id: Option<i32>,
    #[serde(default)]
    pub save_address: bool,
    pub notes: Option<String>,
}

impl CreateOrderRequest {
    pub fn customer_info(&self) -> CustomerInfo {
        CustomerInfo {
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            email: self.email.clone(),
            phone: self.phone.clone(),
            address: self.address.clone(),
            city: self.city.clone(),
            area: self.area.clone(),
        }
    }

    /// Checks the parts of the payload that do not need the database
    pub fn validate_shape(&self) -> Result<(), ValidationErrors> {
        if self.items.is_empty() {
            return Err(validation_errors!({"items": ["items" => "Cart is empty"]}));
        }
        if self.items.iter().any(|item| item.quantity < 1) {
            return Err(validation_errors!({"items": ["quantity" => "Quantity must be at least 1"]}));
        }
        if self.items.iter().any(|item| item.quantity > MAX_ITEM_QUANTITY) {
            return Err(validation_errors!({"items": ["quantity" => format!("Quantity must be at most {}", MAX_ITEM_QUANTITY)]}));
        }
        Ok(())
    }
}

/// Response of a successful order placement
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlacedOrder {
    pub order_number: String,
    pub order_id: i32,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OrderWithItems {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
}

#[derive(Clone, Debug, Default)]
pub struct OrdersSearch {
    pub status: Option<OrderStatus>,
    pub website_user_id: Option<i32>,
}

/// `ORD-<yyyymmdd>-<sequence>`, the sequence is zero padded to at least 6 digits
pub fn format_order_number(date: NaiveDateTime, seq: i64) -> String {
    format!("ORD-{}-{:06}", date.format("%Y%m%d"), seq)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json;

    #[test]
    fn order_number_format() {
        let date = NaiveDate::from_ymd(2024, 3, 9).and_hms(10, 0, 0);
        assert_eq!(format_order_number(date, 42), "ORD-20240309-000042");
    }

    #[test]
    fn order_number_keeps_long_sequences() {
        let date = NaiveDate::from_ymd(2024, 3, 9).and_hms(10, 0, 0);
        assert_eq!(format_order_number(date, 1_234_567), "ORD-20240309-1234567");
        assert_ne!(format_order_number(date, 1_000_042), format_order_number(date, 42));
    }

    #[test]
    fn statuses_use_snake_case() {
        assert_eq!(serde_json::to_string(&PaymentMethod::CashOnDelivery).unwrap(), "\"cash_on_delivery\"");
        assert_eq!("delivered".parse::<OrderStatus>().unwrap(), OrderStatus::Delivered);
        assert!("shipped".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn empty_cart_is_rejected() {
        let request: CreateOrderRequest = serde_json::from_value(json!({
            "items": [],
            "totalAmount": "0",
            "paymentMethod": "cash_on_delivery"
        })).unwrap();
        assert!(request.validate_shape().is_err());
        assert_eq!(request.customer_info(), CustomerInfo::default());
    }

    #[test]
    fn oversized_quantity_is_rejected() {
        let request: CreateOrderRequest = serde_json::from_value(json!({
            "items": [{"productId": 10, "quantity": MAX_ITEM_QUANTITY + 1}],
            "totalAmount": "0",
            "paymentMethod": "cash_on_delivery"
        })).unwrap();
        let errors = serde_json::to_value(request.validate_shape().unwrap_err()).unwrap();
        assert!(errors.get("items").is_some());
    }
}
