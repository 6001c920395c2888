//! Order lines snapshot the product names and price at submission time
use models::Money;
use schema::order_items;

#[derive(Debug, Serialize, Deserialize, Queryable, Clone, Identifiable, PartialEq)]
#[table_name = "order_items"]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub id: i32,
    pub order_id: i32,
    pub product_id: i32,
    pub product_name: String,
    pub product_name_ar: String,
    pub product_price: Money,
    pub quantity: i32,
    pub subtotal: Money,
}

#[derive(Insertable, Clone, Debug, PartialEq)]
#[table_name = "order_items"]
pub struct NewOrderItem {
    pub order_id: i32,
    pub product_id: i32,
    pub product_name: String,
    pub product_name_ar: String,
    pub product_price: Money,
    pub quantity: i32,
    pub subtotal: Money,
}
