//! Shopping cart kept by the checkout wizard
use models::{Money, OrderItemRequest, Product};

/// Product snapshot in the cart
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub product_id: i32,
    pub name_en: String,
    pub name_ar: String,
    pub unit_price: Money,
    pub quantity: i32,
}

impl CartLine {
    pub fn from_product(product: &Product, quantity: i32) -> Self {
        Self {
            product_id: product.id,
            name_en: product.name_en.clone(),
            name_ar: product.name_ar.clone(),
            unit_price: product.price,
            quantity,
        }
    }

    pub fn subtotal(&self) -> Money {
        self.unit_price.times(self.quantity)
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a line. A product already in the cart gets its quantity
    /// increased and its snapshot refreshed.
    pub fn add(&mut self, mut line: CartLine) {
        match self.lines.iter().position(|existing| existing.product_id == line.product_id) {
            Some(index) => {
                line.quantity = line.quantity.saturating_add(self.lines[index].quantity);
                self.lines[index] = line;
            }
            None => self.lines.push(line),
        }
        self.lines.retain(|line| line.quantity > 0);
    }

    pub fn add_product(&mut self, product: &Product, quantity: i32) {
        self.add(CartLine::from_product(product, quantity));
    }

    /// Sets the quantity of a product, zero or less removes the line
    pub fn set_quantity(&mut self, product_id: i32, quantity: i32) {
        if quantity < 1 {
            self.remove(product_id);
        } else if let Some(line) = self.lines.iter_mut().find(|line| line.product_id == product_id) {
            line.quantity = quantity;
        }
    }

    pub fn remove(&mut self, product_id: i32) {
        self.lines.retain(|line| line.product_id != product_id);
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Number of units across all lines
    pub fn item_count(&self) -> i32 {
        self.lines.iter().fold(0i32, |count, line| count.saturating_add(line.quantity))
    }

    pub fn total(&self) -> Money {
        self.lines.iter().map(CartLine::subtotal).sum()
    }

    pub fn order_items(&self) -> Vec<OrderItemRequest> {
        self.lines
            .iter()
            .map(|line| OrderItemRequest {
                product_id: line.product_id,
                quantity: line.quantity,
            }).collect()
    }
}
