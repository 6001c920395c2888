//! Three step checkout: review the cart, fill delivery details, confirm
//! payment. Forward moves are gated on the current step being complete,
//! going back never drops what was entered.
use failure::Error as FailureError;
use validator::Validate;

use checkout::cart::Cart;
use models::{CreateOrderRequest, CustomerInfo, NewAddress, PaymentMethod, PlacedOrder};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutStep {
    Review,
    CustomerInfo,
    Payment,
    Confirmed,
}

impl CheckoutStep {
    /// Position shown in the progress bar, `Confirmed` has none
    pub fn number(&self) -> Option<u8> {
        match *self {
            CheckoutStep::Review => Some(1),
            CheckoutStep::CustomerInfo => Some(2),
            CheckoutStep::Payment => Some(3),
            CheckoutStep::Confirmed => None,
        }
    }
}

#[derive(Debug, Fail, Clone, PartialEq)]
pub enum CheckoutError {
    #[fail(display = "Cart is empty")]
    EmptyCart,
    #[fail(display = "Can not {} on step {:?}", action, step)]
    WrongStep { step: CheckoutStep, action: &'static str },
    #[fail(display = "Delivery details are incomplete")]
    IncompleteDetails,
    #[fail(display = "Order placement failed: {}", _0)]
    Submission(String),
}

/// Anything able to place an order, usually `OrdersService::create_order` or an HTTP client
pub trait OrderSubmitter {
    fn submit(&mut self, request: CreateOrderRequest) -> Result<PlacedOrder, FailureError>;
}

impl<F> OrderSubmitter for F
where
    F: FnMut(CreateOrderRequest) -> Result<PlacedOrder, FailureError>,
{
    fn submit(&mut self, request: CreateOrderRequest) -> Result<PlacedOrder, FailureError> {
        self(request)
    }
}

#[derive(Clone, Debug)]
pub struct CheckoutWizard {
    step: CheckoutStep,
    cart: Cart,
    authenticated: bool,
    customer_info: CustomerInfo,
    selected_address_id: Option<i32>,
    new_address: NewAddress,
    save_address: bool,
    payment_method: PaymentMethod,
    notes: Option<String>,
    last_error: Option<String>,
    placed_order: Option<PlacedOrder>,
}

impl CheckoutWizard {
    /// Wizard for a guest, delivery details come from the contact form
    pub fn new(cart: Cart) -> Self {
        Self {
            step: CheckoutStep::Review,
            cart,
            authenticated: false,
            customer_info: CustomerInfo::default(),
            selected_address_id: None,
            new_address: NewAddress::default(),
            save_address: false,
            payment_method: PaymentMethod::CashOnDelivery,
            notes: None,
            last_error: None,
            placed_order: None,
        }
    }

    /// Wizard for a logged in website user, delivery goes to a saved
    /// address or to a new one
    pub fn for_customer(cart: Cart, default_address_id: Option<i32>) -> Self {
        Self {
            authenticated: true,
            selected_address_id: default_address_id,
            ..Self::new(cart)
        }
    }

    pub fn step(&self) -> CheckoutStep {
        self.step
    }

    pub fn cart(&self) -> &Cart {
        &self.cart
    }

    pub fn cart_mut(&mut self) -> &mut Cart {
        &mut self.cart
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_ref().map(|e| e.as_str())
    }

    pub fn placed_order(&self) -> Option<&PlacedOrder> {
        self.placed_order.as_ref()
    }

    pub fn set_customer_info(&mut self, info: CustomerInfo) {
        self.customer_info = info;
    }

    pub fn customer_info(&self) -> &CustomerInfo {
        &self.customer_info
    }

    /// Picking a saved address, `None` switches to the new address form
    pub fn select_address(&mut self, address_id: Option<i32>) {
        self.selected_address_id = address_id;
    }

    pub fn set_new_address(&mut self, address: NewAddress, save: bool) {
        self.new_address = address;
        self.save_address = save;
    }

    pub fn set_notes(&mut self, notes: Option<String>) {
        self.notes = notes.filter(|notes| !notes.trim().is_empty());
    }

    pub fn set_payment_method(&mut self, payment_method: PaymentMethod) {
        self.payment_method = payment_method;
    }

    pub fn can_proceed_to_customer_info(&self) -> bool {
        !self.cart.is_empty()
    }

    pub fn can_proceed_to_payment(&self) -> bool {
        if self.authenticated {
            self.selected_address_id.is_some() || self.new_address.validate().is_ok()
        } else {
            self.customer_info.validate().is_ok()
        }
    }

    pub fn proceed_to_customer_info(&mut self) -> Result<CheckoutStep, CheckoutError> {
        self.expect_step(CheckoutStep::Review, "open delivery details")?;
        if !self.can_proceed_to_customer_info() {
            return Err(CheckoutError::EmptyCart);
        }
        self.step = CheckoutStep::CustomerInfo;
        Ok(self.step)
    }

    pub fn proceed_to_payment(&mut self) -> Result<CheckoutStep, CheckoutError> {
        self.expect_step(CheckoutStep::CustomerInfo, "open payment")?;
        if !self.can_proceed_to_payment() {
            return Err(CheckoutError::IncompleteDetails);
        }
        self.step = CheckoutStep::Payment;
        Ok(self.step)
    }

    /// One step back, the first step stays where it is
    pub fn back(&mut self) -> Result<CheckoutStep, CheckoutError> {
        self.step = match self.step {
            CheckoutStep::Review => CheckoutStep::Review,
            CheckoutStep::CustomerInfo => CheckoutStep::Review,
            CheckoutStep::Payment => CheckoutStep::CustomerInfo,
            CheckoutStep::Confirmed => {
                return Err(CheckoutError::WrongStep {
                    step: CheckoutStep::Confirmed,
                    action: "go back",
                })
            }
        };
        Ok(self.step)
    }

    /// Payload sent on order placement
    pub fn order_request(&self) -> CreateOrderRequest {
        let mut request = CreateOrderRequest {
            first_name: String::new(),
            last_name: String::new(),
            email: self.customer_info.email.clone(),
            phone: String::new(),
            address: String::new(),
            city: String::new(),
            area: String::new(),
            items: self.cart.order_items(),
            total_amount: self.cart.total(),
            payment_method: self.payment_method,
            selected_address_id: None,
            save_address: false,
            notes: self.notes.clone(),
        };

        if !self.authenticated {
            let info = self.customer_info.clone();
            request.first_name = info.first_name;
            request.last_name = info.last_name;
            request.phone = info.phone;
            request.address = info.address;
            request.city = info.city;
            request.area = info.area;
        } else if self.selected_address_id.is_some() {
            request.selected_address_id = self.selected_address_id;
        } else {
            let address = self.new_address.clone();
            request.first_name = address.first_name;
            request.last_name = address.last_name;
            request.phone = address.phone;
            request.address = address.address;
            request.city = address.city;
            request.area = address.area;
            request.save_address = self.save_address;
        }

        request
    }

    /// Submits the order once. On success the cart is emptied and the wizard
    /// is confirmed, on failure it stays on the payment step with the error kept.
    pub fn place_order<S: OrderSubmitter>(&mut self, submitter: &mut S) -> Result<PlacedOrder, CheckoutError> {
        self.expect_step(CheckoutStep::Payment, "place order")?;
        if self.cart.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }
        if !self.can_proceed_to_payment() {
            return Err(CheckoutError::IncompleteDetails);
        }

        match submitter.submit(self.order_request()) {
            Ok(placed) => {
                info!("Order {} placed", placed.order_number);
                self.cart.clear();
                self.last_error = None;
                self.placed_order = Some(placed.clone());
                self.step = CheckoutStep::Confirmed;
                Ok(placed)
            }
            Err(e) => {
                warn!("Order placement failed: {}", e);
                let message = e.to_string();
                self.last_error = Some(message.clone());
                Err(CheckoutError::Submission(message))
            }
        }
    }

    fn expect_step(&self, step: CheckoutStep, action: &'static str) -> Result<(), CheckoutError> {
        if self.step == step {
            Ok(())
        } else {
            Err(CheckoutError::WrongStep { step: self.step, action })
        }
    }
}
