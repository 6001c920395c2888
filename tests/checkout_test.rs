#[macro_use]
extern crate failure;
extern crate storefront_lib;

use std::str::FromStr;

use failure::Error as FailureError;

use storefront_lib::checkout::*;
use storefront_lib::models::*;

fn cart() -> Cart {
    let mut cart = Cart::new();
    cart.add(CartLine {
        product_id: 10,
        name_en: "Full body PPF".to_string(),
        name_ar: "حماية كاملة".to_string(),
        unit_price: Money::from_str("10.000").unwrap(),
        quantity: 2,
    });
    cart.add(CartLine {
        product_id: 11,
        name_en: "Ceramic coating".to_string(),
        name_ar: "طلاء سيراميك".to_string(),
        unit_price: Money::from_str("5.500").unwrap(),
        quantity: 1,
    });
    cart
}

fn valid_guest() -> CustomerInfo {
    CustomerInfo {
        first_name: "Ali".to_string(),
        last_name: "Hassan".to_string(),
        email: "a@b.com".to_string(),
        phone: "12345678".to_string(),
        address: "1234567890".to_string(),
        city: "Kuwait".to_string(),
        area: "Salmiya".to_string(),
    }
}

#[test]
fn guest_needs_every_contact_field() {
    let mut wizard = CheckoutWizard::new(cart());
    wizard.proceed_to_customer_info().unwrap();

    wizard.set_customer_info(CustomerInfo {
        first_name: "A".to_string(),
        email: "bad".to_string(),
        ..CustomerInfo::default()
    });
    assert!(!wizard.can_proceed_to_payment());

    wizard.set_customer_info(CustomerInfo {
        area: "S".to_string(),
        ..valid_guest()
    });
    assert!(!wizard.can_proceed_to_payment());

    wizard.set_customer_info(valid_guest());
    assert!(wizard.can_proceed_to_payment());
}

#[test]
fn selected_address_is_enough_for_customer() {
    let mut wizard = CheckoutWizard::for_customer(cart(), None);
    assert!(!wizard.can_proceed_to_payment());
    wizard.select_address(Some(5));
    assert!(wizard.can_proceed_to_payment());
}

#[test]
fn cart_total_matches_request() {
    let wizard = CheckoutWizard::new(cart());
    let request = wizard.order_request();
    assert_eq!(request.total_amount.to_string(), "25.500");
    assert_eq!(request.items.len(), 2);
    assert_eq!(request.payment_method, PaymentMethod::CashOnDelivery);
}

#[test]
fn full_guest_flow() {
    let mut wizard = CheckoutWizard::new(cart());
    assert_eq!(wizard.step().number(), Some(1));
    wizard.proceed_to_customer_info().unwrap();
    wizard.set_customer_info(valid_guest());
    wizard.proceed_to_payment().unwrap();
    assert_eq!(wizard.step().number(), Some(3));

    let mut submitter = |request: CreateOrderRequest| -> Result<PlacedOrder, FailureError> {
        assert_eq!(request.city, "Kuwait");
        Ok(PlacedOrder {
            order_number: "ORD-20240309-000042".to_string(),
            order_id: 42,
        })
    };
    let placed = wizard.place_order(&mut submitter).unwrap();

    assert_eq!(placed.order_id, 42);
    assert_eq!(wizard.step(), CheckoutStep::Confirmed);
    assert!(wizard.cart().is_empty());
}

#[test]
fn failure_keeps_wizard_on_payment() {
    let mut wizard = CheckoutWizard::new(cart());
    wizard.proceed_to_customer_info().unwrap();
    wizard.set_customer_info(valid_guest());
    wizard.proceed_to_payment().unwrap();

    let mut submitter = |_: CreateOrderRequest| -> Result<PlacedOrder, FailureError> { Err(format_err!("Total mismatch")) };
    assert!(wizard.place_order(&mut submitter).is_err());
    assert_eq!(wizard.step(), CheckoutStep::Payment);
    assert_eq!(wizard.last_error(), Some("Total mismatch"));
    assert!(!wizard.cart().is_empty());
}
