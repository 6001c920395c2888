//! Orders Services, builds orders from the checkout payload and manages
//! their lifecycle

use std::collections::HashMap;

use chrono::Utc;
use diesel::connection::AnsiTransactionManager;
use diesel::pg::Pg;
use diesel::Connection;
use failure::Error as FailureError;
use r2d2::ManageConnection;
use validator::{validate_email, Validate};

use errors::Error;
use models::*;
use repos::{OrderItemsRepo, ReposFactory};
use services::types::ServiceFuture;
use services::{require_customer, validate, Service};

pub trait OrdersService {
    /// Places an order from the checkout payload
    fn create_order(&self, payload: CreateOrderRequest) -> ServiceFuture<PlacedOrder>;
    /// Orders of the logged in website user, newest first
    fn list_my_orders(&self) -> ServiceFuture<Vec<OrderWithItems>>;
    /// Returns one page of orders, newest first
    fn list_orders(&self, search: OrdersSearch, page: PageParams) -> ServiceFuture<Page<OrderWithItems>>;
    /// Returns order by ID
    fn get_order(&self, order_id: i32) -> ServiceFuture<OrderWithItems>;
    /// Updates order status, payment status or notes
    fn update_order(&self, order_id: i32, payload: UpdateOrder) -> ServiceFuture<Order>;
    /// Deletes order with its items
    fn delete_order(&self, order_id: i32) -> ServiceFuture<Order>;
}

/// Where the order is delivered and who is contacted about it
#[derive(Clone, Debug, PartialEq)]
struct DeliveryTarget {
    name: String,
    phone: String,
    email: String,
    address: String,
    city: String,
    area: String,
}

impl DeliveryTarget {
    fn from_address(address: &Address, email: String) -> Self {
        Self {
            name: format!("{} {}", address.first_name, address.last_name),
            phone: address.phone.clone(),
            email,
            address: address.address.clone(),
            city: address.city.clone(),
            area: address.area.clone(),
        }
    }

    fn from_info(info: &CustomerInfo) -> Self {
        Self {
            name: format!("{} {}", info.first_name.trim(), info.last_name.trim()),
            phone: info.phone.clone(),
            email: info.email.to_lowercase(),
            address: info.address.clone(),
            city: info.city.clone(),
            area: info.area.clone(),
        }
    }
}

fn invalid_items(message: String) -> FailureError {
    format_err!("{}", message)
        .context(Error::Validate(validation_errors!({"items": ["product" => message]})))
        .into()
}

/// Sums quantities of repeated products keeping the first-seen order.
/// A merged line above `MAX_ITEM_QUANTITY` is a validation error.
pub fn merge_order_items(items: &[OrderItemRequest]) -> Result<Vec<OrderItemRequest>, FailureError> {
    let mut merged: Vec<OrderItemRequest> = Vec::with_capacity(items.len());
    for item in items {
        match merged.iter_mut().find(|line| line.product_id == item.product_id) {
            Some(line) => {
                line.quantity = line
                    .quantity
                    .checked_add(item.quantity)
                    .filter(|quantity| *quantity <= MAX_ITEM_QUANTITY)
                    .ok_or_else(|| invalid_items(format!("Quantity of product {} must be at most {}", item.product_id, MAX_ITEM_QUANTITY)))?;
            }
            None => merged.push(item.clone()),
        }
    }
    Ok(merged)
}

/// Snapshots product names and prices into order lines.
/// Fails with a validation error when a product is missing, not orderable
/// or sits in an inactive category.
pub fn build_order_lines(
    items: &[OrderItemRequest],
    products: &[Product],
    categories: &[Category],
) -> Result<Vec<NewOrderItem>, FailureError> {
    items
        .iter()
        .map(|item| {
            let product = products
                .iter()
                .find(|product| product.id == item.product_id && product.is_orderable())
                .filter(|product| categories.iter().any(|category| category.id == product.category_id && category.is_active))
                .ok_or_else(|| invalid_items(format!("Product {} is not available", item.product_id)))?;
            let subtotal = product
                .price
                .checked_times(item.quantity)
                .ok_or_else(|| invalid_items(format!("Amount of product {} is out of range", item.product_id)))?;
            Ok(NewOrderItem {
                order_id: 0,
                product_id: product.id,
                product_name: product.name_en.clone(),
                product_name_ar: product.name_ar.clone(),
                product_price: product.price,
                quantity: item.quantity,
                subtotal,
            })
        }).collect()
}

/// Sum of line subtotals, a validation error on `totalAmount` when it overflows
pub fn order_total(lines: &[NewOrderItem]) -> Result<Money, FailureError> {
    lines
        .iter()
        .try_fold(Money::zero(), |total, line| total.checked_add(line.subtotal))
        .ok_or_else(|| {
            format_err!("Order total is out of range")
                .context(Error::Validate(validation_errors!({"totalAmount": ["total" => "Total amount is out of range"]})))
                .into()
        })
}

/// Checkout email of a customer: the typed one when present, else the account email
fn contact_email(typed: &str, account_email: &str) -> Result<String, FailureError> {
    let typed = typed.trim();
    if typed.is_empty() {
        return Ok(account_email.to_string());
    }
    if !validate_email(typed) {
        return Err(format_err!("Email {} is invalid", typed)
            .context(Error::Validate(validation_errors!({"email": ["email" => "Email is invalid"]})))
            .into());
    }
    Ok(typed.to_lowercase())
}

fn attach_items(orders: Vec<Order>, items: Vec<OrderItem>) -> Vec<OrderWithItems> {
    let mut by_order: HashMap<i32, Vec<OrderItem>> = HashMap::new();
    for item in items {
        by_order.entry(item.order_id).or_insert_with(Vec::new).push(item);
    }
    orders
        .into_iter()
        .map(|order| {
            let items = by_order.remove(&order.id).unwrap_or_default();
            OrderWithItems { order, items }
        }).collect()
}

fn with_items(order_items_repo: &OrderItemsRepo, orders: Vec<Order>) -> Result<Vec<OrderWithItems>, FailureError> {
    let ids = orders.iter().map(|order| order.id).collect::<Vec<_>>();
    let items = if ids.is_empty() { vec![] } else { order_items_repo.list_for_orders(ids)? };
    Ok(attach_items(orders, items))
}

fn order_not_found(order_id: i32) -> FailureError {
    format_err!("Order {} not found", order_id).context(Error::NotFound).into()
}

impl<
        T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static,
        M: ManageConnection<Connection = T>,
        F: ReposFactory<T>,
    > OrdersService for Service<T, M, F>
{
    fn create_order(&self, payload: CreateOrderRequest) -> ServiceFuture<PlacedOrder> {
        let session = self.dynamic_context.session;
        let repo_factory = self.static_context.repo_factory.clone();

        self.spawn_on_pool(move |conn| {
            let categories_repo = repo_factory.create_categories_repo(&*conn, session);
            let products_repo = repo_factory.create_products_repo(&*conn, session);
            let orders_repo = repo_factory.create_orders_repo(&*conn, session);
            let order_items_repo = repo_factory.create_order_items_repo(&*conn, session);
            let addresses_repo = repo_factory.create_addresses_repo(&*conn, session);
            let website_users_repo = repo_factory.create_website_users_repo(&*conn, session);

            conn.transaction::<PlacedOrder, FailureError, _>(move || {
                payload
                    .validate_shape()
                    .map_err(|e| format_err!("Order payload is malformed").context(Error::Validate(e)))?;

                let items = merge_order_items(&payload.items)?;
                let products = products_repo.find_many(items.iter().map(|item| item.product_id).collect())?;
                let mut category_ids = products.iter().map(|product| product.category_id).collect::<Vec<_>>();
                category_ids.sort();
                category_ids.dedup();
                let mut categories = Vec::with_capacity(category_ids.len());
                for category_id in category_ids {
                    categories.extend(categories_repo.find(category_id)?);
                }
                let lines = build_order_lines(&items, &products, &categories)?;

                let total = order_total(&lines)?;
                if total != payload.total_amount {
                    return Err(format_err!("Order total {} does not match items total {}", payload.total_amount, total)
                        .context(Error::Validate(validation_errors!({
                            "totalAmount": ["total" => format!("Total amount must be {}", total)]
                        }))).into());
                }

                let target = match session {
                    SessionContext::Customer { id: user_id } => {
                        let user = website_users_repo
                            .find(user_id)?
                            .ok_or_else(|| format_err!("Website user {} not found", user_id).context(Error::Unauthorized))?;
                        match payload.selected_address_id {
                            Some(address_id) => {
                                let address = addresses_repo
                                    .find_for_user(user_id, address_id)?
                                    .ok_or_else(|| format_err!("Address {} not found", address_id).context(Error::NotFound))?;
                                DeliveryTarget::from_address(&address, user.email.clone())
                            }
                            None => {
                                let info = payload.customer_info();
                                let new_address = NewAddress::from(&info);
                                validate(&new_address)?;
                                let email = contact_email(&info.email, &user.email)?;
                                if payload.save_address {
                                    let has_addresses = !addresses_repo.list_for_user(user_id)?.is_empty();
                                    let saved = addresses_repo.create(InsertAddress::new(
                                        user_id,
                                        NewAddress {
                                            is_default: !has_addresses,
                                            ..new_address
                                        },
                                    ))?;
                                    debug!("Checkout saved address {} for website user {}", saved.id, user_id);
                                }
                                DeliveryTarget { email, ..DeliveryTarget::from_info(&info) }
                            }
                        }
                    }
                    _ => {
                        if payload.selected_address_id.is_some() {
                            return Err(format_err!("Saved addresses require a website user session")
                                .context(Error::Unauthorized)
                                .into());
                        }
                        let info = payload.customer_info();
                        info.validate()
                            .map_err(|e| format_err!("Customer info is invalid").context(Error::Validate(e)))?;
                        DeliveryTarget::from_info(&info)
                    }
                };

                let now = Utc::now().naive_utc();
                let order_number = format_order_number(now, orders_repo.next_order_seq()?);
                let order = orders_repo.create(NewOrder {
                    order_number,
                    website_user_id: session.customer_id(),
                    customer_name: target.name,
                    customer_phone: target.phone,
                    customer_email: target.email,
                    delivery_address: target.address,
                    delivery_city: target.city,
                    delivery_area: target.area,
                    total_amount: total,
                    status: OrderStatus::Pending,
                    payment_method: payload.payment_method,
                    payment_status: PaymentStatus::Pending,
                    notes: payload.notes.clone(),
                })?;

                let order_id = order.id;
                let lines = lines.into_iter().map(|line| NewOrderItem { order_id, ..line }).collect();
                order_items_repo.create_many(lines)?;

                info!("Order {} placed with total {}", order.order_number, order.total_amount);
                Ok(PlacedOrder {
                    order_number: order.order_number,
                    order_id,
                })
            }).map_err(|e: FailureError| e.context("Service orders, create endpoint error occurred.").into())
        })
    }

    fn list_my_orders(&self) -> ServiceFuture<Vec<OrderWithItems>> {
        let session = self.dynamic_context.session;
        let repo_factory = self.static_context.repo_factory.clone();

        self.spawn_on_pool(move |conn| {
            let orders_repo = repo_factory.create_orders_repo(&*conn, session);
            let order_items_repo = repo_factory.create_order_items_repo(&*conn, session);
            require_customer(session)
                .and_then(|user_id| orders_repo.list_for_user(user_id))
                .and_then(|orders| with_items(&*order_items_repo, orders))
                .map_err(|e: FailureError| e.context("Service orders, list_my_orders endpoint error occurred.").into())
        })
    }

    fn list_orders(&self, search: OrdersSearch, page: PageParams) -> ServiceFuture<Page<OrderWithItems>> {
        let session = self.dynamic_context.session;
        let repo_factory = self.static_context.repo_factory.clone();

        self.spawn_on_pool(move |conn| {
            let orders_repo = repo_factory.create_orders_repo(&*conn, session);
            let order_items_repo = repo_factory.create_order_items_repo(&*conn, session);
            orders_repo
                .list(search, page)
                .and_then(|(orders, total)| {
                    let orders = with_items(&*order_items_repo, orders)?;
                    Ok(Page::new(orders, page, total))
                }).map_err(|e: FailureError| e.context("Service orders, list endpoint error occurred.").into())
        })
    }

    fn get_order(&self, order_id: i32) -> ServiceFuture<OrderWithItems> {
        let session = self.dynamic_context.session;
        let repo_factory = self.static_context.repo_factory.clone();

        self.spawn_on_pool(move |conn| {
            let orders_repo = repo_factory.create_orders_repo(&*conn, session);
            let order_items_repo = repo_factory.create_order_items_repo(&*conn, session);
            orders_repo
                .find(order_id)
                .and_then(|order| order.ok_or_else(|| order_not_found(order_id)))
                .and_then(|order| {
                    let items = order_items_repo.list_for_orders(vec![order.id])?;
                    Ok(OrderWithItems { order, items })
                }).map_err(|e: FailureError| e.context("Service orders, get endpoint error occurred.").into())
        })
    }

    fn update_order(&self, order_id: i32, payload: UpdateOrder) -> ServiceFuture<Order> {
        let session = self.dynamic_context.session;
        let repo_factory = self.static_context.repo_factory.clone();

        self.spawn_on_pool(move |conn| {
            let orders_repo = repo_factory.create_orders_repo(&*conn, session);
            orders_repo
                .find(order_id)
                .and_then(|order| order.ok_or_else(|| order_not_found(order_id)))
                .and_then(|_| orders_repo.update(order_id, payload))
                .map(|order| {
                    info!("Order {} is now {} / {}", order.order_number, order.status, order.payment_status);
                    order
                }).map_err(|e: FailureError| e.context("Service orders, update endpoint error occurred.").into())
        })
    }

    fn delete_order(&self, order_id: i32) -> ServiceFuture<Order> {
        let session = self.dynamic_context.session;
        let repo_factory = self.static_context.repo_factory.clone();

        self.spawn_on_pool(move |conn| {
            let orders_repo = repo_factory.create_orders_repo(&*conn, session);
            let order_items_repo = repo_factory.create_order_items_repo(&*conn, session);
            conn.transaction::<Order, FailureError, _>(move || {
                orders_repo.find(order_id)?.ok_or_else(|| order_not_found(order_id))?;
                order_items_repo.delete_by_order(order_id)?;
                orders_repo.delete(order_id)
            }).map_err(|e: FailureError| e.context("Service orders, delete endpoint error occurred.").into())
        })
    }
}
