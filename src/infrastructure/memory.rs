//! In-process repositories backed by `RwLock`-guarded collections.
//!
//! They mirror the observable behaviour of the Diesel repositories (id
//! assignment, totals, ordering, pagination, not-found errors) without a
//! database, which makes them the backing store for the HTTP tests.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::Utc;

use crate::application::pricing::order_total;
use crate::domain::cart::{Cart, CartLine};
use crate::domain::context::Context;
use crate::domain::errors::DomainError;
use crate::domain::order::{Order, OrderLine, OrderStatus};
use crate::domain::pagination::Pagination;
use crate::domain::ports::{CartRepository, OrderRepository, ProductRepository};
use crate::domain::product::{NewProduct, Product};
use crate::domain::requests::{ListOrdersRequest, ListProductsRequest};

use super::new_id;

fn read<T>(lock: &RwLock<T>) -> Result<RwLockReadGuard<'_, T>, DomainError> {
    lock.read()
        .map_err(|_| DomainError::Internal("lock poisoned".to_string()))
}

fn write<T>(lock: &RwLock<T>) -> Result<RwLockWriteGuard<'_, T>, DomainError> {
    lock.write()
        .map_err(|_| DomainError::Internal("lock poisoned".to_string()))
}

fn paginate<T: Clone>(items: &[T], page: &Pagination) -> Vec<T> {
    let skip = usize::try_from(page.skip).unwrap_or(usize::MAX);
    let limit = usize::try_from(page.limit).unwrap_or(usize::MAX);
    items.iter().skip(skip).take(limit).cloned().collect()
}

// ── Products ─────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct InMemoryProductRepository {
    products: RwLock<HashMap<String, Product>>,
}

impl InMemoryProductRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProductRepository for InMemoryProductRepository {
    fn get_product_by_id(&self, ctx: &Context, id: &str) -> Result<Product, DomainError> {
        ctx.check()?;
        read(&self.products)?
            .get(id)
            .cloned()
            .ok_or(DomainError::NotFound("product"))
    }

    fn list_products(
        &self,
        ctx: &Context,
        req: &ListProductsRequest,
    ) -> Result<(Vec<Product>, Pagination), DomainError> {
        ctx.check()?;
        let needle = req.name.as_ref().map(|name| name.to_lowercase());
        let mut matching: Vec<Product> = read(&self.products)?
            .values()
            .filter(|p| match &needle {
                Some(needle) => p.name.to_lowercase().contains(needle.as_str()),
                None => true,
            })
            .cloned()
            .collect();
        matching.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));

        let total = i64::try_from(matching.len()).unwrap_or(i64::MAX);
        let page = Pagination::new(req.page, req.limit, total);
        Ok((paginate(&matching, &page), page))
    }

    fn create_product(&self, ctx: &Context, product: NewProduct) -> Result<Product, DomainError> {
        ctx.check()?;
        let now = Utc::now();
        let created = Product {
            id: new_id(),
            name: product.name,
            description: product.description,
            price: product.price,
            created_at: now,
            updated_at: now,
        };
        write(&self.products)?.insert(created.id.clone(), created.clone());
        Ok(created)
    }

    fn update_product(&self, ctx: &Context, product: &Product) -> Result<(), DomainError> {
        ctx.check()?;
        let mut products = write(&self.products)?;
        let stored = products
            .get_mut(&product.id)
            .ok_or(DomainError::NotFound("product"))?;
        *stored = Product {
            created_at: stored.created_at,
            updated_at: Utc::now(),
            ..product.clone()
        };
        Ok(())
    }

    fn delete_product(&self, ctx: &Context, id: &str) -> Result<(), DomainError> {
        ctx.check()?;
        write(&self.products)?
            .remove(id)
            .map(|_| ())
            .ok_or(DomainError::NotFound("product"))
    }
}

// ── Carts ────────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct CartState {
    /// user id → cart id
    carts: HashMap<String, String>,
    lines: Vec<CartLine>,
}

#[derive(Debug, Default)]
pub struct InMemoryCartRepository {
    state: RwLock<CartState>,
}

impl InMemoryCartRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CartRepository for InMemoryCartRepository {
    /// Returns the user's cart, creating an empty one on first access.
    fn get_cart_by_user_id(&self, ctx: &Context, user_id: &str) -> Result<Cart, DomainError> {
        ctx.check()?;
        let mut state = write(&self.state)?;
        let cart_id = state
            .carts
            .entry(user_id.to_string())
            .or_insert_with(new_id)
            .clone();
        let lines = state
            .lines
            .iter()
            .filter(|line| line.cart_id == cart_id)
            .cloned()
            .collect();
        Ok(Cart {
            id: cart_id,
            user_id: user_id.to_string(),
            lines,
        })
    }

    fn get_cart_line(
        &self,
        ctx: &Context,
        cart_id: &str,
        product_id: &str,
    ) -> Result<CartLine, DomainError> {
        ctx.check()?;
        read(&self.state)?
            .lines
            .iter()
            .find(|line| line.cart_id == cart_id && line.product_id == product_id)
            .cloned()
            .ok_or(DomainError::NotFound("cart line"))
    }

    fn create_cart_line(&self, ctx: &Context, line: &CartLine) -> Result<(), DomainError> {
        ctx.check()?;
        let mut state = write(&self.state)?;
        if !state.carts.values().any(|id| *id == line.cart_id) {
            return Err(DomainError::NotFound("cart"));
        }
        if state
            .lines
            .iter()
            .any(|l| l.cart_id == line.cart_id && l.product_id == line.product_id)
        {
            return Err(DomainError::Validation(
                "product is already in the cart".to_string(),
            ));
        }
        state.lines.push(line.clone());
        Ok(())
    }

    fn update_cart_line(&self, ctx: &Context, line: &CartLine) -> Result<(), DomainError> {
        ctx.check()?;
        let mut state = write(&self.state)?;
        let stored = state
            .lines
            .iter_mut()
            .find(|l| l.cart_id == line.cart_id && l.product_id == line.product_id)
            .ok_or(DomainError::NotFound("cart line"))?;
        *stored = line.clone();
        Ok(())
    }

    fn remove_cart_line(&self, ctx: &Context, line: &CartLine) -> Result<(), DomainError> {
        ctx.check()?;
        let mut state = write(&self.state)?;
        let before = state.lines.len();
        state
            .lines
            .retain(|l| !(l.cart_id == line.cart_id && l.product_id == line.product_id));
        if state.lines.len() == before {
            return Err(DomainError::NotFound("cart line"));
        }
        Ok(())
    }
}

// ── Orders ───────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct InMemoryOrderRepository {
    /// Insertion order, oldest first.
    orders: RwLock<Vec<Order>>,
}

impl InMemoryOrderRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl OrderRepository for InMemoryOrderRepository {
    fn create_order(
        &self,
        ctx: &Context,
        user_id: &str,
        lines: Vec<OrderLine>,
    ) -> Result<Order, DomainError> {
        ctx.check()?;
        let now = Utc::now();
        let order = Order {
            id: new_id(),
            user_id: user_id.to_string(),
            total_price: order_total(&lines),
            lines,
            status: OrderStatus::New,
            created_at: now,
            updated_at: now,
        };
        write(&self.orders)?.push(order.clone());

        // Storage hands back plain lines; products are only attached on preload.
        let mut created = order;
        for line in &mut created.lines {
            line.product = None;
        }
        Ok(created)
    }

    fn get_order_by_id(
        &self,
        ctx: &Context,
        id: &str,
        preload: bool,
    ) -> Result<Order, DomainError> {
        ctx.check()?;
        let mut order = read(&self.orders)?
            .iter()
            .find(|order| order.id == id)
            .cloned()
            .ok_or(DomainError::NotFound("order"))?;
        if !preload {
            order.lines.clear();
        }
        Ok(order)
    }

    fn get_my_orders(
        &self,
        ctx: &Context,
        req: &ListOrdersRequest,
    ) -> Result<(Vec<Order>, Pagination), DomainError> {
        ctx.check()?;
        let matching: Vec<Order> = read(&self.orders)?
            .iter()
            .rev()
            .filter(|order| order.user_id == req.user_id)
            .filter(|order| req.status.map_or(true, |status| order.status == status))
            .map(|order| Order {
                lines: vec![],
                ..order.clone()
            })
            .collect();

        let total = i64::try_from(matching.len()).unwrap_or(i64::MAX);
        let page = Pagination::new(req.page, req.limit, total);
        Ok((paginate(&matching, &page), page))
    }

    fn update_order(&self, ctx: &Context, order: &Order) -> Result<(), DomainError> {
        ctx.check()?;
        let mut orders = write(&self.orders)?;
        let stored = orders
            .iter_mut()
            .find(|stored| stored.id == order.id)
            .ok_or(DomainError::NotFound("order"))?;
        stored.status = order.status;
        stored.updated_at = order.updated_at;
        Ok(())
    }
}
