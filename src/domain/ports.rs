use std::sync::Arc;

use super::cart::{Cart, CartLine};
use super::context::Context;
use super::errors::DomainError;
use super::order::{Order, OrderLine};
use super::pagination::Pagination;
use super::product::{NewProduct, Product};
use super::requests::{ListOrdersRequest, ListProductsRequest, Validate};

pub trait Validator: Send + Sync + 'static {
    fn validate_struct(&self, request: &dyn Validate) -> Result<(), DomainError>;
}

#[cfg_attr(test, mockall::automock)]
pub trait ProductRepository: Send + Sync + 'static {
    fn get_product_by_id(&self, ctx: &Context, id: &str) -> Result<Product, DomainError>;
    fn list_products(
        &self,
        ctx: &Context,
        req: &ListProductsRequest,
    ) -> Result<(Vec<Product>, Pagination), DomainError>;
    fn create_product(&self, ctx: &Context, product: NewProduct) -> Result<Product, DomainError>;
    fn update_product(&self, ctx: &Context, product: &Product) -> Result<(), DomainError>;
    fn delete_product(&self, ctx: &Context, id: &str) -> Result<(), DomainError>;
}

#[cfg_attr(test, mockall::automock)]
pub trait CartRepository: Send + Sync + 'static {
    fn get_cart_by_user_id(&self, ctx: &Context, user_id: &str) -> Result<Cart, DomainError>;
    fn get_cart_line(
        &self,
        ctx: &Context,
        cart_id: &str,
        product_id: &str,
    ) -> Result<CartLine, DomainError>;
    fn create_cart_line(&self, ctx: &Context, line: &CartLine) -> Result<(), DomainError>;
    fn update_cart_line(&self, ctx: &Context, line: &CartLine) -> Result<(), DomainError>;
    fn remove_cart_line(&self, ctx: &Context, line: &CartLine) -> Result<(), DomainError>;
}

#[cfg_attr(test, mockall::automock)]
pub trait OrderRepository: Send + Sync + 'static {
    /// Persists a new order in status `New`. The repository assigns the id
    /// and computes the total from the line prices.
    fn create_order(
        &self,
        ctx: &Context,
        user_id: &str,
        lines: Vec<OrderLine>,
    ) -> Result<Order, DomainError>;
    /// With `preload` the order's lines (and their products) are loaded too.
    fn get_order_by_id(&self, ctx: &Context, id: &str, preload: bool)
        -> Result<Order, DomainError>;
    fn get_my_orders(
        &self,
        ctx: &Context,
        req: &ListOrdersRequest,
    ) -> Result<(Vec<Order>, Pagination), DomainError>;
    fn update_order(&self, ctx: &Context, order: &Order) -> Result<(), DomainError>;
}

// ── Shared trait objects ─────────────────────────────────────────────────────

impl<T: Validator + ?Sized> Validator for Arc<T> {
    fn validate_struct(&self, request: &dyn Validate) -> Result<(), DomainError> {
        (**self).validate_struct(request)
    }
}

impl<T: ProductRepository + ?Sized> ProductRepository for Arc<T> {
    fn get_product_by_id(&self, ctx: &Context, id: &str) -> Result<Product, DomainError> {
        (**self).get_product_by_id(ctx, id)
    }

    fn list_products(
        &self,
        ctx: &Context,
        req: &ListProductsRequest,
    ) -> Result<(Vec<Product>, Pagination), DomainError> {
        (**self).list_products(ctx, req)
    }

    fn create_product(&self, ctx: &Context, product: NewProduct) -> Result<Product, DomainError> {
        (**self).create_product(ctx, product)
    }

    fn update_product(&self, ctx: &Context, product: &Product) -> Result<(), DomainError> {
        (**self).update_product(ctx, product)
    }

    fn delete_product(&self, ctx: &Context, id: &str) -> Result<(), DomainError> {
        (**self).delete_product(ctx, id)
    }
}

impl<T: CartRepository + ?Sized> CartRepository for Arc<T> {
    fn get_cart_by_user_id(&self, ctx: &Context, user_id: &str) -> Result<Cart, DomainError> {
        (**self).get_cart_by_user_id(ctx, user_id)
    }

    fn get_cart_line(
        &self,
        ctx: &Context,
        cart_id: &str,
        product_id: &str,
    ) -> Result<CartLine, DomainError> {
        (**self).get_cart_line(ctx, cart_id, product_id)
    }

    fn create_cart_line(&self, ctx: &Context, line: &CartLine) -> Result<(), DomainError> {
        (**self).create_cart_line(ctx, line)
    }

    fn update_cart_line(&self, ctx: &Context, line: &CartLine) -> Result<(), DomainError> {
        (**self).update_cart_line(ctx, line)
    }

    fn remove_cart_line(&self, ctx: &Context, line: &CartLine) -> Result<(), DomainError> {
        (**self).remove_cart_line(ctx, line)
    }
}

impl<T: OrderRepository + ?Sized> OrderRepository for Arc<T> {
    fn create_order(
        &self,
        ctx: &Context,
        user_id: &str,
        lines: Vec<OrderLine>,
    ) -> Result<Order, DomainError> {
        (**self).create_order(ctx, user_id, lines)
    }

    fn get_order_by_id(
        &self,
        ctx: &Context,
        id: &str,
        preload: bool,
    ) -> Result<Order, DomainError> {
        (**self).get_order_by_id(ctx, id, preload)
    }

    fn get_my_orders(
        &self,
        ctx: &Context,
        req: &ListOrdersRequest,
    ) -> Result<(Vec<Order>, Pagination), DomainError> {
        (**self).get_my_orders(ctx, req)
    }

    fn update_order(&self, ctx: &Context, order: &Order) -> Result<(), DomainError> {
        (**self).update_order(ctx, order)
    }
}
