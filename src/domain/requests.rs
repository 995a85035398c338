//! Use-case inputs and their validation rules.

use std::fmt;

use super::errors::DomainError;
use super::order::OrderStatus;
use super::pagination::DEFAULT_PAGE_SIZE;

/// Declared rules for a request, run by a [`Validator`](super::ports::Validator).
pub trait Validate: fmt::Debug {
    fn validate(&self) -> Result<(), DomainError>;
}

fn require(field: &str, value: &str) -> Result<(), DomainError> {
    if value.trim().is_empty() {
        return Err(DomainError::Validation(format!("{field} is required")));
    }
    Ok(())
}

/// Upper bound on the quantity of a single cart or order line.
pub const MAX_QUANTITY: i32 = 10_000;

fn require_quantity(field: &str, value: i32) -> Result<(), DomainError> {
    if value < 1 {
        return Err(DomainError::Validation(format!(
            "{field} must be at least 1"
        )));
    }
    if value > MAX_QUANTITY {
        return Err(DomainError::Validation(format!(
            "{field} must be at most {MAX_QUANTITY}"
        )));
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq)]
pub struct ListProductsRequest {
    /// Case-insensitive substring match on the product name.
    pub name: Option<String>,
    pub page: i64,
    pub limit: i64,
}

impl Default for ListProductsRequest {
    fn default() -> Self {
        Self {
            name: None,
            page: 1,
            limit: DEFAULT_PAGE_SIZE,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AddProductRequest {
    pub cart_id: String,
    pub product_id: String,
    pub quantity: i32,
}

impl Validate for AddProductRequest {
    fn validate(&self) -> Result<(), DomainError> {
        require("cart_id", &self.cart_id)?;
        require("product_id", &self.product_id)?;
        require_quantity("quantity", self.quantity)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UpdateCartLineRequest {
    pub cart_id: String,
    pub product_id: String,
    pub quantity: i32,
}

impl Validate for UpdateCartLineRequest {
    fn validate(&self) -> Result<(), DomainError> {
        require("cart_id", &self.cart_id)?;
        require("product_id", &self.product_id)?;
        require_quantity("quantity", self.quantity)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RemoveProductRequest {
    pub cart_id: String,
    pub product_id: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlaceOrderLineRequest {
    pub product_id: String,
    pub quantity: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlaceOrderRequest {
    pub user_id: String,
    pub lines: Vec<PlaceOrderLineRequest>,
}

impl Validate for PlaceOrderRequest {
    fn validate(&self) -> Result<(), DomainError> {
        require("user_id", &self.user_id)?;
        if self.lines.is_empty() {
            return Err(DomainError::Validation(
                "lines must contain at least one line".to_string(),
            ));
        }
        for (i, line) in self.lines.iter().enumerate() {
            require(&format!("lines[{i}].product_id"), &line.product_id)?;
            require_quantity(&format!("lines[{i}].quantity"), line.quantity)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ListOrdersRequest {
    pub user_id: String,
    pub status: Option<OrderStatus>,
    pub page: i64,
    pub limit: i64,
}

impl ListOrdersRequest {
    pub fn for_user(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            status: None,
            page: 1,
            limit: DEFAULT_PAGE_SIZE,
        }
    }
}
