use std::fmt;
use std::str::FromStr;

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};

use super::errors::DomainError;
use super::product::Product;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrderStatus {
    New,
    InProgress,
    Done,
    Canceled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::New => "new",
            OrderStatus::InProgress => "in_progress",
            OrderStatus::Done => "done",
            OrderStatus::Canceled => "canceled",
        }
    }

    /// Done and Canceled accept no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Done | OrderStatus::Canceled)
    }
}

impl FromStr for OrderStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "new" => Ok(OrderStatus::New),
            "in_progress" => Ok(OrderStatus::InProgress),
            "done" => Ok(OrderStatus::Done),
            "canceled" => Ok(OrderStatus::Canceled),
            _ => Err(DomainError::InvalidStatus),
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderLine {
    pub product_id: String,
    pub quantity: i32,
    pub price: BigDecimal,
    /// Product as resolved when the order was placed, or as loaded on preload.
    pub product: Option<Product>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub id: String,
    pub user_id: String,
    pub lines: Vec<OrderLine>,
    pub total_price: BigDecimal,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
