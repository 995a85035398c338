use std::str::FromStr;
use std::sync::atomic::{AtomicUsize, Ordering};

use bigdecimal::BigDecimal;
use chrono::{DateTime, TimeZone, Utc};

use crate::domain::errors::DomainError;
use crate::domain::order::{Order, OrderStatus};
use crate::domain::ports::Validator;
use crate::domain::product::Product;
use crate::domain::requests::Validate;

/// Validator double that accepts everything or rejects with a fixed message.
#[derive(Debug, Default)]
pub(crate) struct StubValidator {
    rejection: Option<String>,
    calls: AtomicUsize,
}

impl StubValidator {
    pub(crate) fn accepting() -> Self {
        Self::default()
    }

    pub(crate) fn rejecting(message: &str) -> Self {
        Self {
            rejection: Some(message.to_string()),
            calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Validator for StubValidator {
    fn validate_struct(&self, _request: &dyn Validate) -> Result<(), DomainError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.rejection {
            Some(message) => Err(DomainError::Validation(message.clone())),
            None => Ok(()),
        }
    }
}

pub(crate) fn dec(s: &str) -> BigDecimal {
    BigDecimal::from_str(s).expect("valid decimal")
}

/// Fixed so fixtures built separately compare equal.
pub(crate) fn catalog_time() -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000, 0)
        .single()
        .expect("valid timestamp")
}

pub(crate) fn product(id: &str, price: &str) -> Product {
    Product {
        id: id.to_string(),
        name: format!("product {id}"),
        description: String::new(),
        price: dec(price),
        created_at: catalog_time(),
        updated_at: catalog_time(),
    }
}

pub(crate) fn order(id: &str, user_id: &str, status: OrderStatus) -> Order {
    let now = catalog_time();
    Order {
        id: id.to_string(),
        user_id: user_id.to_string(),
        lines: vec![],
        total_price: dec("0"),
        status,
        created_at: now,
        updated_at: now,
    }
}
