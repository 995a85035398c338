use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use diesel::prelude::*;

use crate::domain::cart::{Cart, CartLine};
use crate::domain::errors::DomainError;
use crate::domain::order::{Order, OrderLine, OrderStatus};
use crate::domain::product::Product;
use crate::schema::{cart_lines, carts, order_lines, orders, products};

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = products)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ProductRow {
    pub id: String,
    pub name: String,
    pub description: String,
    pub price: BigDecimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = products)]
pub struct NewProductRow {
    pub id: String,
    pub name: String,
    pub description: String,
    pub price: BigDecimal,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Product {
            id: row.id,
            name: row.name,
            description: row.description,
            price: row.price,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = carts)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CartRow {
    pub id: String,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = carts)]
pub struct NewCartRow {
    pub id: String,
    pub user_id: String,
}

impl CartRow {
    pub fn into_cart(self, lines: Vec<CartLineRow>) -> Cart {
        Cart {
            id: self.id,
            user_id: self.user_id,
            lines: lines.into_iter().map(CartLine::from).collect(),
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = cart_lines)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CartLineRow {
    pub cart_id: String,
    pub product_id: String,
    pub quantity: i32,
    pub price: BigDecimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = cart_lines)]
pub struct NewCartLineRow {
    pub cart_id: String,
    pub product_id: String,
    pub quantity: i32,
    pub price: BigDecimal,
}

impl From<CartLineRow> for CartLine {
    fn from(row: CartLineRow) -> Self {
        CartLine {
            cart_id: row.cart_id,
            product_id: row.product_id,
            quantity: row.quantity,
            price: row.price,
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = orders)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OrderRow {
    pub id: String,
    pub user_id: String,
    pub total_price: BigDecimal,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = orders)]
pub struct NewOrderRow {
    pub id: String,
    pub user_id: String,
    pub total_price: BigDecimal,
    pub status: String,
}

impl OrderRow {
    pub fn into_order(self, lines: Vec<OrderLine>) -> Result<Order, DomainError> {
        let status: OrderStatus = self.status.parse().map_err(|_| {
            DomainError::Internal(format!(
                "order {} has unknown stored status '{}'",
                self.id, self.status
            ))
        })?;
        Ok(Order {
            id: self.id,
            user_id: self.user_id,
            lines,
            total_price: self.total_price,
            status,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Associations)]
#[diesel(table_name = order_lines)]
#[diesel(belongs_to(OrderRow, foreign_key = order_id))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OrderLineRow {
    pub id: String,
    pub order_id: String,
    pub position: i32,
    pub product_id: String,
    pub quantity: i32,
    pub price: BigDecimal,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = order_lines)]
pub struct NewOrderLineRow {
    pub id: String,
    pub order_id: String,
    pub position: i32,
    pub product_id: String,
    pub quantity: i32,
    pub price: BigDecimal,
}

impl OrderLineRow {
    pub fn into_line(self, product: Option<Product>) -> OrderLine {
        OrderLine {
            product_id: self.product_id,
            quantity: self.quantity,
            price: self.price,
            product,
        }
    }
}
