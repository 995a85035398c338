use bigdecimal::BigDecimal;

/// One product in a cart. `price` is always unit price times quantity.
#[derive(Debug, Clone, PartialEq)]
pub struct CartLine {
    pub cart_id: String,
    pub product_id: String,
    pub quantity: i32,
    pub price: BigDecimal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Cart {
    pub id: String,
    pub user_id: String,
    pub lines: Vec<CartLine>,
}
