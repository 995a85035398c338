use bigdecimal::BigDecimal;

use crate::domain::order::OrderLine;

/// Price of a cart or order line: unit price times quantity.
pub fn line_price(unit_price: &BigDecimal, quantity: i32) -> BigDecimal {
    unit_price * &BigDecimal::from(quantity)
}

pub fn order_total(lines: &[OrderLine]) -> BigDecimal {
    lines
        .iter()
        .fold(BigDecimal::from(0), |total, line| total + &line.price)
}
