pub mod cart_service;
pub mod order_service;
pub mod pricing;
pub mod product_service;
pub mod validation;

#[cfg(test)]
pub(crate) mod test_support;

pub use cart_service::CartService;
pub use order_service::OrderService;
pub use product_service::ProductService;
pub use validation::RequestValidator;
