pub mod cart;
pub mod context;
pub mod errors;
pub mod order;
pub mod pagination;
pub mod ports;
pub mod product;
pub mod requests;
