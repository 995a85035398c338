pub mod carts;
pub mod orders;
pub mod products;

use std::future::{ready, Ready};
use std::sync::Arc;
use std::time::Duration;

use actix_web::{dev::Payload, web, FromRequest, HttpRequest};
use serde::Serialize;
use utoipa::{OpenApi, ToSchema};

use crate::application::{CartService, OrderService, ProductService, RequestValidator};
use crate::db::DbPool;
use crate::domain::context::Context;
use crate::domain::pagination::{Pagination, DEFAULT_PAGE_SIZE};
use crate::domain::ports::{CartRepository, OrderRepository, ProductRepository, Validator};
use crate::errors::AppError;
use crate::infrastructure::{DieselCartRepository, DieselOrderRepository, DieselProductRepository};

pub const USER_ID_HEADER: &str = "X-User-Id";

type SharedValidator = Arc<dyn Validator>;
type SharedProducts = Arc<dyn ProductRepository>;
type SharedCarts = Arc<dyn CartRepository>;
type SharedOrders = Arc<dyn OrderRepository>;

/// Use cases shared by every worker, wired once at start-up.
pub struct AppState {
    pub products: ProductService<SharedProducts>,
    pub carts: CartService<SharedValidator, SharedCarts, SharedProducts>,
    pub orders: OrderService<SharedValidator, SharedOrders, SharedProducts>,
    request_timeout: Duration,
}

impl AppState {
    pub fn new(
        validator: SharedValidator,
        products: SharedProducts,
        carts: SharedCarts,
        orders: SharedOrders,
        request_timeout: Duration,
    ) -> Self {
        Self {
            products: ProductService::new(products.clone()),
            carts: CartService::new(validator.clone(), carts, products.clone()),
            orders: OrderService::new(validator, orders, products),
            request_timeout,
        }
    }

    /// Wires the use cases to the Postgres repositories.
    pub fn with_pool(pool: DbPool, request_timeout: Duration) -> Self {
        Self::new(
            Arc::new(RequestValidator::new()),
            Arc::new(DieselProductRepository::new(pool.clone())),
            Arc::new(DieselCartRepository::new(pool.clone())),
            Arc::new(DieselOrderRepository::new(pool)),
            request_timeout,
        )
    }

    pub fn context(&self) -> Context {
        Context::with_timeout(self.request_timeout)
    }
}

/// The calling user, taken from the `X-User-Id` header.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub String);

impl FromRequest for CurrentUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let user = req
            .headers()
            .get(USER_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(|value| CurrentUser(value.to_string()))
            .ok_or_else(|| AppError::Unauthorized(format!("missing {} header", USER_ID_HEADER)));
        ready(user)
    }
}

// ── Shared DTOs ──────────────────────────────────────────────────────────────

#[derive(Debug, Serialize, ToSchema)]
pub struct PaginationResponse {
    pub current_page: i64,
    pub limit: i64,
    pub skip: i64,
    pub total: i64,
    pub total_pages: i64,
}

impl From<Pagination> for PaginationResponse {
    fn from(p: Pagination) -> Self {
        Self {
            current_page: p.current_page,
            limit: p.limit,
            skip: p.skip,
            total: p.total,
            total_pages: p.total_pages,
        }
    }
}

pub(crate) fn default_page() -> i64 {
    1
}

pub(crate) fn default_limit() -> i64 {
    DEFAULT_PAGE_SIZE
}

/// Clamps query pagination to a 1-based page and at most 100 items.
pub(crate) fn page_bounds(page: i64, limit: i64) -> (i64, i64) {
    (page.max(1), limit.clamp(1, 100))
}

/// Registers every route. Shared by the server and the HTTP tests.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/products")
            .route("", web::get().to(products::list_products))
            .route("/{id}", web::get().to(products::get_product)),
    )
    .route("/cart", web::get().to(carts::get_cart))
    .service(
        web::scope("/carts/{cart_id}/lines")
            .route("", web::post().to(carts::add_product))
            .route("/{product_id}", web::put().to(carts::update_cart_line))
            .route("/{product_id}", web::delete().to(carts::remove_product)),
    )
    .service(
        web::scope("/orders")
            .route("", web::post().to(orders::place_order))
            .route("", web::get().to(orders::list_my_orders))
            .route("/{id}", web::get().to(orders::get_order))
            .route("/{id}", web::put().to(orders::update_order)),
    );
}

#[derive(OpenApi)]
#[openapi(
    paths(
        products::list_products,
        products::get_product,
        carts::get_cart,
        carts::add_product,
        carts::update_cart_line,
        carts::remove_product,
        orders::place_order,
        orders::list_my_orders,
        orders::get_order,
        orders::update_order,
    ),
    components(schemas(
        PaginationResponse,
        products::ProductResponse,
        products::ListProductsResponse,
        carts::CartResponse,
        carts::CartLineResponse,
        carts::AddCartLineBody,
        carts::UpdateCartLineBody,
        orders::PlaceOrderBody,
        orders::PlaceOrderLineBody,
        orders::UpdateOrderBody,
        orders::OrderResponse,
        orders::OrderLineResponse,
        orders::ListOrdersResponse,
    )),
    tags(
        (name = "products", description = "Catalog lookups"),
        (name = "cart", description = "Shopping cart lines"),
        (name = "orders", description = "Order placement and status")
    )
)]
pub struct ApiDoc;
