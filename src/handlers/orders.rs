use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{default_limit, default_page, page_bounds, AppState, CurrentUser, PaginationResponse};
use super::products::ProductResponse;
use crate::domain::errors::DomainError;
use crate::domain::order::{Order, OrderLine, OrderStatus};
use crate::domain::requests::{ListOrdersRequest, PlaceOrderLineRequest, PlaceOrderRequest};
use crate::errors::AppError;

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
pub struct PlaceOrderLineBody {
    pub product_id: String,
    pub quantity: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct PlaceOrderBody {
    pub lines: Vec<PlaceOrderLineBody>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateOrderBody {
    /// One of "new", "in_progress", "done", "canceled"
    pub status: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderLineResponse {
    pub product_id: String,
    pub quantity: i32,
    /// Line total as a decimal string
    pub price: String,
    pub product: Option<ProductResponse>,
}

impl From<OrderLine> for OrderLineResponse {
    fn from(l: OrderLine) -> Self {
        Self {
            product_id: l.product_id,
            quantity: l.quantity,
            price: l.price.to_string(),
            product: l.product.map(ProductResponse::from),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderResponse {
    pub id: String,
    pub user_id: String,
    pub status: String,
    pub total_price: String,
    pub created_at: String,
    pub updated_at: String,
    pub lines: Vec<OrderLineResponse>,
}

impl From<Order> for OrderResponse {
    fn from(o: Order) -> Self {
        Self {
            id: o.id,
            user_id: o.user_id,
            status: o.status.to_string(),
            total_price: o.total_price.to_string(),
            created_at: o.created_at.to_rfc3339(),
            updated_at: o.updated_at.to_rfc3339(),
            lines: o.lines.into_iter().map(OrderLineResponse::from).collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ListOrdersParams {
    pub status: Option<String>,
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ListOrdersResponse {
    pub items: Vec<OrderResponse>,
    pub pagination: PaginationResponse,
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// POST /orders
///
/// Prices every line from the current catalog and stores the order as "new".
#[utoipa::path(
    post,
    path = "/orders",
    params(
        ("X-User-Id" = String, Header, description = "Calling user"),
    ),
    request_body = PlaceOrderBody,
    responses(
        (status = 201, description = "Order placed", body = OrderResponse),
        (status = 400, description = "Invalid request"),
        (status = 401, description = "Missing user header"),
        (status = 404, description = "A product does not exist"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "orders"
)]
pub async fn place_order(
    state: web::Data<AppState>,
    user: CurrentUser,
    body: web::Json<PlaceOrderBody>,
) -> Result<HttpResponse, AppError> {
    let req = PlaceOrderRequest {
        user_id: user.0,
        lines: body
            .into_inner()
            .lines
            .into_iter()
            .map(|l| PlaceOrderLineRequest {
                product_id: l.product_id,
                quantity: l.quantity,
            })
            .collect(),
    };
    let ctx = state.context();

    let order = web::block(move || state.orders.place_order(&ctx, &req)).await??;

    Ok(HttpResponse::Created().json(OrderResponse::from(order)))
}

/// GET /orders
///
/// Returns the caller's orders, newest first, without their lines.
#[utoipa::path(
    get,
    path = "/orders",
    params(
        ("X-User-Id" = String, Header, description = "Calling user"),
        ("status" = Option<String>, Query, description = "Only orders in this status"),
        ("page" = Option<i64>, Query, description = "Page number (1-based, default 1)"),
        ("limit" = Option<i64>, Query, description = "Items per page (default 10, max 100)"),
    ),
    responses(
        (status = 200, description = "Paginated list of orders", body = ListOrdersResponse),
        (status = 400, description = "Unknown status filter"),
        (status = 401, description = "Missing user header"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "orders"
)]
pub async fn list_my_orders(
    state: web::Data<AppState>,
    user: CurrentUser,
    query: web::Query<ListOrdersParams>,
) -> Result<HttpResponse, AppError> {
    let params = query.into_inner();
    let (page, limit) = page_bounds(params.page, params.limit);
    let status = params
        .status
        .as_deref()
        .map(str::parse::<OrderStatus>)
        .transpose()?;
    let req = ListOrdersRequest {
        user_id: user.0,
        status,
        page,
        limit,
    };
    let ctx = state.context();

    let (orders, pagination) =
        web::block(move || state.orders.list_my_orders(&ctx, &req)).await??;

    Ok(HttpResponse::Ok().json(ListOrdersResponse {
        items: orders.into_iter().map(OrderResponse::from).collect(),
        pagination: pagination.into(),
    }))
}

/// GET /orders/{id}
///
/// Returns one of the caller's orders with its lines and their products.
#[utoipa::path(
    get,
    path = "/orders/{id}",
    params(
        ("id" = String, Path, description = "Order id"),
        ("X-User-Id" = String, Header, description = "Calling user"),
    ),
    responses(
        (status = 200, description = "Order found", body = OrderResponse),
        (status = 401, description = "Missing user header"),
        (status = 403, description = "Order belongs to another user"),
        (status = 404, description = "Order not found"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "orders"
)]
pub async fn get_order(
    state: web::Data<AppState>,
    user: CurrentUser,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let ctx = state.context();

    let order = web::block(move || {
        let order = state.orders.get_order_by_id(&ctx, &id)?;
        if order.user_id != user.0 {
            log::warn!(
                "[{}] user {} tried to read order {} owned by {}",
                ctx.request_id(),
                user.0,
                order.id,
                order.user_id
            );
            return Err(DomainError::PermissionDenied);
        }
        Ok::<_, DomainError>(order)
    })
    .await??;

    Ok(HttpResponse::Ok().json(OrderResponse::from(order)))
}

/// PUT /orders/{id}
///
/// Moves one of the caller's orders to a new status. Orders that are already
/// done or canceled cannot change.
#[utoipa::path(
    put,
    path = "/orders/{id}",
    params(
        ("id" = String, Path, description = "Order id"),
        ("X-User-Id" = String, Header, description = "Calling user"),
    ),
    request_body = UpdateOrderBody,
    responses(
        (status = 200, description = "Order updated", body = OrderResponse),
        (status = 400, description = "Unknown status or order already finished"),
        (status = 401, description = "Missing user header"),
        (status = 403, description = "Order belongs to another user"),
        (status = 404, description = "Order not found"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "orders"
)]
pub async fn update_order(
    state: web::Data<AppState>,
    user: CurrentUser,
    path: web::Path<String>,
    body: web::Json<UpdateOrderBody>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let status = body.into_inner().status;
    let ctx = state.context();

    let order = web::block(move || state.orders.update_order(&ctx, &id, &user.0, &status))
        .await??;

    Ok(HttpResponse::Ok().json(OrderResponse::from(order)))
}
