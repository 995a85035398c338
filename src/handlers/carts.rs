use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{AppState, CurrentUser};
use crate::domain::cart::{Cart, CartLine};
use crate::domain::context::Context;
use crate::domain::errors::DomainError;
use crate::domain::requests::{AddProductRequest, RemoveProductRequest, UpdateCartLineRequest};
use crate::errors::AppError;

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddCartLineBody {
    pub product_id: String,
    pub quantity: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateCartLineBody {
    pub quantity: i32,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartLineResponse {
    pub product_id: String,
    pub quantity: i32,
    /// Line total (unit price times quantity) as a decimal string
    pub price: String,
}

impl From<CartLine> for CartLineResponse {
    fn from(l: CartLine) -> Self {
        Self {
            product_id: l.product_id,
            quantity: l.quantity,
            price: l.price.to_string(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartResponse {
    pub id: String,
    pub user_id: String,
    pub lines: Vec<CartLineResponse>,
}

impl From<Cart> for CartResponse {
    fn from(c: Cart) -> Self {
        Self {
            id: c.id,
            user_id: c.user_id,
            lines: c.lines.into_iter().map(CartLineResponse::from).collect(),
        }
    }
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// GET /cart
///
/// Returns the caller's cart, creating an empty one on first access.
#[utoipa::path(
    get,
    path = "/cart",
    params(
        ("X-User-Id" = String, Header, description = "Calling user"),
    ),
    responses(
        (status = 200, description = "The caller's cart", body = CartResponse),
        (status = 401, description = "Missing user header"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "cart"
)]
pub async fn get_cart(
    state: web::Data<AppState>,
    user: CurrentUser,
) -> Result<HttpResponse, AppError> {
    let ctx = state.context();

    let cart = web::block(move || state.carts.get_cart_by_user_id(&ctx, &user.0)).await??;

    Ok(HttpResponse::Ok().json(CartResponse::from(cart)))
}

/// Rejects a cart id that is not the caller's own cart.
fn ensure_own_cart(
    state: &AppState,
    ctx: &Context,
    user_id: &str,
    cart_id: &str,
) -> Result<(), DomainError> {
    let cart = state.carts.get_cart_by_user_id(ctx, user_id)?;
    if cart.id != cart_id {
        log::warn!(
            "[{}] user {} tried to change cart {}",
            ctx.request_id(),
            user_id,
            cart_id
        );
        return Err(DomainError::PermissionDenied);
    }
    Ok(())
}

/// POST /carts/{cart_id}/lines
#[utoipa::path(
    post,
    path = "/carts/{cart_id}/lines",
    params(
        ("cart_id" = String, Path, description = "Cart id"),
        ("X-User-Id" = String, Header, description = "Calling user"),
    ),
    request_body = AddCartLineBody,
    responses(
        (status = 201, description = "Product added to the cart"),
        (status = 400, description = "Invalid request or product already in the cart"),
        (status = 401, description = "Missing user header"),
        (status = 403, description = "Cart belongs to another user"),
        (status = 404, description = "Product not found"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "cart"
)]
pub async fn add_product(
    state: web::Data<AppState>,
    user: CurrentUser,
    path: web::Path<String>,
    body: web::Json<AddCartLineBody>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    let req = AddProductRequest {
        cart_id: path.into_inner(),
        product_id: body.product_id,
        quantity: body.quantity,
    };
    let ctx = state.context();

    web::block(move || {
        ensure_own_cart(&state, &ctx, &user.0, &req.cart_id)?;
        state.carts.add_product(&ctx, &req)
    })
    .await??;

    Ok(HttpResponse::Created().finish())
}

/// PUT /carts/{cart_id}/lines/{product_id}
///
/// Sets the quantity of a line and reprices it from the current catalog price.
#[utoipa::path(
    put,
    path = "/carts/{cart_id}/lines/{product_id}",
    params(
        ("cart_id" = String, Path, description = "Cart id"),
        ("product_id" = String, Path, description = "Product id"),
        ("X-User-Id" = String, Header, description = "Calling user"),
    ),
    request_body = UpdateCartLineBody,
    responses(
        (status = 204, description = "Line updated"),
        (status = 400, description = "Invalid request"),
        (status = 401, description = "Missing user header"),
        (status = 403, description = "Cart belongs to another user"),
        (status = 404, description = "Product or cart line not found"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "cart"
)]
pub async fn update_cart_line(
    state: web::Data<AppState>,
    user: CurrentUser,
    path: web::Path<(String, String)>,
    body: web::Json<UpdateCartLineBody>,
) -> Result<HttpResponse, AppError> {
    let (cart_id, product_id) = path.into_inner();
    let req = UpdateCartLineRequest {
        cart_id,
        product_id,
        quantity: body.into_inner().quantity,
    };
    let ctx = state.context();

    web::block(move || {
        ensure_own_cart(&state, &ctx, &user.0, &req.cart_id)?;
        state.carts.update_cart_line(&ctx, &req)
    })
    .await??;

    Ok(HttpResponse::NoContent().finish())
}

/// DELETE /carts/{cart_id}/lines/{product_id}
#[utoipa::path(
    delete,
    path = "/carts/{cart_id}/lines/{product_id}",
    params(
        ("cart_id" = String, Path, description = "Cart id"),
        ("product_id" = String, Path, description = "Product id"),
        ("X-User-Id" = String, Header, description = "Calling user"),
    ),
    responses(
        (status = 204, description = "Line removed"),
        (status = 401, description = "Missing user header"),
        (status = 403, description = "Cart belongs to another user"),
        (status = 404, description = "Cart line not found"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "cart"
)]
pub async fn remove_product(
    state: web::Data<AppState>,
    user: CurrentUser,
    path: web::Path<(String, String)>,
) -> Result<HttpResponse, AppError> {
    let (cart_id, product_id) = path.into_inner();
    let req = RemoveProductRequest {
        cart_id,
        product_id,
    };
    let ctx = state.context();

    web::block(move || {
        ensure_own_cart(&state, &ctx, &user.0, &req.cart_id)?;
        state.carts.remove_product(&ctx, &req)
    })
    .await??;

    Ok(HttpResponse::NoContent().finish())
}
