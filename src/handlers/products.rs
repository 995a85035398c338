use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{default_limit, default_page, page_bounds, AppState, PaginationResponse};
use crate::domain::product::Product;
use crate::domain::requests::ListProductsRequest;
use crate::errors::AppError;

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, Serialize, ToSchema)]
pub struct ProductResponse {
    pub id: String,
    pub name: String,
    pub description: String,
    /// Decimal price as a string, e.g. "9.99"
    pub price: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Product> for ProductResponse {
    fn from(p: Product) -> Self {
        Self {
            id: p.id,
            name: p.name,
            description: p.description,
            price: p.price.to_string(),
            created_at: p.created_at.to_rfc3339(),
            updated_at: p.updated_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ListProductsParams {
    pub name: Option<String>,
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ListProductsResponse {
    pub items: Vec<ProductResponse>,
    pub pagination: PaginationResponse,
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// GET /products
#[utoipa::path(
    get,
    path = "/products",
    params(
        ("name" = Option<String>, Query, description = "Case-insensitive name filter"),
        ("page" = Option<i64>, Query, description = "Page number (1-based, default 1)"),
        ("limit" = Option<i64>, Query, description = "Items per page (default 10, max 100)"),
    ),
    responses(
        (status = 200, description = "Paginated list of products", body = ListProductsResponse),
        (status = 500, description = "Internal server error"),
    ),
    tag = "products"
)]
pub async fn list_products(
    state: web::Data<AppState>,
    query: web::Query<ListProductsParams>,
) -> Result<HttpResponse, AppError> {
    let params = query.into_inner();
    let (page, limit) = page_bounds(params.page, params.limit);
    let req = ListProductsRequest {
        name: params.name.filter(|n| !n.trim().is_empty()),
        page,
        limit,
    };
    let ctx = state.context();

    let (products, pagination) =
        web::block(move || state.products.list_products(&ctx, &req)).await??;

    Ok(HttpResponse::Ok().json(ListProductsResponse {
        items: products.into_iter().map(ProductResponse::from).collect(),
        pagination: pagination.into(),
    }))
}

/// GET /products/{id}
#[utoipa::path(
    get,
    path = "/products/{id}",
    params(
        ("id" = String, Path, description = "Product id"),
    ),
    responses(
        (status = 200, description = "Product found", body = ProductResponse),
        (status = 404, description = "Product not found"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "products"
)]
pub async fn get_product(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let ctx = state.context();

    let product = web::block(move || state.products.get_product_by_id(&ctx, &id)).await??;

    Ok(HttpResponse::Ok().json(ProductResponse::from(product)))
}
