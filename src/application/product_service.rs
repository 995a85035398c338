use crate::domain::context::Context;
use crate::domain::errors::DomainError;
use crate::domain::pagination::Pagination;
use crate::domain::ports::ProductRepository;
use crate::domain::product::Product;
use crate::domain::requests::ListProductsRequest;

/// Read-only access to the catalog.
pub struct ProductService<P> {
    product_repo: P,
}

impl<P: ProductRepository> ProductService<P> {
    pub fn new(product_repo: P) -> Self {
        Self { product_repo }
    }

    pub fn list_products(
        &self,
        ctx: &Context,
        req: &ListProductsRequest,
    ) -> Result<(Vec<Product>, Pagination), DomainError> {
        self.product_repo.list_products(ctx, req)
    }

    pub fn get_product_by_id(&self, ctx: &Context, id: &str) -> Result<Product, DomainError> {
        self.product_repo.get_product_by_id(ctx, id)
    }
}
