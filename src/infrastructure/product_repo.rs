use chrono::Utc;
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel::PgTextExpressionMethods;

use crate::db::DbPool;
use crate::domain::context::Context;
use crate::domain::errors::DomainError;
use crate::domain::pagination::Pagination;
use crate::domain::ports::ProductRepository;
use crate::domain::product::{NewProduct, Product};
use crate::domain::requests::ListProductsRequest;
use crate::schema::products;

use super::models::{NewProductRow, ProductRow};
use super::new_id;

pub struct DieselProductRepository {
    pool: DbPool,
}

impl DieselProductRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn filtered<'a>(name: Option<&str>) -> products::BoxedQuery<'a, Pg> {
    let query = products::table.into_boxed();
    match name {
        Some(name) => query.filter(products::name.ilike(format!("%{}%", name))),
        None => query,
    }
}

impl ProductRepository for DieselProductRepository {
    fn get_product_by_id(&self, ctx: &Context, id: &str) -> Result<Product, DomainError> {
        ctx.check()?;
        let mut conn = self.pool.get()?;

        products::table
            .find(id)
            .select(ProductRow::as_select())
            .first(&mut conn)
            .optional()?
            .map(Product::from)
            .ok_or(DomainError::NotFound("product"))
    }

    fn list_products(
        &self,
        ctx: &Context,
        req: &ListProductsRequest,
    ) -> Result<(Vec<Product>, Pagination), DomainError> {
        ctx.check()?;
        let mut conn = self.pool.get()?;

        let total: i64 = filtered(req.name.as_deref())
            .count()
            .get_result(&mut conn)?;
        let page = Pagination::new(req.page, req.limit, total);

        let rows: Vec<ProductRow> = filtered(req.name.as_deref())
            .select(ProductRow::as_select())
            .order((products::name.asc(), products::id.asc()))
            .limit(page.limit)
            .offset(page.skip)
            .load(&mut conn)?;

        Ok((rows.into_iter().map(Product::from).collect(), page))
    }

    fn create_product(&self, ctx: &Context, product: NewProduct) -> Result<Product, DomainError> {
        ctx.check()?;
        let mut conn = self.pool.get()?;

        let row = diesel::insert_into(products::table)
            .values(&NewProductRow {
                id: new_id(),
                name: product.name,
                description: product.description,
                price: product.price,
            })
            .returning(ProductRow::as_returning())
            .get_result(&mut conn)?;

        Ok(row.into())
    }

    fn update_product(&self, ctx: &Context, product: &Product) -> Result<(), DomainError> {
        ctx.check()?;
        let mut conn = self.pool.get()?;

        let updated = diesel::update(products::table.find(&product.id))
            .set((
                products::name.eq(&product.name),
                products::description.eq(&product.description),
                products::price.eq(product.price.clone()),
                products::updated_at.eq(Utc::now()),
            ))
            .execute(&mut conn)?;

        if updated == 0 {
            return Err(DomainError::NotFound("product"));
        }
        Ok(())
    }

    fn delete_product(&self, ctx: &Context, id: &str) -> Result<(), DomainError> {
        ctx.check()?;
        let mut conn = self.pool.get()?;

        let deleted = diesel::delete(products::table.find(id)).execute(&mut conn)?;

        if deleted == 0 {
            return Err(DomainError::NotFound("product"));
        }
        Ok(())
    }
}
