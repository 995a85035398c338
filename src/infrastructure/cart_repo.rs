use chrono::Utc;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};

use crate::db::DbPool;
use crate::domain::cart::{Cart, CartLine};
use crate::domain::context::Context;
use crate::domain::errors::DomainError;
use crate::domain::ports::CartRepository;
use crate::schema::{cart_lines, carts};

use super::models::{CartLineRow, CartRow, NewCartLineRow, NewCartRow};
use super::new_id;

pub struct DieselCartRepository {
    pool: DbPool,
}

impl DieselCartRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl CartRepository for DieselCartRepository {
    /// Returns the user's cart, creating an empty one on first access.
    fn get_cart_by_user_id(&self, ctx: &Context, user_id: &str) -> Result<Cart, DomainError> {
        ctx.check()?;
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            diesel::insert_into(carts::table)
                .values(&NewCartRow {
                    id: new_id(),
                    user_id: user_id.to_string(),
                })
                .on_conflict(carts::user_id)
                .do_nothing()
                .execute(conn)?;

            let cart: CartRow = carts::table
                .filter(carts::user_id.eq(user_id))
                .select(CartRow::as_select())
                .first(conn)?;

            let lines: Vec<CartLineRow> = cart_lines::table
                .filter(cart_lines::cart_id.eq(&cart.id))
                .order((cart_lines::created_at.asc(), cart_lines::product_id.asc()))
                .select(CartLineRow::as_select())
                .load(conn)?;

            Ok(cart.into_cart(lines))
        })
    }

    fn get_cart_line(
        &self,
        ctx: &Context,
        cart_id: &str,
        product_id: &str,
    ) -> Result<CartLine, DomainError> {
        ctx.check()?;
        let mut conn = self.pool.get()?;

        cart_lines::table
            .find((cart_id, product_id))
            .select(CartLineRow::as_select())
            .first(&mut conn)
            .optional()?
            .map(CartLine::from)
            .ok_or(DomainError::NotFound("cart line"))
    }

    fn create_cart_line(&self, ctx: &Context, line: &CartLine) -> Result<(), DomainError> {
        ctx.check()?;
        let mut conn = self.pool.get()?;

        diesel::insert_into(cart_lines::table)
            .values(&NewCartLineRow {
                cart_id: line.cart_id.clone(),
                product_id: line.product_id.clone(),
                quantity: line.quantity,
                price: line.price.clone(),
            })
            .execute(&mut conn)
            .map_err(|e| match e {
                DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                    DomainError::Validation("product is already in the cart".to_string())
                }
                DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, _) => {
                    DomainError::NotFound("cart")
                }
                other => other.into(),
            })?;

        Ok(())
    }

    fn update_cart_line(&self, ctx: &Context, line: &CartLine) -> Result<(), DomainError> {
        ctx.check()?;
        let mut conn = self.pool.get()?;

        let updated = diesel::update(
            cart_lines::table.find((line.cart_id.as_str(), line.product_id.as_str())),
        )
        .set((
            cart_lines::quantity.eq(line.quantity),
            cart_lines::price.eq(line.price.clone()),
            cart_lines::updated_at.eq(Utc::now()),
        ))
        .execute(&mut conn)?;

        if updated == 0 {
            return Err(DomainError::NotFound("cart line"));
        }
        Ok(())
    }

    fn remove_cart_line(&self, ctx: &Context, line: &CartLine) -> Result<(), DomainError> {
        ctx.check()?;
        let mut conn = self.pool.get()?;

        let deleted = diesel::delete(
            cart_lines::table.find((line.cart_id.as_str(), line.product_id.as_str())),
        )
        .execute(&mut conn)?;

        if deleted == 0 {
            return Err(DomainError::NotFound("cart line"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use bigdecimal::BigDecimal;

    use super::*;
    use crate::domain::ports::ProductRepository;
    use crate::domain::product::NewProduct;
    use crate::infrastructure::product_repo::DieselProductRepository;
    use crate::infrastructure::test_db::setup_db;

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).expect("valid decimal")
    }

    #[tokio::test]
    #[ignore = "requires a container runtime"]
    async fn cart_is_created_once_per_user() {
        let (_container, pool) = setup_db().await;
        let repo = DieselCartRepository::new(pool);
        let ctx = Context::background();

        let first = repo.get_cart_by_user_id(&ctx, "u1").expect("get failed");
        let second = repo.get_cart_by_user_id(&ctx, "u1").expect("get failed");

        assert_eq!(first.id, second.id);
        assert_eq!(first.user_id, "u1");
        assert!(first.lines.is_empty());
    }

    #[tokio::test]
    #[ignore = "requires a container runtime"]
    async fn cart_line_lifecycle() {
        let (_container, pool) = setup_db().await;
        let products = DieselProductRepository::new(pool.clone());
        let repo = DieselCartRepository::new(pool);
        let ctx = Context::background();

        let product = products
            .create_product(
                &ctx,
                NewProduct {
                    name: "Pen".to_string(),
                    description: String::new(),
                    price: dec("1.50"),
                },
            )
            .expect("create product failed");
        let cart = repo.get_cart_by_user_id(&ctx, "u1").expect("get failed");

        let mut line = CartLine {
            cart_id: cart.id.clone(),
            product_id: product.id.clone(),
            quantity: 2,
            price: dec("3.00"),
        };
        repo.create_cart_line(&ctx, &line).expect("create failed");
        assert!(matches!(
            repo.create_cart_line(&ctx, &line),
            Err(DomainError::Validation(_))
        ));

        line.quantity = 4;
        line.price = dec("6.00");
        repo.update_cart_line(&ctx, &line).expect("update failed");
        let stored = repo
            .get_cart_line(&ctx, &cart.id, &product.id)
            .expect("get line failed");
        assert_eq!(stored, line);

        let cart = repo.get_cart_by_user_id(&ctx, "u1").expect("get failed");
        assert_eq!(cart.lines, vec![line.clone()]);

        repo.remove_cart_line(&ctx, &line).expect("remove failed");
        assert!(matches!(
            repo.get_cart_line(&ctx, &cart.id, &product.id),
            Err(DomainError::NotFound("cart line"))
        ));
    }

    #[tokio::test]
    #[ignore = "requires a container runtime"]
    async fn line_for_unknown_cart_is_not_found() {
        let (_container, pool) = setup_db().await;
        let products = DieselProductRepository::new(pool.clone());
        let repo = DieselCartRepository::new(pool);
        let ctx = Context::background();

        let product = products
            .create_product(
                &ctx,
                NewProduct {
                    name: "Pen".to_string(),
                    description: String::new(),
                    price: dec("1.50"),
                },
            )
            .expect("create product failed");

        let line = CartLine {
            cart_id: "no-such-cart".to_string(),
            product_id: product.id,
            quantity: 1,
            price: dec("1.50"),
        };
        assert!(matches!(
            repo.create_cart_line(&ctx, &line),
            Err(DomainError::NotFound("cart"))
        ));
    }
}
