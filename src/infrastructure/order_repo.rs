use diesel::pg::Pg;
use diesel::prelude::*;

use crate::application::pricing::order_total;
use crate::db::DbPool;
use crate::domain::context::Context;
use crate::domain::errors::DomainError;
use crate::domain::order::{Order, OrderLine, OrderStatus};
use crate::domain::pagination::Pagination;
use crate::domain::ports::OrderRepository;
use crate::domain::requests::ListOrdersRequest;
use crate::schema::{order_lines, orders, products};

use super::models::{NewOrderLineRow, NewOrderRow, OrderLineRow, OrderRow, ProductRow};
use super::new_id;

pub struct DieselOrderRepository {
    pool: DbPool,
}

impl DieselOrderRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn owned_by<'a>(req: &ListOrdersRequest) -> orders::BoxedQuery<'a, Pg> {
    let query = orders::table
        .filter(orders::user_id.eq(req.user_id.clone()))
        .into_boxed();
    match req.status {
        Some(status) => query.filter(orders::status.eq(status.as_str())),
        None => query,
    }
}

impl OrderRepository for DieselOrderRepository {
    fn create_order(
        &self,
        ctx: &Context,
        user_id: &str,
        lines: Vec<OrderLine>,
    ) -> Result<Order, DomainError> {
        ctx.check()?;
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            // 1. Insert the order with its total
            let order_id = new_id();
            let order = diesel::insert_into(orders::table)
                .values(&NewOrderRow {
                    id: order_id.clone(),
                    user_id: user_id.to_string(),
                    total_price: order_total(&lines),
                    status: OrderStatus::New.as_str().to_string(),
                })
                .returning(OrderRow::as_returning())
                .get_result(conn)?;

            // 2. Insert order lines, keeping the submitted order
            let new_lines = lines
                .iter()
                .enumerate()
                .map(|(position, line)| {
                    Ok(NewOrderLineRow {
                        id: new_id(),
                        order_id: order_id.clone(),
                        position: i32::try_from(position).map_err(|e| {
                            DomainError::Internal(format!("too many order lines: {e}"))
                        })?,
                        product_id: line.product_id.clone(),
                        quantity: line.quantity,
                        price: line.price.clone(),
                    })
                })
                .collect::<Result<Vec<_>, DomainError>>()?;

            let mut rows: Vec<OrderLineRow> = if new_lines.is_empty() {
                vec![]
            } else {
                diesel::insert_into(order_lines::table)
                    .values(&new_lines)
                    .returning(OrderLineRow::as_returning())
                    .get_results(conn)?
            };
            rows.sort_by_key(|row| row.position);

            order.into_order(rows.into_iter().map(|row| row.into_line(None)).collect())
        })
    }

    fn get_order_by_id(
        &self,
        ctx: &Context,
        id: &str,
        preload: bool,
    ) -> Result<Order, DomainError> {
        ctx.check()?;
        let mut conn = self.pool.get()?;

        let order = orders::table
            .find(id)
            .select(OrderRow::as_select())
            .first(&mut conn)
            .optional()?
            .ok_or(DomainError::NotFound("order"))?;

        if !preload {
            return order.into_order(vec![]);
        }

        let lines = order_lines::table
            .inner_join(products::table)
            .filter(order_lines::order_id.eq(&order.id))
            .order(order_lines::position.asc())
            .select((OrderLineRow::as_select(), ProductRow::as_select()))
            .load::<(OrderLineRow, ProductRow)>(&mut conn)?
            .into_iter()
            .map(|(line, product)| line.into_line(Some(product.into())))
            .collect();

        order.into_order(lines)
    }

    fn get_my_orders(
        &self,
        ctx: &Context,
        req: &ListOrdersRequest,
    ) -> Result<(Vec<Order>, Pagination), DomainError> {
        ctx.check()?;
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            let total: i64 = owned_by(req).count().get_result(conn)?;
            let page = Pagination::new(req.page, req.limit, total);

            let rows: Vec<OrderRow> = owned_by(req)
                .select(OrderRow::as_select())
                .order((orders::created_at.desc(), orders::id.asc()))
                .limit(page.limit)
                .offset(page.skip)
                .load(conn)?;

            let items = rows
                .into_iter()
                .map(|row| row.into_order(vec![]))
                .collect::<Result<Vec<_>, _>>()?;

            Ok((items, page))
        })
    }

    fn update_order(&self, ctx: &Context, order: &Order) -> Result<(), DomainError> {
        ctx.check()?;
        let mut conn = self.pool.get()?;

        let updated = diesel::update(orders::table.find(&order.id))
            .set((
                orders::status.eq(order.status.as_str()),
                orders::updated_at.eq(order.updated_at),
            ))
            .execute(&mut conn)?;

        if updated == 0 {
            return Err(DomainError::NotFound("order"));
        }
        Ok(())
    }
}
