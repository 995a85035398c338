use chrono::Utc;

use crate::application::pricing::line_price;
use crate::domain::context::Context;
use crate::domain::errors::DomainError;
use crate::domain::order::{Order, OrderLine, OrderStatus};
use crate::domain::pagination::Pagination;
use crate::domain::ports::{OrderRepository, ProductRepository, Validator};
use crate::domain::product::Product;
use crate::domain::requests::{ListOrdersRequest, PlaceOrderRequest};

pub struct OrderService<V, O, P> {
    validator: V,
    order_repo: O,
    product_repo: P,
}

impl<V: Validator, O: OrderRepository, P: ProductRepository> OrderService<V, O, P> {
    pub fn new(validator: V, order_repo: O, product_repo: P) -> Self {
        Self {
            validator,
            order_repo,
            product_repo,
        }
    }

    /// Prices every requested line from the current catalog and creates the
    /// order. The returned lines carry the products resolved here.
    pub fn place_order(&self, ctx: &Context, req: &PlaceOrderRequest) -> Result<Order, DomainError> {
        log::debug!(
            "[{}] place order for user {} ({} lines)",
            ctx.request_id(),
            req.user_id,
            req.lines.len()
        );
        self.validator.validate_struct(req)?;

        let mut products: Vec<Product> = Vec::with_capacity(req.lines.len());
        for line in &req.lines {
            products.push(self.product_repo.get_product_by_id(ctx, &line.product_id)?);
        }

        let lines: Vec<OrderLine> = req
            .lines
            .iter()
            .zip(&products)
            .map(|(line, product)| OrderLine {
                product_id: line.product_id.clone(),
                quantity: line.quantity,
                price: line_price(&product.price, line.quantity),
                product: Some(product.clone()),
            })
            .collect();

        let mut order = self.order_repo.create_order(ctx, &req.user_id, lines)?;

        if order.lines.len() != products.len() {
            return Err(DomainError::Internal(format!(
                "order repository returned {} lines for {} submitted",
                order.lines.len(),
                products.len()
            )));
        }
        for (line, product) in order.lines.iter_mut().zip(products) {
            line.product = Some(product);
        }

        log::info!(
            "[{}] order {} placed for user {}, total {}",
            ctx.request_id(),
            order.id,
            order.user_id,
            order.total_price
        );
        Ok(order)
    }

    pub fn list_my_orders(
        &self,
        ctx: &Context,
        req: &ListOrdersRequest,
    ) -> Result<(Vec<Order>, Pagination), DomainError> {
        self.order_repo.get_my_orders(ctx, req)
    }

    pub fn get_order_by_id(&self, ctx: &Context, id: &str) -> Result<Order, DomainError> {
        self.order_repo.get_order_by_id(ctx, id, true)
    }

    /// Moves the caller's order to `status`.
    ///
    /// Ownership is checked first, then whether the order is already in a
    /// terminal status, and only then whether `status` names a known status.
    /// Non-terminal orders may move to any status.
    pub fn update_order(
        &self,
        ctx: &Context,
        order_id: &str,
        user_id: &str,
        status: &str,
    ) -> Result<Order, DomainError> {
        let mut order = self.order_repo.get_order_by_id(ctx, order_id, false)?;

        if order.user_id != user_id {
            log::warn!(
                "[{}] user {} tried to update order {} owned by {}",
                ctx.request_id(),
                user_id,
                order.id,
                order.user_id
            );
            return Err(DomainError::PermissionDenied);
        }

        if order.status.is_terminal() {
            return Err(DomainError::InvalidOrderStatus);
        }

        let status: OrderStatus = status.parse()?;
        let previous = order.status;
        order.status = status;
        order.updated_at = Utc::now();
        self.order_repo.update_order(ctx, &order)?;

        log::info!(
            "[{}] order {} moved from {} to {}",
            ctx.request_id(),
            order.id,
            previous,
            order.status
        );
        Ok(order)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::application::test_support::{catalog_time, dec, order, product, StubValidator};
    use crate::domain::ports::{MockOrderRepository, MockProductRepository};
    use crate::domain::requests::PlaceOrderLineRequest;

    fn place_request(lines: &[(&str, i32)]) -> PlaceOrderRequest {
        PlaceOrderRequest {
            user_id: "u1".to_string(),
            lines: lines
                .iter()
                .map(|(product_id, quantity)| PlaceOrderLineRequest {
                    product_id: product_id.to_string(),
                    quantity: *quantity,
                })
                .collect(),
        }
    }

    /// Order repository that echoes the submitted lines without their
    /// products, the way a storage round-trip would.
    fn echoing_order_repo() -> MockOrderRepository {
        let mut orders = MockOrderRepository::new();
        orders
            .expect_create_order()
            .withf(|_, user_id, _| user_id == "u1")
            .times(1)
            .returning(|_, user_id, lines| {
                let mut created = order("o1", user_id, OrderStatus::New);
                created.total_price = crate::application::pricing::order_total(&lines);
                created.lines = lines
                    .into_iter()
                    .map(|line| OrderLine {
                        product: None,
                        ..line
                    })
                    .collect();
                Ok(created)
            });
        orders
    }

    fn expect_product(products: &mut MockProductRepository, id: &'static str, price: &'static str) {
        products
            .expect_get_product_by_id()
            .withf(move |_, requested| requested == id)
            .times(1)
            .returning(move |_, _| Ok(product(id, price)));
    }

    #[test]
    fn place_order_prices_lines_and_attaches_products() {
        let mut products = MockProductRepository::new();
        expect_product(&mut products, "p1", "50.0");

        let service = OrderService::new(StubValidator::accepting(), echoing_order_repo(), products);

        let placed = service
            .place_order(&Context::background(), &place_request(&[("p1", 2)]))
            .expect("place_order failed");

        assert_eq!(placed.lines.len(), 1);
        assert_eq!(placed.lines[0].price, dec("100.0"));
        assert_eq!(placed.lines[0].product, Some(product("p1", "50.0")));
        assert_eq!(placed.status, OrderStatus::New);
    }

    #[test]
    fn place_order_with_multiple_lines_sums_total() {
        let mut products = MockProductRepository::new();
        expect_product(&mut products, "p1", "10.0");
        expect_product(&mut products, "p2", "20.0");

        let service = OrderService::new(StubValidator::accepting(), echoing_order_repo(), products);

        let placed = service
            .place_order(&Context::background(), &place_request(&[("p1", 1), ("p2", 3)]))
            .expect("place_order failed");

        assert_eq!(placed.total_price, dec("70.0"));
        assert_eq!(placed.lines[0].price, dec("10.0"));
        assert_eq!(placed.lines[1].price, dec("60.0"));
        assert_eq!(placed.lines[0].product, Some(product("p1", "10.0")));
        assert_eq!(placed.lines[1].product, Some(product("p2", "20.0")));
    }

    #[test]
    fn place_order_returns_the_repository_total() {
        let mut products = MockProductRepository::new();
        expect_product(&mut products, "p1", "50.0");

        let mut orders = MockOrderRepository::new();
        orders
            .expect_create_order()
            .withf(|_, _, lines| lines.len() == 1 && lines[0].price == dec("100"))
            .returning(|_, user_id, lines| {
                let mut created = order("o9", user_id, OrderStatus::New);
                created.total_price = dec("100.00");
                created.lines = lines;
                Ok(created)
            });

        let service = OrderService::new(StubValidator::accepting(), orders, products);
        let placed = service
            .place_order(&Context::background(), &place_request(&[("p1", 2)]))
            .expect("place_order failed");

        assert_eq!(placed.id, "o9");
        assert_eq!(placed.total_price, dec("100.00"));
    }

    #[test]
    fn place_order_validation_error_skips_lookups() {
        let validator = Arc::new(StubValidator::rejecting("invalid input"));
        let mut products = MockProductRepository::new();
        products.expect_get_product_by_id().never();
        let mut orders = MockOrderRepository::new();
        orders.expect_create_order().never();

        let service = OrderService::new(validator.clone(), orders, products);
        let req = PlaceOrderRequest {
            user_id: String::new(),
            lines: vec![],
        };

        let err = service
            .place_order(&Context::background(), &req)
            .unwrap_err();

        assert_eq!(err.to_string(), "invalid input");
        assert_eq!(validator.calls(), 1);
    }

    #[test]
    fn place_order_aborts_on_product_lookup_failure() {
        let mut products = MockProductRepository::new();
        expect_product(&mut products, "p1", "10.0");
        products
            .expect_get_product_by_id()
            .withf(|_, id| id == "missing")
            .times(1)
            .returning(|_, _| Err(DomainError::NotFound("product")));
        products
            .expect_get_product_by_id()
            .withf(|_, id| id == "p3")
            .never();
        let mut orders = MockOrderRepository::new();
        orders.expect_create_order().never();

        let service = OrderService::new(StubValidator::accepting(), orders, products);
        let err = service
            .place_order(
                &Context::background(),
                &place_request(&[("p1", 1), ("missing", 1), ("p3", 1)]),
            )
            .unwrap_err();

        assert!(matches!(err, DomainError::NotFound("product")));
    }

    #[test]
    fn place_order_propagates_repository_failure() {
        let mut products = MockProductRepository::new();
        expect_product(&mut products, "p1", "10.0");
        let mut orders = MockOrderRepository::new();
        orders
            .expect_create_order()
            .returning(|_, _, _| Err(DomainError::Internal("insert failed".to_string())));

        let service = OrderService::new(StubValidator::accepting(), orders, products);
        let err = service
            .place_order(&Context::background(), &place_request(&[("p1", 1)]))
            .unwrap_err();

        assert_eq!(err.to_string(), "Internal error: insert failed");
    }

    #[test]
    fn place_order_rejects_mismatched_line_count() {
        let mut products = MockProductRepository::new();
        expect_product(&mut products, "p1", "10.0");
        expect_product(&mut products, "p2", "20.0");
        let mut orders = MockOrderRepository::new();
        orders.expect_create_order().returning(|_, user_id, mut lines| {
            lines.truncate(1);
            let mut created = order("o1", user_id, OrderStatus::New);
            created.lines = lines;
            Ok(created)
        });

        let service = OrderService::new(StubValidator::accepting(), orders, products);
        let err = service
            .place_order(&Context::background(), &place_request(&[("p1", 1), ("p2", 1)]))
            .unwrap_err();

        assert!(matches!(err, DomainError::Internal(_)));
    }

    #[test]
    fn list_my_orders_passes_results_through() {
        let mut orders = MockOrderRepository::new();
        orders
            .expect_get_my_orders()
            .withf(|_, req| req.user_id == "u1" && req.page == 1 && req.limit == 10)
            .returning(|_, _| {
                Ok((
                    vec![
                        order("o1", "u1", OrderStatus::New),
                        order("o2", "u1", OrderStatus::Done),
                    ],
                    Pagination::new(1, 10, 2),
                ))
            });

        let service = OrderService::new(
            StubValidator::accepting(),
            orders,
            MockProductRepository::new(),
        );
        let (found, page) = service
            .list_my_orders(&Context::background(), &ListOrdersRequest::for_user("u1"))
            .expect("list failed");

        assert_eq!(found.len(), 2);
        assert_eq!(found[0].id, "o1");
        assert_eq!(page, Pagination::new(1, 10, 2));
    }

    #[test]
    fn list_my_orders_empty_is_not_an_error() {
        let mut orders = MockOrderRepository::new();
        orders
            .expect_get_my_orders()
            .returning(|_, _| Ok((vec![], Pagination::new(2, 5, 0))));

        let service = OrderService::new(
            StubValidator::accepting(),
            orders,
            MockProductRepository::new(),
        );
        let req = ListOrdersRequest {
            page: 2,
            limit: 5,
            ..ListOrdersRequest::for_user("u1")
        };
        let (found, page) = service
            .list_my_orders(&Context::background(), &req)
            .expect("list failed");

        assert!(found.is_empty());
        assert_eq!(page.total, 0);
    }

    #[test]
    fn list_my_orders_propagates_error() {
        let mut orders = MockOrderRepository::new();
        orders
            .expect_get_my_orders()
            .returning(|_, _| Err(DomainError::Internal("db error".to_string())));

        let service = OrderService::new(
            StubValidator::accepting(),
            orders,
            MockProductRepository::new(),
        );
        let err = service
            .list_my_orders(&Context::background(), &ListOrdersRequest::for_user("u1"))
            .unwrap_err();

        assert!(matches!(err, DomainError::Internal(msg) if msg == "db error"));
    }

    #[test]
    fn get_order_by_id_preloads_lines() {
        let mut orders = MockOrderRepository::new();
        orders
            .expect_get_order_by_id()
            .withf(|_, id, preload| id == "o123" && *preload)
            .times(1)
            .returning(|_, id, _| Ok(order(id, "u1", OrderStatus::New)));

        let service = OrderService::new(
            StubValidator::accepting(),
            orders,
            MockProductRepository::new(),
        );
        let found = service
            .get_order_by_id(&Context::background(), "o123")
            .expect("get failed");

        assert_eq!(found.id, "o123");
    }

    #[test]
    fn get_order_by_id_propagates_not_found() {
        let mut orders = MockOrderRepository::new();
        orders
            .expect_get_order_by_id()
            .returning(|_, _, _| Err(DomainError::NotFound("order")));

        let service = OrderService::new(
            StubValidator::accepting(),
            orders,
            MockProductRepository::new(),
        );
        let err = service
            .get_order_by_id(&Context::background(), "o123")
            .unwrap_err();

        assert_eq!(err.to_string(), "order not found");
    }

    fn existing_order_repo(status: OrderStatus) -> MockOrderRepository {
        let mut orders = MockOrderRepository::new();
        orders
            .expect_get_order_by_id()
            .withf(|_, id, preload| id == "o1" && !*preload)
            .times(1)
            .returning(move |_, id, _| Ok(order(id, "u1", status)));
        orders
    }

    #[test]
    fn update_order_moves_to_requested_status() {
        let mut orders = existing_order_repo(OrderStatus::New);
        orders
            .expect_update_order()
            .withf(|_, order| order.id == "o1" && order.status == OrderStatus::Done)
            .times(1)
            .returning(|_, _| Ok(()));

        let service = OrderService::new(
            StubValidator::accepting(),
            orders,
            MockProductRepository::new(),
        );
        let updated = service
            .update_order(&Context::background(), "o1", "u1", "done")
            .expect("update failed");

        assert_eq!(updated.status, OrderStatus::Done);
    }

    #[test]
    fn update_order_returns_and_stores_fresh_updated_at() {
        let mut orders = existing_order_repo(OrderStatus::New);
        orders
            .expect_update_order()
            .withf(|_, order| order.updated_at > catalog_time())
            .times(1)
            .returning(|_, _| Ok(()));

        let service = OrderService::new(
            StubValidator::accepting(),
            orders,
            MockProductRepository::new(),
        );
        let updated = service
            .update_order(&Context::background(), "o1", "u1", "in_progress")
            .expect("update failed");

        assert_eq!(updated.created_at, catalog_time());
        assert!(updated.updated_at > catalog_time());
    }

    #[test]
    fn update_order_allows_any_target_from_non_terminal() {
        for (from, to) in [
            (OrderStatus::New, "in_progress"),
            (OrderStatus::New, "canceled"),
            (OrderStatus::InProgress, "new"),
            (OrderStatus::InProgress, "done"),
        ] {
            let mut orders = existing_order_repo(from);
            orders.expect_update_order().times(1).returning(|_, _| Ok(()));

            let service = OrderService::new(
                StubValidator::accepting(),
                orders,
                MockProductRepository::new(),
            );
            let updated = service
                .update_order(&Context::background(), "o1", "u1", to)
                .expect("update failed");

            assert_eq!(updated.status.as_str(), to);
        }
    }

    #[test]
    fn update_order_by_other_user_is_denied() {
        let mut orders = existing_order_repo(OrderStatus::New);
        orders.expect_update_order().never();

        let service = OrderService::new(
            StubValidator::accepting(),
            orders,
            MockProductRepository::new(),
        );
        let err = service
            .update_order(&Context::background(), "o1", "otherUser", "done")
            .unwrap_err();

        assert_eq!(err.to_string(), "permission denied");
    }

    #[test]
    fn ownership_is_checked_before_status() {
        let orders = existing_order_repo(OrderStatus::Done);

        let service = OrderService::new(
            StubValidator::accepting(),
            orders,
            MockProductRepository::new(),
        );
        let err = service
            .update_order(&Context::background(), "o1", "otherUser", "badstatus")
            .unwrap_err();

        assert!(matches!(err, DomainError::PermissionDenied));
    }

    #[test]
    fn terminal_orders_reject_every_target() {
        for current in [OrderStatus::Done, OrderStatus::Canceled] {
            for target in ["new", "in_progress", "done", "canceled", "badstatus"] {
                let mut orders = existing_order_repo(current);
                orders.expect_update_order().never();

                let service = OrderService::new(
                    StubValidator::accepting(),
                    orders,
                    MockProductRepository::new(),
                );
                let err = service
                    .update_order(&Context::background(), "o1", "u1", target)
                    .unwrap_err();

                assert_eq!(err.to_string(), "invalid order status");
            }
        }
    }

    #[test]
    fn unknown_target_status_is_rejected() {
        let mut orders = existing_order_repo(OrderStatus::New);
        orders.expect_update_order().never();

        let service = OrderService::new(
            StubValidator::accepting(),
            orders,
            MockProductRepository::new(),
        );
        let err = service
            .update_order(&Context::background(), "o1", "u1", "badstatus")
            .unwrap_err();

        assert!(matches!(err, DomainError::InvalidStatus));
        assert_eq!(err.to_string(), "invalid status");
    }

    #[test]
    fn update_order_propagates_repository_failure() {
        let mut orders = existing_order_repo(OrderStatus::New);
        orders
            .expect_update_order()
            .returning(|_, _| Err(DomainError::Internal("update failed".to_string())));

        let service = OrderService::new(
            StubValidator::accepting(),
            orders,
            MockProductRepository::new(),
        );
        let err = service
            .update_order(&Context::background(), "o1", "u1", "in_progress")
            .unwrap_err();

        assert!(matches!(err, DomainError::Internal(msg) if msg == "update failed"));
    }

    #[test]
    fn update_order_propagates_lookup_failure() {
        let mut orders = MockOrderRepository::new();
        orders
            .expect_get_order_by_id()
            .returning(|_, _, _| Err(DomainError::NotFound("order")));

        let service = OrderService::new(
            StubValidator::accepting(),
            orders,
            MockProductRepository::new(),
        );
        let err = service
            .update_order(&Context::background(), "missing", "u1", "done")
            .unwrap_err();

        assert!(matches!(err, DomainError::NotFound("order")));
    }
}
