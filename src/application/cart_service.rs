use crate::application::pricing::line_price;
use crate::domain::cart::{Cart, CartLine};
use crate::domain::context::Context;
use crate::domain::errors::DomainError;
use crate::domain::ports::{CartRepository, ProductRepository, Validator};
use crate::domain::requests::{AddProductRequest, RemoveProductRequest, UpdateCartLineRequest};

pub struct CartService<V, C, P> {
    validator: V,
    cart_repo: C,
    product_repo: P,
}

impl<V: Validator, C: CartRepository, P: ProductRepository> CartService<V, C, P> {
    pub fn new(validator: V, cart_repo: C, product_repo: P) -> Self {
        Self {
            validator,
            cart_repo,
            product_repo,
        }
    }

    pub fn add_product(&self, ctx: &Context, req: &AddProductRequest) -> Result<(), DomainError> {
        self.validator.validate_struct(req)?;

        let product = self.product_repo.get_product_by_id(ctx, &req.product_id)?;
        let line = CartLine {
            cart_id: req.cart_id.clone(),
            product_id: req.product_id.clone(),
            quantity: req.quantity,
            price: line_price(&product.price, req.quantity),
        };

        log::debug!(
            "[{}] adding {} x {} to cart {}",
            ctx.request_id(),
            line.quantity,
            line.product_id,
            line.cart_id
        );
        self.cart_repo.create_cart_line(ctx, &line)
    }

    /// Sets the line's quantity and reprices it from the current catalog
    /// price. Whatever price the line carried before is discarded.
    pub fn update_cart_line(
        &self,
        ctx: &Context,
        req: &UpdateCartLineRequest,
    ) -> Result<(), DomainError> {
        self.validator.validate_struct(req)?;

        let product = self.product_repo.get_product_by_id(ctx, &req.product_id)?;
        let mut line = self
            .cart_repo
            .get_cart_line(ctx, &req.cart_id, &req.product_id)?;

        line.quantity = req.quantity;
        line.price = line_price(&product.price, req.quantity);

        self.cart_repo.update_cart_line(ctx, &line)
    }

    pub fn remove_product(
        &self,
        ctx: &Context,
        req: &RemoveProductRequest,
    ) -> Result<(), DomainError> {
        let line = self
            .cart_repo
            .get_cart_line(ctx, &req.cart_id, &req.product_id)?;
        self.cart_repo.remove_cart_line(ctx, &line)
    }

    pub fn get_cart_by_user_id(&self, ctx: &Context, user_id: &str) -> Result<Cart, DomainError> {
        self.cart_repo.get_cart_by_user_id(ctx, user_id)
    }
}
