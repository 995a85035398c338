use crate::domain::errors::DomainError;
use crate::domain::ports::Validator;
use crate::domain::requests::Validate;

/// Runs the rules each request type declares through [`Validate`].
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestValidator;

impl RequestValidator {
    pub fn new() -> Self {
        Self
    }
}

impl Validator for RequestValidator {
    fn validate_struct(&self, request: &dyn Validate) -> Result<(), DomainError> {
        request.validate().map_err(|e| {
            log::debug!("rejected request {:?}: {}", request, e);
            e
        })
    }
}
