use crate::validation::FieldErrors;
use thiserror::Error;

pub type FormResult<T> = Result<T, FormError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FormError {
    #[error("Validation failed: {0}")]
    Validation(FieldErrors),

    #[error("Cannot navigate from step {from} to step {to}")]
    InvalidNavigation { from: u8, to: u8 },

    #[error("Already at the first step")]
    AtFirstStep,

    #[error("Donation can only be submitted from the payment step (currently at step {0})")]
    NotReadyToSubmit(u8),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Unknown {kind}: {value}")]
    UnknownVariant { kind: &'static str, value: String },
}

impl FormError {
    /// Field errors carried by a validation failure, if any
    pub fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            FormError::Validation(errors) => Some(errors),
            _ => None,
        }
    }
}
