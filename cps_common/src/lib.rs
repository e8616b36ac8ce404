mod cents;

pub mod op;
mod secret;

pub use cents::{Cents, CentsConversionError, CURRENCY_CODE, CURRENCY_CODE_LOWER};
pub use secret::Secret;
