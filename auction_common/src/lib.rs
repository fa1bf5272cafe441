mod tokens;

pub mod helpers;

pub use tokens::{Tokens, TokensConversionError};
