//! Authentication: credential normalization, token decoding and the session.

mod credential;
mod session;
mod token;

pub use credential::*;
pub use session::*;
#[cfg(test)]
pub(crate) use token::encode_test_token;
