//! Authentication domain types

mod session;
mod token;

pub use session::{Credentials, LoginResponse, RefreshTokenRequest, UserProfile};
pub use token::{JwtClaims, TokenError, TokenPair, decode_claims};
