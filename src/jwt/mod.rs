//! Claim sets and their compact RS256 encoding.

/// Claim set construction.
pub mod builder;
/// The claims carried by a token.
pub mod claims;
/// Signing and verification of claim sets.
pub mod serializer;

pub use builder::JwtBuilder;
pub use claims::Claims;
pub use serializer::JwtSerializer;
