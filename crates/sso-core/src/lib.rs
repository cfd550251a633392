//! SSO gateway core primitives.
//!
//! Transport-free building blocks shared by the gateway:
//!
//! - [`Identity`]: the user profile asserted by the identity provider
//! - [`SecretKey`]: the process-wide signing key
//! - [`token`]: signed session token encoding and verification

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod identity;
pub mod key;
pub mod token;

pub use identity::Identity;
pub use key::SecretKey;
pub use token::{TokenError, decode, encode};
