//! Key material and signing primitives.
//!
//! The engine currently signs with a single curve, Ed25519. The traits below keep
//! consuming modules independent of the curve so that further algorithms can be
//! added behind the same interface.

mod alg;
mod ed25519;
mod errors;
mod traits;
mod utils;

pub mod digest;

pub use alg::{decode_multikey, encode_multikey, Algorithm};
pub use ed25519::Ed25519KeyPair;
pub use errors::Error;
pub use traits::{CoreSign, Generate, KeyMaterial, BYTES_LENGTH_32};

/// A public key with an optional secret counterpart.
pub struct AsymmetricKey<P, S> {
    pub public_key: P,
    pub secret_key: Option<S>,
}
