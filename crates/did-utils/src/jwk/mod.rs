//! JSON Web Keys, the serialized form of keys handed to and returned by the engine.
//!
//! ## Submodules
//!
//! - [`bytes`]:  base64url-encoded byte sequences.
//! - [`key`]:    key types (`OKP`, `EC`) that can be carried in a JWK.
//! - [`prm`]:    parameters unrelated to the key implementation.
//! - [`secret`]: secret bytes wiped from memory on drop.

pub mod bytes;
pub mod key;
pub mod prm;
pub mod secret;

pub use bytes::Bytes;
pub use key::{Ec, EcCurves, Key, Okp, OkpCurves};
pub use prm::{Class, Parameters, Signing};
pub use secret::Secret;

use serde::{Deserialize, Serialize};

use crate::crypto::{Ed25519KeyPair, Error as CryptoError, Generate, KeyMaterial, BYTES_LENGTH_32};

/// A JSON Web Key.
///
/// This type is defined in [RFC7517 Section 4].
///
/// [RFC7517 Section 4]: https://datatracker.ietf.org/doc/html/rfc7517#section-4
#[derive(Serialize, Deserialize, PartialEq, Eq, Debug, Clone)]
pub struct Jwk {
    #[serde(flatten)]
    pub key: Key,

    /// The key parameters.
    #[serde(flatten)]
    pub prm: Parameters,
}

impl Jwk {
    /// Generates a fresh Ed25519 key with both public and private parts.
    pub fn generate_ed25519() -> Result<Self, CryptoError> {
        let keypair = Ed25519KeyPair::new()?;
        Jwk::from_ed25519_keypair(&keypair)
    }

    /// Encodes an Ed25519 key pair, including its secret when present.
    pub fn from_ed25519_keypair(keypair: &Ed25519KeyPair) -> Result<Self, CryptoError> {
        let d = match keypair.secret_key {
            Some(_) => Some(Secret::from(keypair.private_key_bytes()?.to_vec())),
            None => None,
        };

        Ok(Self {
            key: Key::Okp(Okp {
                crv: OkpCurves::Ed25519,
                x: Bytes::from(keypair.public_key_bytes()?.to_vec()),
                d,
            }),
            prm: Parameters::default(),
        })
    }

    /// Checks the structural soundness of the key material.
    ///
    /// Coordinates must have the curve's length, and a private part must match
    /// the public part for the curves the engine can derive.
    pub fn validate(&self) -> Result<(), CryptoError> {
        match &self.key {
            Key::Okp(okp) => {
                if okp.x.len() != BYTES_LENGTH_32 {
                    return Err(CryptoError::InvalidKeyLength);
                }
                if let Some(d) = &okp.d {
                    if d.as_slice().len() != BYTES_LENGTH_32 {
                        return Err(CryptoError::InvalidKeyLength);
                    }
                }
                if okp.crv == OkpCurves::Ed25519 {
                    self.ed25519_keypair()?;
                }
                Ok(())
            }
            Key::Ec(ec) => {
                let len = ec.crv.coordinate_length();
                if ec.x.len() != len || ec.y.len() != len {
                    return Err(CryptoError::InvalidKeyLength);
                }
                match &ec.d {
                    Some(d) if d.as_slice().len() != len => Err(CryptoError::InvalidKeyLength),
                    _ => Ok(()),
                }
            }
        }
    }

    /// Returns `true` if the key carries private material.
    pub fn is_private(&self) -> bool {
        match &self.key {
            Key::Okp(okp) => okp.d.is_some(),
            Key::Ec(ec) => ec.d.is_some(),
        }
    }

    /// Returns a copy without private material.
    pub fn to_public(&self) -> Self {
        let key = match &self.key {
            Key::Okp(okp) => Key::Okp(Okp { d: None, ..okp.clone() }),
            Key::Ec(ec) => Key::Ec(Ec { d: None, ..ec.clone() }),
        };

        Self {
            key,
            prm: self.prm.clone(),
        }
    }

    /// Interprets the key as an Ed25519 key pair.
    ///
    /// Fails with [`CryptoError::InvalidCurve`] for any other key type.
    pub fn ed25519_keypair(&self) -> Result<Ed25519KeyPair, CryptoError> {
        let okp = match &self.key {
            Key::Okp(okp) if okp.crv == OkpCurves::Ed25519 => okp,
            _ => return Err(CryptoError::InvalidCurve),
        };

        let public: [u8; BYTES_LENGTH_32] = okp.x.as_slice().try_into().map_err(|_| CryptoError::InvalidKeyLength)?;

        match &okp.d {
            None => Ed25519KeyPair::from_public_key(&public),
            Some(d) => {
                let secret: [u8; BYTES_LENGTH_32] = d.as_slice().try_into().map_err(|_| CryptoError::InvalidKeyLength)?;
                let keypair = Ed25519KeyPair::from_secret_key(&secret)?;
                if keypair.public_key_bytes()? != public {
                    return Err(CryptoError::InvalidSecretKey);
                }
                Ok(keypair)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_key_serializes_on_a_single_line() {
        let jwk = Jwk::generate_ed25519().unwrap();
        let text = serde_json::to_string(&jwk).unwrap();

        assert!(!text.contains('\n'));
        assert!(text.starts_with(r#"{"kty":"OKP","crv":"Ed25519","x":""#));
        assert!(text.contains(r#""d":""#));

        let parsed: Jwk = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed, jwk);
        assert!(parsed.validate().is_ok());
    }

    #[test]
    fn test_deterministic_key_encoding() {
        let keypair = Ed25519KeyPair::new_with_seed(b"Sample seed bytes of thirtytwo!b").unwrap();
        let jwk = Jwk::from_ed25519_keypair(&keypair).unwrap();

        assert_eq!(
            serde_json::to_string(&jwk).unwrap(),
            r#"{"kty":"OKP","crv":"Ed25519","x":"QSMosCAbcdAUSifQKAV7b99Y0i4PO6rrqlOIFA5Xu70","d":"U2FtcGxlIHNlZWQgYnl0ZXMgb2YgdGhpcnR5dHdvIWI"}"#
        );
    }

    #[test]
    fn test_to_public_strips_secret() {
        let jwk = Jwk::generate_ed25519().unwrap();
        let public = jwk.to_public();

        assert!(jwk.is_private());
        assert!(!public.is_private());
        assert_eq!(
            public.ed25519_keypair().unwrap().public_key_bytes().unwrap(),
            jwk.ed25519_keypair().unwrap().public_key_bytes().unwrap()
        );
    }

    #[test]
    fn test_structurally_invalid_keys() {
        // wrong key type tag
        assert!(serde_json::from_str::<Jwk>(r#"{"kty":"RSA","n":"AQAB","e":"AQAB"}"#).is_err());
        // missing public part
        assert!(serde_json::from_str::<Jwk>(r#"{"kty":"OKP","crv":"Ed25519"}"#).is_err());

        // public part of the wrong length
        let short: Jwk = serde_json::from_str(r#"{"kty":"OKP","crv":"Ed25519","x":"AQID"}"#).unwrap();
        assert_eq!(short.validate(), Err(CryptoError::InvalidKeyLength));

        // private part not matching the public part
        let other = Jwk::generate_ed25519().unwrap();
        let mut mixed = Jwk::generate_ed25519().unwrap();
        if let (Key::Okp(mixed), Key::Okp(other)) = (&mut mixed.key, &other.key) {
            mixed.x = other.x.clone();
        }
        assert_eq!(mixed.validate(), Err(CryptoError::InvalidSecretKey));
    }

    #[test]
    fn test_non_ed25519_keys_are_rejected_for_signing() {
        let jwk: Jwk = serde_json::from_str(
            r#"{"kty":"OKP","crv":"X25519","x":"L-V9o0fNYkMVKNqsX7spBzD_9oSvxM_C7ZCZX1jLO3Q"}"#,
        )
        .unwrap();

        assert!(jwk.validate().is_ok());
        assert_eq!(jwk.ed25519_keypair().unwrap_err(), CryptoError::InvalidCurve);
    }
}
