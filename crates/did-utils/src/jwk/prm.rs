use std::fmt;

use serde::{Deserialize, Serialize};

/// JWK parameters unrelated to the key implementation
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameters {
    /// The algorithm used with this key.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub alg: Option<Signing>,

    /// The key identifier.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub kid: Option<String>,

    /// The key class (called `use` in the RFC).
    #[serde(skip_serializing_if = "Option::is_none", default, rename = "use")]
    pub cls: Option<Class>,
}

/// Key Class (i.e. `use` in the RFC)
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum Class {
    #[serde(rename = "enc")]
    Encryption,

    #[serde(rename = "sig")]
    Signing,
}

/// Algorithms used for signing, as defined in [RFC7518] section 3.1.
///
/// [RFC7518]: https://www.rfc-editor.org/rfc/rfc7518
#[non_exhaustive]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Signing {
    /// EdDSA signature algorithms
    #[serde(rename = "EdDSA")]
    EdDsa,

    /// ECDSA using P-256 and SHA-256
    Es256,

    /// ECDSA using secp256k1 curve and SHA-256
    Es256K,

    /// ECDSA using P-384 and SHA-384
    Es384,
}

impl fmt::Display for Signing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.serialize(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signing_algs() {
        use Signing::*;

        let input = vec![EdDsa, Es256, Es256K, Es384];
        let ser = serde_json::to_string(&input).unwrap();

        assert_eq!(ser, r#"["EdDSA","ES256","ES256K","ES384"]"#);
        assert_eq!(serde_json::from_str::<Vec<Signing>>(&ser).unwrap(), input);
    }

    #[test]
    fn signing_display_matches_header_value() {
        assert_eq!(Signing::EdDsa.to_string(), "EdDSA");
    }
}
