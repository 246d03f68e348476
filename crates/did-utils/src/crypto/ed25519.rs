use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};

use super::{
    errors::Error,
    traits::{CoreSign, Generate, KeyMaterial, BYTES_LENGTH_32},
    utils::seed_or_random,
    AsymmetricKey,
};

pub type Ed25519KeyPair = AsymmetricKey<VerifyingKey, SigningKey>;

impl std::fmt::Debug for Ed25519KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_fmt(format_args!("{:?}", self.public_key))
    }
}

impl KeyMaterial for Ed25519KeyPair {
    fn public_key_bytes(&self) -> Result<[u8; BYTES_LENGTH_32], Error> {
        Ok(self.public_key.to_bytes())
    }

    fn private_key_bytes(&self) -> Result<[u8; BYTES_LENGTH_32], Error> {
        match &self.secret_key {
            Some(sk) => Ok(sk.to_bytes()),
            None => Err(Error::InvalidSecretKey),
        }
    }
}

impl Generate for Ed25519KeyPair {
    fn new() -> Result<Ed25519KeyPair, Error> {
        Self::new_with_seed(&[])
    }

    fn new_with_seed(seed: &[u8]) -> Result<Ed25519KeyPair, Error> {
        let secret_seed = seed_or_random(seed)?;
        Self::from_secret_key(&secret_seed)
    }

    fn from_public_key(public_key: &[u8; BYTES_LENGTH_32]) -> Result<Ed25519KeyPair, Error> {
        let public_key = VerifyingKey::from_bytes(public_key).map_err(|_| Error::InvalidPublicKey)?;

        Ok(Ed25519KeyPair {
            public_key,
            secret_key: None,
        })
    }

    fn from_secret_key(secret_key: &[u8; BYTES_LENGTH_32]) -> Result<Ed25519KeyPair, Error> {
        let sk = SigningKey::from_bytes(secret_key);

        Ok(Ed25519KeyPair {
            public_key: sk.verifying_key(),
            secret_key: Some(sk),
        })
    }
}

impl CoreSign for Ed25519KeyPair {
    fn sign(&self, payload: &[u8]) -> Result<Vec<u8>, Error> {
        let sk = self.secret_key.as_ref().ok_or(Error::InvalidSecretKey)?;
        let signature = sk.try_sign(payload).map_err(|_| Error::SigningFailed)?;

        Ok(signature.to_bytes().to_vec())
    }

    fn verify(&self, payload: &[u8], signature: &[u8]) -> Result<(), Error> {
        let sig = Signature::from_slice(signature).map_err(|_| Error::MalformedSignature)?;

        self.public_key
            .verify(payload, &sig)
            .map_err(|_| Error::SignatureMismatch)
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;

    // A new Ed25519KeyPair exposes 32-byte private and public key material.
    #[test]
    fn test_new() {
        let keypair = Ed25519KeyPair::new().unwrap();
        assert_eq!(keypair.public_key_bytes().unwrap().len(), BYTES_LENGTH_32);
        assert_eq!(keypair.private_key_bytes().unwrap().len(), BYTES_LENGTH_32);
    }

    // A 32-byte seed produces a deterministic key pair.
    #[test]
    fn test_new_with_seed() {
        let seed = b"Sample seed bytes of thirtytwo!b";
        let keypair = Ed25519KeyPair::new_with_seed(seed).unwrap();
        let pub_key_hex = hex::encode(keypair.public_key_bytes().unwrap());
        let pri_key_hex = hex::encode(keypair.private_key_bytes().unwrap());
        assert_eq!(pub_key_hex, "412328b0201b71d0144a27d028057b6fdf58d22e0f3baaebaa5388140e57bbbd");
        assert_eq!(pri_key_hex, "53616d706c652073656564206279746573206f662074686972747974776f2162");
    }

    #[test]
    fn test_sign_verify() {
        let keypair = Ed25519KeyPair::new().unwrap();
        let payload = br#"{"name":"Alice","age":101}"#;

        let signature = keypair.sign(payload).unwrap();
        assert!(keypair.verify(payload, &signature).is_ok());

        let mut tampered = payload.to_vec();
        tampered[3] ^= 0x01;
        assert_eq!(keypair.verify(&tampered, &signature), Err(Error::SignatureMismatch));
    }

    // A public-only key pair can verify but not sign.
    #[test]
    fn test_public_only_keypair() {
        let signer = Ed25519KeyPair::new().unwrap();
        let signature = signer.sign(b"payload").unwrap();

        let verifier = Ed25519KeyPair::from_public_key(&signer.public_key_bytes().unwrap()).unwrap();
        assert!(verifier.verify(b"payload", &signature).is_ok());
        assert_eq!(verifier.sign(b"payload"), Err(Error::InvalidSecretKey));
        assert_eq!(verifier.private_key_bytes(), Err(Error::InvalidSecretKey));
    }

    #[test]
    fn test_verify_rejects_malformed_signature() {
        let keypair = Ed25519KeyPair::new().unwrap();
        assert_eq!(keypair.verify(b"payload", &[0u8; 12]), Err(Error::MalformedSignature));
    }
}
