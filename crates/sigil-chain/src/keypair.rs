//! The disburser keypair
//!
//! The disburser is the service wallet that funds reward payouts. Its
//! secret rides in configuration base58-encoded, either as a 64-byte
//! keypair (seed followed by public key, the chain tooling's export
//! format) or as a bare 32-byte seed.

use ed25519_dalek::{Signer, SigningKey};
use rand::rngs::OsRng;
use rand::RngCore;
use sigil_core::{Result, SigilError, WalletId};

/// Ed25519 keypair for the payout wallet
pub struct DisburserKey {
    signing_key: SigningKey,
}

impl DisburserKey {
    /// Generate a fresh random keypair
    pub fn generate() -> Self {
        let mut seed = [0u8; 32];
        OsRng.fill_bytes(&mut seed);
        Self {
            signing_key: SigningKey::from_bytes(&seed),
        }
    }

    /// Parse from base58. Accepts a 64-byte keypair or a 32-byte seed.
    pub fn from_base58(encoded: &str) -> Result<Self> {
        let bytes = bs58::decode(encoded)
            .into_vec()
            .map_err(|e| SigilError::InvalidInput(format!("disburser key is not base58: {e}")))?;

        let seed: [u8; 32] = match bytes.len() {
            32 => bytes
                .try_into()
                .map_err(|_| SigilError::InvalidInput("disburser key malformed".into()))?,
            64 => {
                let seed: [u8; 32] = bytes[..32]
                    .try_into()
                    .map_err(|_| SigilError::InvalidInput("disburser key malformed".into()))?;
                let public: [u8; 32] = bytes[32..]
                    .try_into()
                    .map_err(|_| SigilError::InvalidInput("disburser key malformed".into()))?;
                if SigningKey::from_bytes(&seed).verifying_key().to_bytes() != public {
                    return Err(SigilError::InvalidInput(
                        "disburser keypair public half does not match seed".into(),
                    ));
                }
                seed
            }
            n => {
                return Err(SigilError::InvalidInput(format!(
                    "disburser key must decode to 32 or 64 bytes, got {n}"
                )))
            }
        };

        Ok(Self {
            signing_key: SigningKey::from_bytes(&seed),
        })
    }

    /// Base58 of the 64-byte keypair form
    pub fn to_base58(&self) -> String {
        let mut bytes = [0u8; 64];
        bytes[..32].copy_from_slice(&self.signing_key.to_bytes());
        bytes[32..].copy_from_slice(&self.signing_key.verifying_key().to_bytes());
        bs58::encode(bytes).into_string()
    }

    pub fn public_bytes(&self) -> [u8; 32] {
        self.signing_key.verifying_key().to_bytes()
    }

    /// The disburser's wallet address
    pub fn wallet(&self) -> WalletId {
        WalletId::new(bs58::encode(self.public_bytes()).into_string())
    }

    pub fn sign(&self, message: &[u8]) -> [u8; 64] {
        self.signing_key.sign(message).to_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base58_roundtrip() {
        let key = DisburserKey::generate();
        let restored = DisburserKey::from_base58(&key.to_base58()).unwrap();
        assert_eq!(restored.public_bytes(), key.public_bytes());
    }

    #[test]
    fn test_seed_only_form() {
        let key = DisburserKey::generate();
        let seed_b58 = bs58::encode(key.signing_key.to_bytes()).into_string();
        let restored = DisburserKey::from_base58(&seed_b58).unwrap();
        assert_eq!(restored.wallet(), key.wallet());
    }

    #[test]
    fn test_mismatched_public_half_rejected() {
        let key = DisburserKey::generate();
        let other = DisburserKey::generate();
        let mut bytes = [0u8; 64];
        bytes[..32].copy_from_slice(&key.signing_key.to_bytes());
        bytes[32..].copy_from_slice(&other.public_bytes());

        let encoded = bs58::encode(bytes).into_string();
        assert!(DisburserKey::from_base58(&encoded).is_err());
    }

    #[test]
    fn test_bad_lengths_rejected() {
        assert!(DisburserKey::from_base58("abc").is_err());
        assert!(DisburserKey::from_base58("not base58 0OIl").is_err());
    }
}
