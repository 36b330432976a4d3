//! Signed-message wallet authorization
//!
//! Holders authorize check-ins and claims by signing a short text with
//! their wallet key. The wallet address doubles as the ed25519 public key,
//! so verification needs nothing but the request itself.

use ed25519_dalek::{Signature as Ed25519Signature, Verifier, VerifyingKey};
use sigil_core::WalletId;

/// Verify an ed25519 signature over a UTF-8 message.
///
/// `signature_b58` is the base58-encoded 64-byte detached signature. Any
/// undecodable input (wrong base58, wrong length, off-curve key) verifies
/// as `false`; malformed requests and forged requests are indistinguishable
/// on purpose.
pub fn verify_wallet_signature(wallet: &WalletId, message: &str, signature_b58: &str) -> bool {
    let Some(public_bytes) = decode_fixed::<32>(wallet.as_str()) else {
        return false;
    };
    let Ok(verifying_key) = VerifyingKey::from_bytes(&public_bytes) else {
        return false;
    };
    let Some(signature_bytes) = decode_fixed::<64>(signature_b58) else {
        return false;
    };

    let signature = Ed25519Signature::from_bytes(&signature_bytes);
    verifying_key.verify(message.as_bytes(), &signature).is_ok()
}

/// Base58-decode into an exact-size array
pub(crate) fn decode_fixed<const N: usize>(encoded: &str) -> Option<[u8; N]> {
    let bytes = bs58::decode(encoded).into_vec().ok()?;
    bytes.try_into().ok()
}
