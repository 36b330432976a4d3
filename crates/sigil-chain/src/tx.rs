//! Native transfer transaction encoding
//!
//! Builds the one transaction shape this service ever submits: a legacy
//! message moving lamports from the disburser to a holder through the
//! system program. Layout, with every array length as a compact-u16:
//!
//! ```text
//! [signature count][64-byte signature]
//! [header: 1 required signature, 0 readonly signed, 1 readonly unsigned]
//! [account keys: payer, recipient, system program]
//! [recent blockhash (32 bytes)]
//! [instructions: 1]
//!   [program index][account indexes: from, to][data: u32 LE 2, u64 LE lamports]
//! ```

use crate::keypair::DisburserKey;
use crate::signature::decode_fixed;
use sigil_core::{Result, SigilError, WalletId};

/// The system program lives at the all-zero address
pub const SYSTEM_PROGRAM_ID: [u8; 32] = [0u8; 32];

/// System program instruction index for a native transfer
const TRANSFER_INSTRUCTION: u32 = 2;

/// Build and sign a transfer transaction, ready to submit.
///
/// `recent_blockhash` is base58 from `getLatestBlockhash`; a transaction
/// built on an expired blockhash is dropped by the cluster, which the
/// confirmation poll then reports as a timeout.
pub fn build_transfer(
    payer: &DisburserKey,
    recipient: &WalletId,
    lamports: u64,
    recent_blockhash: &str,
) -> Result<Vec<u8>> {
    let recipient_key = decode_fixed::<32>(recipient.as_str())
        .ok_or_else(|| SigilError::InvalidInput(format!("recipient is not a valid address: {recipient}")))?;
    let blockhash = decode_fixed::<32>(recent_blockhash)
        .ok_or_else(|| SigilError::Chain("malformed recent blockhash from RPC".into()))?;

    let message = compile_message(&payer.public_bytes(), &recipient_key, lamports, &blockhash);
    let signature = payer.sign(&message);

    let mut tx = Vec::with_capacity(1 + 64 + message.len());
    push_compact_len(&mut tx, 1);
    tx.extend_from_slice(&signature);
    tx.extend_from_slice(&message);
    Ok(tx)
}

/// The signed portion of the transaction
fn compile_message(
    payer: &[u8; 32],
    recipient: &[u8; 32],
    lamports: u64,
    blockhash: &[u8; 32],
) -> Vec<u8> {
    // Account keys are deduplicated, so a self-transfer collapses the
    // recipient onto the payer entry.
    let (keys, to_index): (Vec<&[u8; 32]>, u8) = if recipient == payer {
        (vec![payer, &SYSTEM_PROGRAM_ID], 0)
    } else {
        (vec![payer, recipient, &SYSTEM_PROGRAM_ID], 1)
    };
    let program_index = (keys.len() - 1) as u8;

    let mut message = Vec::with_capacity(3 + 1 + keys.len() * 32 + 32 + 16);

    // Header: the payer signs; the program account is readonly.
    message.push(1);
    message.push(0);
    message.push(1);

    push_compact_len(&mut message, keys.len() as u16);
    for key in keys {
        message.extend_from_slice(key);
    }

    message.extend_from_slice(blockhash);

    // One instruction: system program transfer.
    push_compact_len(&mut message, 1);
    message.push(program_index);
    push_compact_len(&mut message, 2);
    message.push(0);
    message.push(to_index);

    let mut data = Vec::with_capacity(12);
    data.extend_from_slice(&TRANSFER_INSTRUCTION.to_le_bytes());
    data.extend_from_slice(&lamports.to_le_bytes());
    push_compact_len(&mut message, data.len() as u16);
    message.extend_from_slice(&data);

    message
}

/// Compact-u16 length prefix: 7 bits per byte, high bit marks continuation
fn push_compact_len(out: &mut Vec<u8>, mut len: u16) {
    loop {
        let mut byte = (len & 0x7f) as u8;
        len >>= 7;
        if len != 0 {
            byte |= 0x80;
        }
        out.push(byte);
        if len == 0 {
            break;
        }
    }
}
