//! JSON-RPC chain client
//!
//! Speaks the cluster's HTTP JSON-RPC:
//!
//! | Method | Used for |
//! |--------|----------|
//! | `getLatestBlockhash` | transfer construction |
//! | `sendTransaction` | transfer submission (base64 wire) |
//! | `getSignatureStatuses` | confirmation polling |
//! | `getTransaction` | resolving a payment's fee payer |
//! | `getTokenAccountsByOwner` | holder eligibility |
//!
//! Response parsing is split into free functions so the shapes are testable
//! without a network.

use crate::client::{ChainClient, TxStatus};
use crate::keypair::DisburserKey;
use crate::tx::build_transfer;
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde_json::{json, Value};
use sigil_core::{Result, SigilError, TxSignature, WalletId};
use tracing::debug;

/// SPL token program address; eligibility tokens are accounts under it
pub const TOKEN_PROGRAM_ID: &str = "TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA";

/// [`ChainClient`] over HTTP JSON-RPC
pub struct RpcChainClient {
    http: reqwest::Client,
    rpc_url: String,
    disburser: DisburserKey,
}

impl RpcChainClient {
    pub fn new(rpc_url: impl Into<String>, disburser: DisburserKey) -> Self {
        Self {
            http: reqwest::Client::new(),
            rpc_url: rpc_url.into(),
            disburser,
        }
    }

    /// Wallet address payouts are funded from
    pub fn disburser_wallet(&self) -> WalletId {
        self.disburser.wallet()
    }

    async fn rpc_call(&self, method: &str, params: Value) -> Result<Value> {
        let body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params,
        });

        let response = self
            .http
            .post(&self.rpc_url)
            .json(&body)
            .send()
            .await
            .map_err(|e| SigilError::Chain(format!("{method}: {e}")))?;

        let payload: Value = response
            .json()
            .await
            .map_err(|e| SigilError::Chain(format!("{method}: malformed response: {e}")))?;

        if let Some(error) = payload.get("error") {
            return Err(SigilError::Chain(format!("{method}: {error}")));
        }
        Ok(payload.get("result").cloned().unwrap_or(Value::Null))
    }

    async fn latest_blockhash(&self) -> Result<String> {
        let result = self
            .rpc_call("getLatestBlockhash", json!([{"commitment": "confirmed"}]))
            .await?;
        result
            .pointer("/value/blockhash")
            .and_then(Value::as_str)
            .map(str::to_owned)
            .ok_or_else(|| SigilError::Chain("getLatestBlockhash: no blockhash in response".into()))
    }
}

#[async_trait]
impl ChainClient for RpcChainClient {
    async fn transfer(&self, to: &WalletId, lamports: u64) -> Result<TxSignature> {
        let blockhash = self.latest_blockhash().await?;
        let tx = build_transfer(&self.disburser, to, lamports, &blockhash)?;
        let encoded = BASE64.encode(&tx);

        let result = self
            .rpc_call("sendTransaction", json!([encoded, {"encoding": "base64"}]))
            .await?;
        let signature = result
            .as_str()
            .ok_or_else(|| SigilError::Chain("sendTransaction: no signature in response".into()))?;

        debug!(to = %to.short(), lamports, tx = %signature, "transfer submitted");
        Ok(TxSignature::new(signature))
    }

    async fn transaction_status(&self, signature: &TxSignature) -> Result<TxStatus> {
        let result = self
            .rpc_call(
                "getSignatureStatuses",
                json!([[signature.as_str()], {"searchTransactionHistory": true}]),
            )
            .await?;
        Ok(parse_signature_status(&result))
    }

    async fn transaction_payer(&self, signature: &TxSignature) -> Result<Option<WalletId>> {
        let result = self
            .rpc_call(
                "getTransaction",
                json!([
                    signature.as_str(),
                    {"encoding": "json", "maxSupportedTransactionVersion": 0}
                ]),
            )
            .await?;
        Ok(parse_transaction_payer(&result))
    }

    async fn holds_eligibility_token(&self, wallet: &WalletId) -> Result<bool> {
        let result = self
            .rpc_call(
                "getTokenAccountsByOwner",
                json!([
                    wallet.as_str(),
                    {"programId": TOKEN_PROGRAM_ID},
                    {"encoding": "jsonParsed"}
                ]),
            )
            .await?;
        Ok(parse_holds_token(&result))
    }
}

/// Interpret a `getSignatureStatuses` result for a single signature
fn parse_signature_status(result: &Value) -> TxStatus {
    let Some(status) = result.pointer("/value/0").filter(|v| !v.is_null()) else {
        return TxStatus::Pending;
    };

    if let Some(err) = status.get("err").filter(|v| !v.is_null()) {
        return TxStatus::Failed(err.to_string());
    }

    match status.get("confirmationStatus").and_then(Value::as_str) {
        Some("confirmed") | Some("finalized") => TxStatus::Confirmed,
        _ => TxStatus::Pending,
    }
}

/// Fee payer is the first account key of the message
fn parse_transaction_payer(result: &Value) -> Option<WalletId> {
    result
        .pointer("/transaction/message/accountKeys/0")
        .and_then(|key| {
            // jsonParsed wraps keys in objects; plain json is a string array
            key.as_str()
                .or_else(|| key.pointer("/pubkey").and_then(Value::as_str))
        })
        .map(WalletId::new)
}

/// A qualifying token account holds exactly one unit of a 0-decimal mint
fn parse_holds_token(result: &Value) -> bool {
    let Some(accounts) = result.pointer("/value").and_then(Value::as_array) else {
        return false;
    };
    accounts.iter().any(|account| {
        let amount = account.pointer("/account/data/parsed/info/tokenAmount");
        let Some(amount) = amount else { return false };
        amount.get("amount").and_then(Value::as_str) == Some("1")
            && amount.get("decimals").and_then(Value::as_u64) == Some(0)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_status_missing_is_pending() {
        let result = json!({"context": {"slot": 1}, "value": [null]});
        assert_eq!(parse_signature_status(&result), TxStatus::Pending);
    }

    #[test]
    fn test_parse_status_confirmed_and_finalized() {
        for level in ["confirmed", "finalized"] {
            let result = json!({"value": [{"err": null, "confirmationStatus": level}]});
            assert_eq!(parse_signature_status(&result), TxStatus::Confirmed);
        }
    }

    #[test]
    fn test_parse_status_processed_is_pending() {
        let result = json!({"value": [{"err": null, "confirmationStatus": "processed"}]});
        assert_eq!(parse_signature_status(&result), TxStatus::Pending);
    }

    #[test]
    fn test_parse_status_error_is_failed() {
        let result = json!({"value": [{
            "err": {"InstructionError": [0, {"Custom": 1}]},
            "confirmationStatus": "confirmed"
        }]});
        match parse_signature_status(&result) {
            TxStatus::Failed(reason) => assert!(reason.contains("InstructionError")),
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_payer_from_json_encoding() {
        let result = json!({
            "transaction": {"message": {"accountKeys": [
                "4Nd1mYbcFQTUVhCkGGTnkSqvg2Bp8PGoLCoM1yTDsHFu",
                "11111111111111111111111111111111"
            ]}}
        });
        assert_eq!(
            parse_transaction_payer(&result),
            Some(WalletId::new("4Nd1mYbcFQTUVhCkGGTnkSqvg2Bp8PGoLCoM1yTDsHFu"))
        );
    }

    #[test]
    fn test_parse_payer_from_parsed_encoding() {
        let result = json!({
            "transaction": {"message": {"accountKeys": [
                {"pubkey": "Payer1111111111111111111111111111111111111", "signer": true}
            ]}}
        });
        assert_eq!(
            parse_transaction_payer(&result),
            Some(WalletId::new("Payer1111111111111111111111111111111111111"))
        );
    }

    #[test]
    fn test_parse_payer_unknown_tx() {
        assert_eq!(parse_transaction_payer(&Value::Null), None);
    }

    #[test]
    fn test_parse_token_eligibility() {
        let holder = json!({"value": [{
            "account": {"data": {"parsed": {"info": {
                "tokenAmount": {"amount": "1", "decimals": 0, "uiAmount": 1.0}
            }}}}
        }]});
        assert!(parse_holds_token(&holder));

        // fungible balance does not qualify
        let fungible = json!({"value": [{
            "account": {"data": {"parsed": {"info": {
                "tokenAmount": {"amount": "250000", "decimals": 6, "uiAmount": 0.25}
            }}}}
        }]});
        assert!(!parse_holds_token(&fungible));

        // emptied token account does not qualify
        let emptied = json!({"value": [{
            "account": {"data": {"parsed": {"info": {
                "tokenAmount": {"amount": "0", "decimals": 0, "uiAmount": 0.0}
            }}}}
        }]});
        assert!(!parse_holds_token(&emptied));

        assert!(!parse_holds_token(&json!({"value": []})));
    }
}
