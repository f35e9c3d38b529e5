//! BIP-322 proof verification for single-key P2WPKH and P2TR addresses.
//!
//! Verification needs only the address, the message and the proof. Any
//! structural problem is reported as [`Bip322Error::MalformedProof`]; a
//! well-formed proof whose signature does not check out is
//! [`Bip322Error::SignatureVerificationFailed`].

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use bitcoin::consensus::encode::deserialize;
use bitcoin::hashes::Hash;
use bitcoin::secp256k1::{Message, PublicKey, Secp256k1, XOnlyPublicKey};
use bitcoin::sighash::{Prevouts, SighashCache};
use bitcoin::{
    ecdsa, taproot, Address, CompressedPublicKey, EcdsaSighashType, ScriptBuf, TapSighashType,
    Transaction, Witness,
};
use log::debug;
use ownproof_core::{ProofFormat, ScriptType};

use crate::bip322::{to_sign, to_spend};
use crate::types::{Bip322Error, Proof};

/// Verify `proof` over `message` for `address`.
///
/// Returns `Ok(())` only for a complete, valid proof.
pub fn verify_bip322(
    address: &Address,
    message: &str,
    proof: &str,
    format: ProofFormat,
) -> Result<(), Bip322Error> {
    let script_type = ScriptType::of_address(address)?;
    let script_pubkey = address.script_pubkey();

    let to_spend = to_spend(&script_pubkey, message.as_bytes());
    let expected = to_sign(&to_spend);

    let bytes = BASE64
        .decode(proof.trim())
        .map_err(|e| malformed(format!("invalid base64: {e}")))?;

    let to_sign = match format {
        ProofFormat::Simple => {
            let witness: Witness =
                deserialize(&bytes).map_err(|e| malformed(format!("invalid witness: {e}")))?;
            let mut tx = expected;
            tx.input[0].witness = witness;
            tx
        }
        ProofFormat::Full => {
            let tx: Transaction =
                deserialize(&bytes).map_err(|e| malformed(format!("invalid transaction: {e}")))?;
            check_to_sign_shape(&tx, &expected)?;
            tx
        }
    };
    debug!(
        "verifying BIP-322 {} proof for {} address, to_sign {}",
        format,
        script_type,
        to_sign.compute_txid()
    );

    match script_type {
        ScriptType::SegwitV0 => verify_p2wpkh(&script_pubkey, &to_spend, &to_sign),
        ScriptType::Taproot => verify_p2tr(&script_pubkey, &to_spend, &to_sign),
    }
}

/// [`verify_bip322`] for a [`Proof`] returned by the signer.
pub fn verify_proof(address: &Address, message: &str, proof: &Proof) -> Result<(), Bip322Error> {
    verify_bip322(address, message, proof.as_str(), proof.format())
}

// A full proof must be exactly `to_sign` apart from its witness.
fn check_to_sign_shape(tx: &Transaction, expected: &Transaction) -> Result<(), Bip322Error> {
    if tx.input.len() != 1 {
        return Err(malformed(format!("expected 1 input, found {}", tx.input.len())));
    }
    if tx.output.len() != 1 {
        return Err(malformed(format!("expected 1 output, found {}", tx.output.len())));
    }
    if tx.input[0].previous_output != expected.input[0].previous_output {
        return Err(malformed("input does not spend to_spend:0"));
    }
    if tx.output[0] != expected.output[0] {
        return Err(malformed("output is not a zero-value OP_RETURN"));
    }
    if tx.version != expected.version
        || tx.lock_time != expected.lock_time
        || tx.input[0].sequence != expected.input[0].sequence
        || !tx.input[0].script_sig.is_empty()
    {
        return Err(malformed("to_sign header fields do not match"));
    }
    Ok(())
}

fn verify_p2wpkh(
    script_pubkey: &ScriptBuf,
    to_spend: &Transaction,
    to_sign: &Transaction,
) -> Result<(), Bip322Error> {
    let witness = &to_sign.input[0].witness;
    if witness.len() != 2 {
        return Err(malformed(format!(
            "P2WPKH witness must have 2 items, found {}",
            witness.len()
        )));
    }
    let (sig_bytes, key_bytes) = match (witness.nth(0), witness.nth(1)) {
        (Some(sig), Some(key)) => (sig, key),
        _ => return Err(malformed("P2WPKH witness is truncated")),
    };

    let signature = ecdsa::Signature::from_slice(sig_bytes)
        .map_err(|e| malformed(format!("invalid ECDSA signature: {e}")))?;
    if signature.sighash_type != EcdsaSighashType::All {
        return Err(malformed(format!(
            "unsupported sighash type {}",
            signature.sighash_type
        )));
    }
    if key_bytes.len() != 33 {
        return Err(malformed("witness public key must be compressed"));
    }
    let public_key = PublicKey::from_slice(key_bytes)
        .map_err(|e| malformed(format!("invalid public key: {e}")))?;

    // The witness key must hash to the address program.
    if ScriptBuf::new_p2wpkh(&CompressedPublicKey(public_key).wpubkey_hash()) != *script_pubkey {
        return Err(Bip322Error::SignatureVerificationFailed);
    }

    let spent = &to_spend.output[0];
    let sighash = SighashCache::new(to_sign)
        .p2wpkh_signature_hash(0, &spent.script_pubkey, spent.value, signature.sighash_type)
        .map_err(|e| Bip322Error::Sighash(e.to_string()))?;
    let msg = Message::from_digest(sighash.to_byte_array());

    Secp256k1::verification_only()
        .verify_ecdsa(&msg, &signature.signature, &public_key)
        .map_err(|_| Bip322Error::SignatureVerificationFailed)
}

fn verify_p2tr(
    script_pubkey: &ScriptBuf,
    to_spend: &Transaction,
    to_sign: &Transaction,
) -> Result<(), Bip322Error> {
    let witness = &to_sign.input[0].witness;
    if witness.len() != 1 {
        return Err(malformed(format!(
            "P2TR key-path witness must have 1 item, found {}",
            witness.len()
        )));
    }
    let sig_bytes = witness
        .nth(0)
        .ok_or_else(|| malformed("P2TR witness is truncated"))?;

    // 65-byte signatures must carry an explicit, non-default sighash byte.
    if sig_bytes.len() == 65 && sig_bytes[64] == 0x00 {
        return Err(malformed("explicit SIGHASH_DEFAULT byte"));
    }
    let signature = taproot::Signature::from_slice(sig_bytes)
        .map_err(|e| malformed(format!("invalid Schnorr signature: {e}")))?;
    if !matches!(
        signature.sighash_type,
        TapSighashType::Default | TapSighashType::All
    ) {
        return Err(malformed(format!(
            "unsupported sighash type {}",
            signature.sighash_type
        )));
    }

    // OP_1 PUSH32 <output key>
    let output_key = XOnlyPublicKey::from_slice(&script_pubkey.as_bytes()[2..])
        .map_err(|e| malformed(format!("invalid taproot output key: {e}")))?;

    let sighash = SighashCache::new(to_sign)
        .taproot_key_spend_signature_hash(
            0,
            &Prevouts::All(&to_spend.output),
            signature.sighash_type,
        )
        .map_err(|e| Bip322Error::Sighash(e.to_string()))?;
    let msg = Message::from_digest(sighash.to_byte_array());

    Secp256k1::verification_only()
        .verify_schnorr(&signature.signature, &msg, &output_key)
        .map_err(|_| Bip322Error::SignatureVerificationFailed)
}

fn malformed(reason: impl Into<String>) -> Bip322Error {
    Bip322Error::MalformedProof(reason.into())
}
