//! BIP-322 virtual transactions
//!
//! A proof is a signature on `to_sign`, a transaction that spends the single
//! output of `to_spend`. Neither transaction is valid on chain: `to_spend`
//! spends a null outpoint and `to_sign` pays to an unspendable `OP_RETURN`.
//!
//! ```text
//! to_spend: in  0000…0000:0xFFFFFFFF  scriptSig = OP_0 PUSH32 message_hash
//!           out 0 sat -> address scriptPubKey
//! to_sign:  in  to_spend:0            witness = proof
//!           out 0 sat -> OP_RETURN
//! ```

use bitcoin::absolute::LockTime;
use bitcoin::hashes::{sha256, Hash, HashEngine};
use bitcoin::opcodes::all::OP_RETURN;
use bitcoin::opcodes::OP_0;
use bitcoin::script::Builder;
use bitcoin::transaction::Version;
use bitcoin::{
    Amount, OutPoint, Script, ScriptBuf, Sequence, Transaction, TxIn, TxOut, Txid, Witness,
};
use log::debug;

/// Tag for the message hash.
pub const MESSAGE_TAG: &[u8] = b"BIP0322-signed-message";

/// BIP-340 tagged hash: `SHA256(SHA256(tag) || SHA256(tag) || data)`.
pub fn tagged_hash(tag: &[u8], data: &[u8]) -> sha256::Hash {
    let tag_hash = sha256::Hash::hash(tag);
    let mut engine = sha256::Hash::engine();
    engine.input(tag_hash.as_byte_array());
    engine.input(tag_hash.as_byte_array());
    engine.input(data);
    sha256::Hash::from_engine(engine)
}

/// Tagged hash of the raw message bytes. The message is never pre-hashed.
pub fn message_hash(message: &[u8]) -> [u8; 32] {
    tagged_hash(MESSAGE_TAG, message).to_byte_array()
}

/// Build the `to_spend` transaction committing to `message` and `script_pubkey`.
pub fn to_spend(script_pubkey: &Script, message: &[u8]) -> Transaction {
    let script_sig = Builder::new()
        .push_opcode(OP_0)
        .push_slice(message_hash(message))
        .into_script();

    let tx = Transaction {
        version: Version(0),
        lock_time: LockTime::ZERO,
        input: vec![TxIn {
            previous_output: OutPoint {
                txid: Txid::all_zeros(),
                vout: 0xFFFF_FFFF,
            },
            script_sig,
            sequence: Sequence::ZERO,
            witness: Witness::new(),
        }],
        output: vec![TxOut {
            value: Amount::ZERO,
            script_pubkey: script_pubkey.to_owned(),
        }],
    };
    debug!("built to_spend {}", tx.compute_txid());
    tx
}

/// Build the unsigned `to_sign` transaction spending output 0 of `to_spend`.
pub fn to_sign(to_spend: &Transaction) -> Transaction {
    Transaction {
        version: Version(0),
        lock_time: LockTime::ZERO,
        input: vec![TxIn {
            previous_output: OutPoint {
                txid: to_spend.compute_txid(),
                vout: 0,
            },
            script_sig: ScriptBuf::new(),
            sequence: Sequence::ZERO,
            witness: Witness::new(),
        }],
        output: vec![TxOut {
            value: Amount::ZERO,
            script_pubkey: op_return_script(),
        }],
    }
}

/// A bare `OP_RETURN` with no data push.
pub fn op_return_script() -> ScriptBuf {
    Builder::new().push_opcode(OP_RETURN).into_script()
}
