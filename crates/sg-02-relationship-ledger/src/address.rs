//! # Ledger Addresses
//!
//! A ledger's address is a pure function of its deployer, kind and subject,
//! so the address a subject will receive is known before deployment.

use crate::ledger::LedgerKind;
use sha3::{Digest, Keccak256};
use shared_types::{Address, Subject};

/// Computes the address of the ledger `deployer` creates for `subject`.
///
/// Address = keccak256(0xff ++ deployer ++ kind ++ subject)\[12:\]
#[must_use]
pub fn derive_ledger_address(deployer: Address, kind: LedgerKind, subject: &Subject) -> Address {
    let encoded = subject.encode();
    let mut data = Vec::with_capacity(22 + encoded.len());
    data.push(0xff);
    data.extend_from_slice(deployer.as_bytes());
    data.push(kind.tag());
    data.extend_from_slice(&encoded);

    let hash = Keccak256::digest(&data);
    let mut out = [0u8; 20];
    out.copy_from_slice(&hash[12..]);
    Address::new(out)
}
