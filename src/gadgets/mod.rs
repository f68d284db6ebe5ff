//! Constraint-level gadgets.
//!
//! Composition is a strict DAG: [`crate::bits`] feeds [`aes128`] and
//! [`sha256`]; [`sha256`] feeds [`hmac`] and [`kdc`]; [`aes128`] feeds
//! [`gcm`], [`authtag`] and [`record`]; [`oracle`] wires the KDF, auth-tag
//! and record predicates into the end-to-end circuit.

pub mod aes128;
pub mod authtag;
pub mod comparator;
pub mod gcm;
pub mod hmac;
pub mod hmac_mimc;
pub mod kdc;
pub mod mimc;
pub mod oracle;
pub mod record;
pub mod sha256;
pub mod str2int;

use ark_bn254::Fr as BnFr;
use ark_r1cs_std::{alloc::AllocVar, fields::fp::FpVar};
use ark_relations::r1cs::{ConstraintSystemRef, SynthesisError};

/// Allocates one public input per byte, in slice order.
pub(crate) fn alloc_public_bytes(
    cs: ConstraintSystemRef<BnFr>,
    bytes: &[u8],
) -> Result<Vec<FpVar<BnFr>>, SynthesisError> {
    bytes
        .iter()
        .map(|&b| FpVar::new_input(cs.clone(), || Ok(BnFr::from(b as u64))))
        .collect()
}

/// Allocates one private witness per byte, in slice order.
pub(crate) fn alloc_witness_bytes(
    cs: ConstraintSystemRef<BnFr>,
    bytes: &[u8],
) -> Result<Vec<FpVar<BnFr>>, SynthesisError> {
    bytes
        .iter()
        .map(|&b| FpVar::new_witness(cs.clone(), || Ok(BnFr::from(b as u64))))
        .collect()
}

/// Maps bytes to their field-element public-input encoding.
pub(crate) fn fr_bytes(bytes: &[u8]) -> Vec<BnFr> {
    bytes.iter().map(|&b| BnFr::from(b as u64)).collect()
}
