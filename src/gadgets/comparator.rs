//! Byte-slice equality and threshold comparison.

use ark_bn254::Fr as BnFr;
use ark_r1cs_std::{eq::EqGadget, fields::fp::FpVar};
use ark_relations::r1cs::{ConstraintSynthesizer, ConstraintSystemRef, SynthesisError};
use core::cmp::Ordering;

use super::{alloc_public_bytes, alloc_witness_bytes, fr_bytes};

/// Asserts `substring[i] == window[i]` for every position. The caller slices
/// `window` out of the verified plaintext at the declared offset.
pub fn substring_match(
    substring: &[FpVar<BnFr>],
    window: &[FpVar<BnFr>],
) -> Result<(), SynthesisError> {
    debug_assert!(substring.len() <= window.len());
    for (s, w) in substring.iter().zip(window.iter()) {
        s.enforce_equal(w)?;
    }
    Ok(())
}

/// Asserts `v2 <= v1` through the field library's bit-bounded comparison.
///
/// Note: despite the name this is non-strict. A witness with `v1 == v2`
/// satisfies the constraint; callers wanting strict `>` must adjust the
/// threshold by one. Kept this way for compatibility with recorded witnesses.
pub fn greater_than(v1: &FpVar<BnFr>, v2: &FpVar<BnFr>) -> Result<(), SynthesisError> {
    v2.enforce_cmp(v1, Ordering::Less, true)
}

/// Proves a public substring occurs at a fixed offset of a private buffer.
#[derive(Clone)]
pub struct SubstringCircuit {
    /// Private plaintext buffer.
    pub plain_chunks: Vec<u8>,
    /// Public substring.
    pub substring: Vec<u8>,
    /// Window start offset (structural).
    pub substring_start: usize,
    /// Window end offset (structural).
    pub substring_end: usize,
}

impl ConstraintSynthesizer<BnFr> for SubstringCircuit {
    fn generate_constraints(self, cs: ConstraintSystemRef<BnFr>) -> Result<(), SynthesisError> {
        let substring = alloc_public_bytes(cs.clone(), &self.substring)?;
        let plain = alloc_witness_bytes(cs, &self.plain_chunks)?;
        substring_match(&substring, &plain[self.substring_start..self.substring_end])
    }
}

impl SubstringCircuit {
    /// Public inputs in allocation order.
    pub fn public_inputs(&self) -> Vec<BnFr> {
        fr_bytes(&self.substring)
    }
}

/// Proves a private value meets a public threshold.
#[derive(Clone)]
pub struct CompareCircuit {
    /// Private value.
    pub value: u64,
    /// Public threshold.
    pub threshold: u64,
}

impl ConstraintSynthesizer<BnFr> for CompareCircuit {
    fn generate_constraints(self, cs: ConstraintSystemRef<BnFr>) -> Result<(), SynthesisError> {
        use ark_r1cs_std::alloc::AllocVar;
        let threshold = FpVar::new_input(cs.clone(), || Ok(BnFr::from(self.threshold)))?;
        let value = FpVar::new_witness(cs, || Ok(BnFr::from(self.value)))?;
        greater_than(&value, &threshold)
    }
}

impl CompareCircuit {
    /// Public inputs in allocation order.
    pub fn public_inputs(&self) -> Vec<BnFr> {
        vec![BnFr::from(self.threshold)]
    }
}
