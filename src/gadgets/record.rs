//! Policy verification over one decrypted record window.
//!
//! Composes the CTR decryption proof with the plaintext predicates: the
//! declared substring occurs at its offset, and the decimal value parsed from
//! the value window meets the public threshold.

use ark_bn254::Fr as BnFr;
use ark_r1cs_std::{alloc::AllocVar, fields::fp::FpVar};
use ark_relations::r1cs::{ConstraintSynthesizer, ConstraintSystemRef, SynthesisError};

use super::aes128::Aes128Gadget;
use super::comparator::{greater_than, substring_match};
use super::gcm::GcmGadget;
use super::str2int::string_to_int;
use super::{alloc_public_bytes, alloc_witness_bytes, fr_bytes};

/// Byte offsets into the verified plaintext window. Structural circuit
/// parameters, not witness values.
#[derive(Clone, Copy, Debug)]
pub struct RecordOffsets {
    pub substring_start: usize,
    pub substring_end: usize,
    pub value_start: usize,
    pub value_end: usize,
}

/// Record-layer predicate gadget.
pub struct Tls13RecordGadget {
    gcm: GcmGadget,
}

impl Tls13RecordGadget {
    pub fn new() -> Self {
        Self { gcm: GcmGadget::new() }
    }

    /// Reuses an existing AES instance so composed circuits share one S-box
    /// table.
    pub fn with_aes(aes: Aes128Gadget) -> Self {
        Self { gcm: GcmGadget::with_aes(aes) }
    }

    /// Asserts CTR consistency of the chunk, the substring match and the
    /// threshold predicate.
    #[allow(clippy::too_many_arguments)]
    pub fn assert_record(
        &self,
        key: &[FpVar<BnFr>],
        iv: &[FpVar<BnFr>],
        plain_chunks: &[FpVar<BnFr>],
        cipher_chunks: &[FpVar<BnFr>],
        substring: &[FpVar<BnFr>],
        chunk_index: &FpVar<BnFr>,
        threshold: &FpVar<BnFr>,
        offsets: RecordOffsets,
        sequence_number: &[FpVar<BnFr>],
    ) -> Result<(), SynthesisError> {
        self.gcm.assert_chunks(
            key,
            iv,
            chunk_index,
            plain_chunks,
            cipher_chunks,
            sequence_number,
        )?;

        // the plaintext is CTR-verified from here on
        substring_match(
            substring,
            &plain_chunks[offsets.substring_start..offsets.substring_end],
        )?;

        let value = string_to_int(&plain_chunks[offsets.value_start..offsets.value_end])?;
        greater_than(&value, threshold)
    }
}

impl Default for Tls13RecordGadget {
    fn default() -> Self {
        Self::new()
    }
}

/// Proves a record chunk decrypts under a private key to a plaintext that
/// satisfies the public policy.
#[derive(Clone)]
pub struct RecordCircuit {
    /// Private traffic key.
    pub key: [u8; 16],
    /// Private plaintext chunk.
    pub plain_chunks: Vec<u8>,
    /// Public record nonce.
    pub iv: [u8; 12],
    /// Public ciphertext chunk.
    pub cipher_chunks: Vec<u8>,
    /// Public counter of the first verified block.
    pub chunk_index: u64,
    /// Public expected substring.
    pub substring: Vec<u8>,
    /// Public threshold for the parsed value.
    pub threshold: u64,
    /// Public record sequence number, big-endian.
    pub sequence_number: [u8; 8],
    /// Structural plaintext offsets.
    pub offsets: RecordOffsets,
}

impl ConstraintSynthesizer<BnFr> for RecordCircuit {
    fn generate_constraints(self, cs: ConstraintSystemRef<BnFr>) -> Result<(), SynthesisError> {
        let iv = alloc_public_bytes(cs.clone(), &self.iv)?;
        let cipher = alloc_public_bytes(cs.clone(), &self.cipher_chunks)?;
        let chunk_index = FpVar::new_input(cs.clone(), || Ok(BnFr::from(self.chunk_index)))?;
        let substring = alloc_public_bytes(cs.clone(), &self.substring)?;
        let threshold = FpVar::new_input(cs.clone(), || Ok(BnFr::from(self.threshold)))?;
        let sequence_number = alloc_public_bytes(cs.clone(), &self.sequence_number)?;

        let key = alloc_witness_bytes(cs.clone(), &self.key)?;
        let plain = alloc_witness_bytes(cs, &self.plain_chunks)?;

        let record = Tls13RecordGadget::new();
        record.assert_record(
            &key,
            &iv,
            &plain,
            &cipher,
            &substring,
            &chunk_index,
            &threshold,
            self.offsets,
            &sequence_number,
        )
    }
}

impl RecordCircuit {
    /// Public inputs in allocation order.
    pub fn public_inputs(&self) -> Vec<BnFr> {
        let mut v = fr_bytes(&self.iv);
        v.extend(fr_bytes(&self.cipher_chunks));
        v.push(BnFr::from(self.chunk_index));
        v.extend(fr_bytes(&self.substring));
        v.push(BnFr::from(self.threshold));
        v.extend(fr_bytes(&self.sequence_number));
        v
    }
}
