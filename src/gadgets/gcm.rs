//! AES-GCM counter-mode consistency gadget.
//!
//! GHASH stays outside the circuit (the auth-tag gadget commits to its
//! inputs); in here we only prove that the selected plaintext chunk XORed
//! with the AES-CTR keystream yields the public ciphertext. The record
//! sequence number is folded into the low 8 bytes of the nonce before the
//! counter blocks are formed, so records after the first verify against
//! their per-record IV. An all-zero sequence number leaves the base IV
//! unchanged.
//!
//! Counter layout: data chunk `j` (0-based within the verified window) uses
//! the block `IV' || be32(chunk_index + j)`, where `chunk_index` is the
//! counter of the first verified block. TLS record payload encryption starts
//! at counter 2 (counter 1 masks the authentication tag).

use ark_bn254::Fr as BnFr;
use ark_r1cs_std::{alloc::AllocVar, eq::EqGadget, fields::fp::FpVar};
use ark_relations::r1cs::{ConstraintSynthesizer, ConstraintSystemRef, SynthesisError};

use crate::bits::{to_bits, U8Var};

use super::{alloc_public_bytes, alloc_witness_bytes, fr_bytes};
use super::aes128::Aes128Gadget;

/// CTR-mode assertion over up to two 16-byte chunks of a TLS record.
pub struct GcmGadget {
    aes: Aes128Gadget,
}

impl GcmGadget {
    pub fn new() -> Self {
        Self { aes: Aes128Gadget::new() }
    }

    /// Reuses an existing AES instance so composed circuits share one S-box
    /// table.
    pub fn with_aes(aes: Aes128Gadget) -> Self {
        Self { aes }
    }

    /// Asserts `cipher[i] == plain[i] ^ AES128(key, IV' || be32(chunk_index + j))[i]`
    /// for every byte of the selected chunks. A trailing partial block is
    /// checked over its actual length.
    pub fn assert_chunks(
        &self,
        key: &[FpVar<BnFr>],
        iv: &[FpVar<BnFr>],
        chunk_index: &FpVar<BnFr>,
        plain: &[FpVar<BnFr>],
        cipher: &[FpVar<BnFr>],
        sequence_number: &[FpVar<BnFr>],
    ) -> Result<(), SynthesisError> {
        debug_assert_eq!(key.len(), 16);
        debug_assert_eq!(iv.len(), 12);
        debug_assert_eq!(plain.len(), cipher.len());
        debug_assert_eq!(sequence_number.len(), 8);

        let key = key.iter().map(U8Var::from_fp).collect::<Result<Vec<_>, _>>()?;

        // mask the record sequence number into the nonce tail
        let mut nonce = Vec::with_capacity(12);
        for b in &iv[..4] {
            nonce.push(U8Var::from_fp(b)?);
        }
        for (b, s) in iv[4..].iter().zip(sequence_number.iter()) {
            nonce.push(U8Var::from_fp(b)?.xor(&U8Var::from_fp(s)?)?);
        }

        let blocks = plain.len().div_ceil(16);
        for j in 0..blocks {
            let counter = chunk_index + FpVar::Constant(BnFr::from(j as u64));
            let counter_bits = to_bits(&counter, 32)?;

            let mut block = nonce.clone();
            for k in 0..4 {
                block.push(U8Var::from_bits(&counter_bits[(3 - k) * 8..(3 - k) * 8 + 8]));
            }

            let keystream = self.aes.encrypt_u8(&key, block)?;

            let lo = 16 * j;
            let hi = plain.len().min(lo + 16);
            for i in lo..hi {
                let masked = U8Var::from_fp(&plain[i])?.xor(&keystream[i - lo])?;
                masked.to_fp()?.enforce_equal(&cipher[i])?;
            }
        }
        Ok(())
    }
}

impl Default for GcmGadget {
    fn default() -> Self {
        Self::new()
    }
}

/// Proves CTR consistency of a plaintext chunk against the public ciphertext.
#[derive(Clone)]
pub struct GcmCircuit {
    /// Private traffic key.
    pub key: [u8; 16],
    /// Private plaintext chunk.
    pub plain_chunks: Vec<u8>,
    /// Public record nonce (before sequence-number masking).
    pub iv: [u8; 12],
    /// Public ciphertext chunk.
    pub cipher_chunks: Vec<u8>,
    /// Public counter of the first verified block.
    pub chunk_index: u64,
    /// Public record sequence number, big-endian.
    pub sequence_number: [u8; 8],
}

impl ConstraintSynthesizer<BnFr> for GcmCircuit {
    fn generate_constraints(self, cs: ConstraintSystemRef<BnFr>) -> Result<(), SynthesisError> {
        let iv = alloc_public_bytes(cs.clone(), &self.iv)?;
        let cipher = alloc_public_bytes(cs.clone(), &self.cipher_chunks)?;
        let chunk_index =
            FpVar::new_input(cs.clone(), || Ok(BnFr::from(self.chunk_index)))?;
        let sequence_number = alloc_public_bytes(cs.clone(), &self.sequence_number)?;

        let key = alloc_witness_bytes(cs.clone(), &self.key)?;
        let plain = alloc_witness_bytes(cs, &self.plain_chunks)?;

        let gcm = GcmGadget::new();
        gcm.assert_chunks(&key, &iv, &chunk_index, &plain, &cipher, &sequence_number)
    }
}

impl GcmCircuit {
    /// Public inputs in allocation order.
    pub fn public_inputs(&self) -> Vec<BnFr> {
        let mut v = fr_bytes(&self.iv);
        v.extend(fr_bytes(&self.cipher_chunks));
        v.push(BnFr::from(self.chunk_index));
        v.extend(fr_bytes(&self.sequence_number));
        v
    }
}
