//! End-to-end TLS 1.3 oracle circuit.
//!
//! One circuit, three sub-predicates sharing the derived traffic key:
//!
//! 1. the key schedule re-derives the 16-byte application-traffic key,
//! 2. the key reproduces the public auth-tag commitments,
//! 3. the selected record chunk decrypts under the key to a plaintext
//!    satisfying the substring and threshold policy.
//!
//! No constraints beyond the sub-gadgets' own are added here.

use ark_bn254::Fr as BnFr;
use ark_r1cs_std::{alloc::AllocVar, fields::fp::FpVar};
use ark_relations::r1cs::{ConstraintSynthesizer, ConstraintSystemRef, SynthesisError};

use super::aes128::Aes128Gadget;
use super::authtag::AuthTagGadget;
use super::kdc::Tls13KdcGadget;
use super::record::{RecordOffsets, Tls13RecordGadget};
use super::{alloc_public_bytes, alloc_witness_bytes, fr_bytes};

/// Composition gadget wiring KDC, auth-tag and record together.
pub struct Tls13OracleGadget;

impl Tls13OracleGadget {
    pub fn new() -> Self {
        Self
    }

    /// Derives the traffic key and feeds it to both the auth-tag and record
    /// assertions.
    #[allow(clippy::too_many_arguments)]
    pub fn assert_oracle(
        &self,
        // kdc inputs
        intermediate_hash_hs_opad: &[FpVar<BnFr>],
        ms_in: &[FpVar<BnFr>],
        xats_in: &[FpVar<BnFr>],
        tk_xapp_in: &[FpVar<BnFr>],
        dhs_in: &[FpVar<BnFr>],
        // authtag inputs
        iv_counter: &[FpVar<BnFr>],
        zeros: &[FpVar<BnFr>],
        ecb0: &[FpVar<BnFr>],
        ecbk: &[FpVar<BnFr>],
        // record inputs
        iv: &[FpVar<BnFr>],
        plain_chunks: &[FpVar<BnFr>],
        cipher_chunks: &[FpVar<BnFr>],
        substring: &[FpVar<BnFr>],
        chunk_index: &FpVar<BnFr>,
        threshold: &FpVar<BnFr>,
        offsets: RecordOffsets,
        sequence_number: &[FpVar<BnFr>],
    ) -> Result<(), SynthesisError> {
        let kdc = Tls13KdcGadget::new();
        let tk = kdc.derive(intermediate_hash_hs_opad, ms_in, xats_in, tk_xapp_in, dhs_in)?;

        let aes = Aes128Gadget::new();

        let tag = AuthTagGadget::with_aes(aes.clone());
        tag.assert_tag(&tk, iv_counter, zeros, ecb0, ecbk)?;

        let record = Tls13RecordGadget::with_aes(aes);
        record.assert_record(
            &tk,
            iv,
            plain_chunks,
            cipher_chunks,
            substring,
            chunk_index,
            threshold,
            offsets,
            sequence_number,
        )
    }
}

impl Default for Tls13OracleGadget {
    fn default() -> Self {
        Self::new()
    }
}

/// The end-to-end oracle circuit. Private inputs are the precomputed dHS
/// block and the plaintext chunk; everything else is public.
#[derive(Clone, Debug)]
pub struct OracleCircuit {
    // kdc params
    /// Private 64-byte dHS block (padded out of circuit).
    pub dhs_in: [u8; 64],
    /// Public outer-HMAC intermediate state.
    pub intermediate_hash_hs_opad: [u8; 32],
    /// Public master-secret expansion input.
    pub ms_in: [u8; 32],
    /// Public traffic-secret expansion input.
    pub xats_in: [u8; 32],
    /// Public traffic-key expansion input.
    pub tk_xapp_in: [u8; 32],

    // authtag params
    /// Public counter block for the tag mask.
    pub iv_counter: [u8; 16],
    /// Public all-zero block.
    pub zeros: [u8; 16],
    /// Public tag mask commitment.
    pub ecb0: [u8; 16],
    /// Public GHASH subkey commitment.
    pub ecbk: [u8; 16],

    // record params
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

impl ConstraintSynthesizer<BnFr> for OracleCircuit {
    fn generate_constraints(self, cs: ConstraintSystemRef<BnFr>) -> Result<(), SynthesisError> {
        // public inputs, in the order mirrored by `public_inputs`
        let ihhs = alloc_public_bytes(cs.clone(), &self.intermediate_hash_hs_opad)?;
        let ms_in = alloc_public_bytes(cs.clone(), &self.ms_in)?;
        let xats_in = alloc_public_bytes(cs.clone(), &self.xats_in)?;
        let tk_xapp_in = alloc_public_bytes(cs.clone(), &self.tk_xapp_in)?;
        let iv_counter = alloc_public_bytes(cs.clone(), &self.iv_counter)?;
        let zeros = alloc_public_bytes(cs.clone(), &self.zeros)?;
        let ecb0 = alloc_public_bytes(cs.clone(), &self.ecb0)?;
        let ecbk = alloc_public_bytes(cs.clone(), &self.ecbk)?;
        let iv = alloc_public_bytes(cs.clone(), &self.iv)?;
        let cipher_chunks = alloc_public_bytes(cs.clone(), &self.cipher_chunks)?;
        let chunk_index = FpVar::new_input(cs.clone(), || Ok(BnFr::from(self.chunk_index)))?;
        let substring = alloc_public_bytes(cs.clone(), &self.substring)?;
        let threshold = FpVar::new_input(cs.clone(), || Ok(BnFr::from(self.threshold)))?;
        let sequence_number = alloc_public_bytes(cs.clone(), &self.sequence_number)?;

        // private inputs
        let dhs_in = alloc_witness_bytes(cs.clone(), &self.dhs_in)?;
        let plain_chunks = alloc_witness_bytes(cs, &self.plain_chunks)?;

        let oracle = Tls13OracleGadget::new();
        oracle.assert_oracle(
            &ihhs,
            &ms_in,
            &xats_in,
            &tk_xapp_in,
            &dhs_in,
            &iv_counter,
            &zeros,
            &ecb0,
            &ecbk,
            &iv,
            &plain_chunks,
            &cipher_chunks,
            &substring,
            &chunk_index,
            &threshold,
            self.offsets,
            &sequence_number,
        )
    }
}

impl OracleCircuit {
    /// Public inputs in allocation order.
    pub fn public_inputs(&self) -> Vec<BnFr> {
        let mut v = fr_bytes(&self.intermediate_hash_hs_opad);
        v.extend(fr_bytes(&self.ms_in));
        v.extend(fr_bytes(&self.xats_in));
        v.extend(fr_bytes(&self.tk_xapp_in));
        v.extend(fr_bytes(&self.iv_counter));
        v.extend(fr_bytes(&self.zeros));
        v.extend(fr_bytes(&self.ecb0));
        v.extend(fr_bytes(&self.ecbk));
        v.extend(fr_bytes(&self.iv));
        v.extend(fr_bytes(&self.cipher_chunks));
        v.push(BnFr::from(self.chunk_index));
        v.extend(fr_bytes(&self.substring));
        v.push(BnFr::from(self.threshold));
        v.extend(fr_bytes(&self.sequence_number));
        v
    }
}
