//! HMAC-SHA-256 gadget.
//!
//! Standard RFC 2104 construction with B = 64:
//! `H((K ^ opad) || H((K ^ ipad) || text))`, the key zero-padded to one
//! block. Keys longer than 64 bytes are not hashed down; the TLS 1.3
//! consumer only ever passes 32-byte secrets, so oversized keys are a caller
//! bug and rejected structurally.

use ark_bn254::Fr as BnFr;
use ark_r1cs_std::{
    eq::EqGadget,
    fields::{fp::FpVar, FieldVar},
};
use ark_relations::r1cs::{ConstraintSynthesizer, ConstraintSystemRef, SynthesisError};

use crate::bits::variable_xor;

use super::sha256::Sha256Gadget;
use super::{alloc_public_bytes, alloc_witness_bytes, fr_bytes};

/// Block size of the underlying hash.
pub const B: usize = 64;

const IPAD: u64 = 0x36;
const OPAD: u64 = 0x5c;

/// HMAC over the in-circuit SHA-256.
pub struct HmacSha256Gadget;

impl HmacSha256Gadget {
    pub fn new() -> Self {
        Self
    }

    fn padded_key_xor(
        &self,
        key: &[FpVar<BnFr>],
        pad: u64,
    ) -> Result<Vec<FpVar<BnFr>>, SynthesisError> {
        assert!(key.len() <= B, "HMAC keys longer than {B} bytes are not supported");
        let pad = FpVar::constant(BnFr::from(pad));
        let mut out = Vec::with_capacity(B);
        for k in key {
            out.push(variable_xor(k, &pad, 8)?);
        }
        for _ in key.len()..B {
            out.push(variable_xor(&FpVar::zero(), &pad, 8)?);
        }
        Ok(out)
    }

    /// `H((K ^ ipad) || text)`.
    pub fn inner_hash(
        &self,
        key: &[FpVar<BnFr>],
        text: &[FpVar<BnFr>],
    ) -> Result<Vec<FpVar<BnFr>>, SynthesisError> {
        let mut preimage = self.padded_key_xor(key, IPAD)?;
        preimage.extend_from_slice(text);

        let mut sha = Sha256Gadget::new();
        sha.write(&preimage)?;
        sha.sum()
    }

    /// `H((K ^ opad) || inner)`.
    pub fn outer_hash(
        &self,
        key: &[FpVar<BnFr>],
        inner: &[FpVar<BnFr>],
    ) -> Result<Vec<FpVar<BnFr>>, SynthesisError> {
        let mut preimage = self.padded_key_xor(key, OPAD)?;
        preimage.extend_from_slice(inner);

        let mut sha = Sha256Gadget::new();
        sha.write(&preimage)?;
        sha.sum()
    }

    /// Full MAC of `text` under `key`.
    pub fn mac(
        &self,
        key: &[FpVar<BnFr>],
        text: &[FpVar<BnFr>],
    ) -> Result<Vec<FpVar<BnFr>>, SynthesisError> {
        let inner = self.inner_hash(key, text)?;
        self.outer_hash(key, &inner)
    }
}

impl Default for HmacSha256Gadget {
    fn default() -> Self {
        Self::new()
    }
}

/// Proves `HMAC-SHA256(key, text) == expected` for private key and text.
#[derive(Clone)]
pub struct HmacCircuit {
    /// Private MAC key, at most 64 bytes.
    pub key: Vec<u8>,
    /// Private message.
    pub text: Vec<u8>,
    /// Public expected MAC.
    pub expected: [u8; 32],
}

impl ConstraintSynthesizer<BnFr> for HmacCircuit {
    fn generate_constraints(self, cs: ConstraintSystemRef<BnFr>) -> Result<(), SynthesisError> {
        let expected = alloc_public_bytes(cs.clone(), &self.expected)?;
        let key = alloc_witness_bytes(cs.clone(), &self.key)?;
        let text = alloc_witness_bytes(cs, &self.text)?;

        let hmac = HmacSha256Gadget::new();
        let mac = hmac.mac(&key, &text)?;
        for (m, e) in mac.iter().zip(expected.iter()) {
            m.enforce_equal(e)?;
        }
        Ok(())
    }
}

impl HmacCircuit {
    /// Public inputs in allocation order.
    pub fn public_inputs(&self) -> Vec<BnFr> {
        fr_bytes(&self.expected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::solving_succeeded;
    use hmac::{Hmac, Mac};
    use sha2::Sha256;

    fn reference_hmac(key: &[u8], text: &[u8]) -> [u8; 32] {
        let mut mac = Hmac::<Sha256>::new_from_slice(key).unwrap();
        mac.update(text);
        mac.finalize().into_bytes().into()
    }

    #[test]
    fn test_agreement_short_key() {
        let key = b"key".to_vec();
        let text = b"The quick brown fox jumps over the lazy dog".to_vec();
        let expected = reference_hmac(&key, &text);
        assert!(solving_succeeded(HmacCircuit { key, text, expected }).unwrap());
    }

    #[test]
    fn test_agreement_block_size_key() {
        let key = vec![0xaa; 64];
        let text = vec![0x42; 100];
        let expected = reference_hmac(&key, &text);
        assert!(solving_succeeded(HmacCircuit { key, text, expected }).unwrap());
    }

    #[test]
    fn test_agreement_32_byte_secret() {
        // the TLS 1.3 consumer always passes 32-byte secrets
        let key: Vec<u8> = (0u8..32).collect();
        let text = b"tls13 derived".to_vec();
        let expected = reference_hmac(&key, &text);
        assert!(solving_succeeded(HmacCircuit { key, text, expected }).unwrap());
    }

    #[test]
    fn test_wrong_mac_rejected() {
        let key = b"secret".to_vec();
        let text = b"message".to_vec();
        let mut expected = reference_hmac(&key, &text);
        expected[31] ^= 1;
        assert!(!solving_succeeded(HmacCircuit { key, text, expected }).unwrap());
    }
}
