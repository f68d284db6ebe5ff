//! HMAC over the field-native MiMC sponge.
//!
//! Same ipad/opad structure as HMAC-SHA-256, but the padded xored key and the
//! message are absorbed byte-per-field-element into MiMC, and the MAC is a
//! single field element. A non-standard MAC, offered where the drastic
//! constraint saving outweighs interoperability; the oracle composition does
//! not use it.

use ark_bn254::Fr as BnFr;
use ark_r1cs_std::{
    eq::EqGadget,
    fields::{fp::FpVar, FieldVar},
};
use ark_relations::r1cs::{ConstraintSynthesizer, ConstraintSystemRef, SynthesisError};

use crate::bits::variable_xor;

use super::hmac::B;
use super::mimc::{Mimc, MimcGadget};
use super::alloc_witness_bytes;

const IPAD: u64 = 0x36;
const OPAD: u64 = 0x5c;

/// HMAC construction over the MiMC gadget.
pub struct HmacMimcGadget {
    mimc: MimcGadget,
}

impl HmacMimcGadget {
    pub fn new() -> Self {
        Self { mimc: MimcGadget::new() }
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

    /// `MiMC((K ^ ipad) || text)`, one byte per absorbed element.
    pub fn inner_hash(
        &self,
        key: &[FpVar<BnFr>],
        text: &[FpVar<BnFr>],
    ) -> Result<FpVar<BnFr>, SynthesisError> {
        let mut preimage = self.padded_key_xor(key, IPAD)?;
        preimage.extend_from_slice(text);
        self.mimc.hash(&preimage)
    }

    /// `MiMC((K ^ opad) || inner)`.
    pub fn outer_hash(
        &self,
        key: &[FpVar<BnFr>],
        inner: &FpVar<BnFr>,
    ) -> Result<FpVar<BnFr>, SynthesisError> {
        let mut preimage = self.padded_key_xor(key, OPAD)?;
        preimage.push(inner.clone());
        self.mimc.hash(&preimage)
    }

    /// Full MAC of `text` under `key`.
    pub fn mac(
        &self,
        key: &[FpVar<BnFr>],
        text: &[FpVar<BnFr>],
    ) -> Result<FpVar<BnFr>, SynthesisError> {
        let inner = self.inner_hash(key, text)?;
        self.outer_hash(key, &inner)
    }
}

impl Default for HmacMimcGadget {
    fn default() -> Self {
        Self::new()
    }
}

/// Native twin of [`HmacMimcGadget`], for expected-value computation.
pub fn hmac_mimc(key: &[u8], text: &[u8]) -> BnFr {
    assert!(key.len() <= B, "HMAC keys longer than {B} bytes are not supported");
    let mimc = Mimc::new();

    let padded = |pad: u8| -> Vec<BnFr> {
        let mut out: Vec<BnFr> = key.iter().map(|&k| BnFr::from((k ^ pad) as u64)).collect();
        out.resize(B, BnFr::from(pad as u64));
        out
    };

    let mut inner_pre = padded(IPAD as u8);
    inner_pre.extend(text.iter().map(|&b| BnFr::from(b as u64)));
    let inner = mimc.hash(&inner_pre);

    let mut outer_pre = padded(OPAD as u8);
    outer_pre.push(inner);
    mimc.hash(&outer_pre)
}

/// Proves `HMAC-MiMC(key, text) == expected` for private key and text.
#[derive(Clone)]
pub struct HmacMimcCircuit {
    /// Private MAC key, at most 64 bytes.
    pub key: Vec<u8>,
    /// Private message.
    pub text: Vec<u8>,
    /// Public expected MAC element.
    pub expected: BnFr,
}

impl ConstraintSynthesizer<BnFr> for HmacMimcCircuit {
    fn generate_constraints(self, cs: ConstraintSystemRef<BnFr>) -> Result<(), SynthesisError> {
        use ark_r1cs_std::alloc::AllocVar;
        let expected = FpVar::new_input(cs.clone(), || Ok(self.expected))?;
        let key = alloc_witness_bytes(cs.clone(), &self.key)?;
        let text = alloc_witness_bytes(cs, &self.text)?;

        let hmac = HmacMimcGadget::new();
        let mac = hmac.mac(&key, &text)?;
        mac.enforce_equal(&expected)
    }
}

impl HmacMimcCircuit {
    /// Public inputs in allocation order.
    pub fn public_inputs(&self) -> Vec<BnFr> {
        vec![self.expected]
    }
}
