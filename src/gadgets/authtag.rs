//! Authentication-tag consistency gadget.
//!
//! GCM's tag is `GHASH_H(...) ^ ECB_K(IV||ctr)` with `H = ECB_K(0^128)`.
//! GHASH itself runs outside the circuit; in here the prover shows the
//! derived traffic key produces the public commitments to the GHASH subkey
//! (`ECBK`) and the tag mask block (`ECB0`). The caller supplies the counter
//! block bytes (`iv_counter`), see the witness driver for its construction.

use ark_bn254::Fr as BnFr;
use ark_r1cs_std::{eq::EqGadget, fields::fp::FpVar};
use ark_relations::r1cs::{ConstraintSynthesizer, ConstraintSystemRef, SynthesisError};

use super::aes128::Aes128Gadget;
use super::{alloc_public_bytes, alloc_witness_bytes, fr_bytes};

/// Asserts the two AES-ECB commitments backing the GCM authentication tag.
pub struct AuthTagGadget {
    aes: Aes128Gadget,
}

impl AuthTagGadget {
    pub fn new() -> Self {
        Self { aes: Aes128Gadget::new() }
    }

    /// Reuses an existing AES instance so composed circuits share one S-box
    /// table.
    pub fn with_aes(aes: Aes128Gadget) -> Self {
        Self { aes }
    }

    /// Asserts `AES128(key, zeros) == ecbk` and `AES128(key, iv_counter) == ecb0`.
    pub fn assert_tag(
        &self,
        key: &[FpVar<BnFr>],
        iv_counter: &[FpVar<BnFr>],
        zeros: &[FpVar<BnFr>],
        ecb0: &[FpVar<BnFr>],
        ecbk: &[FpVar<BnFr>],
    ) -> Result<(), SynthesisError> {
        let out_k = self.aes.encrypt(key, zeros)?;
        for (o, e) in out_k.iter().zip(ecbk.iter()) {
            o.enforce_equal(e)?;
        }

        let out_0 = self.aes.encrypt(key, iv_counter)?;
        for (o, e) in out_0.iter().zip(ecb0.iter()) {
            o.enforce_equal(e)?;
        }
        Ok(())
    }
}

impl Default for AuthTagGadget {
    fn default() -> Self {
        Self::new()
    }
}

/// Proves the auth-tag commitments for a private key.
#[derive(Clone)]
pub struct AuthTagCircuit {
    /// Private traffic key.
    pub key: [u8; 16],
    /// Public counter block.
    pub iv_counter: [u8; 16],
    /// Public all-zero block.
    pub zeros: [u8; 16],
    /// Public encryption of the counter block (tag mask commitment).
    pub ecb0: [u8; 16],
    /// Public encryption of the zero block (GHASH subkey commitment).
    pub ecbk: [u8; 16],
}

impl ConstraintSynthesizer<BnFr> for AuthTagCircuit {
    fn generate_constraints(self, cs: ConstraintSystemRef<BnFr>) -> Result<(), SynthesisError> {
        let iv_counter = alloc_public_bytes(cs.clone(), &self.iv_counter)?;
        let zeros = alloc_public_bytes(cs.clone(), &self.zeros)?;
        let ecb0 = alloc_public_bytes(cs.clone(), &self.ecb0)?;
        let ecbk = alloc_public_bytes(cs.clone(), &self.ecbk)?;
        let key = alloc_witness_bytes(cs, &self.key)?;

        let tag = AuthTagGadget::new();
        tag.assert_tag(&key, &iv_counter, &zeros, &ecb0, &ecbk)
    }
}

impl AuthTagCircuit {
    /// Public inputs in allocation order.
    pub fn public_inputs(&self) -> Vec<BnFr> {
        let mut v = fr_bytes(&self.iv_counter);
        v.extend(fr_bytes(&self.zeros));
        v.extend(fr_bytes(&self.ecb0));
        v.extend(fr_bytes(&self.ecbk));
        v
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::solving_succeeded;
    use aes::cipher::{generic_array::GenericArray, BlockEncrypt, KeyInit};
    use aes::Aes128;

    fn ecb(key: &[u8; 16], block: &[u8; 16]) -> [u8; 16] {
        let cipher = Aes128::new(GenericArray::from_slice(key));
        let mut b = GenericArray::clone_from_slice(block);
        cipher.encrypt_block(&mut b);
        b.into()
    }

    fn sample_circuit() -> AuthTagCircuit {
        let key: [u8; 16] = hex::decode("ab72c77b97cb5fe9a382d9fe81ffdbed")
            .unwrap()
            .try_into()
            .unwrap();
        let iv: [u8; 12] = hex::decode("54cc7dc2c37ec006bcc6d1da").unwrap().try_into().unwrap();
        let mut iv_counter = [0u8; 16];
        iv_counter[..12].copy_from_slice(&iv);
        iv_counter[12..].copy_from_slice(&2u32.to_be_bytes());
        let zeros = [0u8; 16];
        AuthTagCircuit {
            key,
            iv_counter,
            zeros,
            ecb0: ecb(&key, &iv_counter),
            ecbk: ecb(&key, &zeros),
        }
    }

    #[test]
    fn test_commitments_solve() {
        assert!(solving_succeeded(sample_circuit()).unwrap());
    }

    #[test]
    fn test_wrong_subkey_rejected() {
        let mut circuit = sample_circuit();
        circuit.ecbk[0] ^= 1;
        assert!(!solving_succeeded(circuit).unwrap());
    }

    #[test]
    fn test_wrong_mask_rejected() {
        let mut circuit = sample_circuit();
        circuit.ecb0[15] ^= 0x10;
        assert!(!solving_succeeded(circuit).unwrap());
    }
}
