//! AES-128 block encryption gadget.
//!
//! Textbook FIPS-197: ten rounds of SubBytes, ShiftRows, MixColumns and
//! AddRoundKey over a 16-byte state, with the 44-word key schedule derived
//! in-circuit. SubBytes indexes a 256-entry constant table through the
//! power-of-two select gadget; MixColumns is pure GF(2^8) bit algebra via
//! [`U8Var::xtime`].

use ark_bn254::Fr as BnFr;
use ark_r1cs_std::fields::fp::FpVar;
use ark_r1cs_std::prelude::*;
use ark_relations::r1cs::{ConstraintSynthesizer, ConstraintSystemRef, SynthesisError};

use crate::bits::U8Var;

use super::{alloc_public_bytes, alloc_witness_bytes, fr_bytes};

/// FIPS-197 substitution box.
#[rustfmt::skip]
pub const SBOX: [u8; 256] = [
    0x63, 0x7c, 0x77, 0x7b, 0xf2, 0x6b, 0x6f, 0xc5, 0x30, 0x01, 0x67, 0x2b, 0xfe, 0xd7, 0xab, 0x76,
    0xca, 0x82, 0xc9, 0x7d, 0xfa, 0x59, 0x47, 0xf0, 0xad, 0xd4, 0xa2, 0xaf, 0x9c, 0xa4, 0x72, 0xc0,
    0xb7, 0xfd, 0x93, 0x26, 0x36, 0x3f, 0xf7, 0xcc, 0x34, 0xa5, 0xe5, 0xf1, 0x71, 0xd8, 0x31, 0x15,
    0x04, 0xc7, 0x23, 0xc3, 0x18, 0x96, 0x05, 0x9a, 0x07, 0x12, 0x80, 0xe2, 0xeb, 0x27, 0xb2, 0x75,
    0x09, 0x83, 0x2c, 0x1a, 0x1b, 0x6e, 0x5a, 0xa0, 0x52, 0x3b, 0xd6, 0xb3, 0x29, 0xe3, 0x2f, 0x84,
    0x53, 0xd1, 0x00, 0xed, 0x20, 0xfc, 0xb1, 0x5b, 0x6a, 0xcb, 0xbe, 0x39, 0x4a, 0x4c, 0x58, 0xcf,
    0xd0, 0xef, 0xaa, 0xfb, 0x43, 0x4d, 0x33, 0x85, 0x45, 0xf9, 0x02, 0x7f, 0x50, 0x3c, 0x9f, 0xa8,
    0x51, 0xa3, 0x40, 0x8f, 0x92, 0x9d, 0x38, 0xf5, 0xbc, 0xb6, 0xda, 0x21, 0x10, 0xff, 0xf3, 0xd2,
    0xcd, 0x0c, 0x13, 0xec, 0x5f, 0x97, 0x44, 0x17, 0xc4, 0xa7, 0x7e, 0x3d, 0x64, 0x5d, 0x19, 0x73,
    0x60, 0x81, 0x4f, 0xdc, 0x22, 0x2a, 0x90, 0x88, 0x46, 0xee, 0xb8, 0x14, 0xde, 0x5e, 0x0b, 0xdb,
    0xe0, 0x32, 0x3a, 0x0a, 0x49, 0x06, 0x24, 0x5c, 0xc2, 0xd3, 0xac, 0x62, 0x91, 0x95, 0xe4, 0x79,
    0xe7, 0xc8, 0x37, 0x6d, 0x8d, 0xd5, 0x4e, 0xa9, 0x6c, 0x56, 0xf4, 0xea, 0x65, 0x7a, 0xae, 0x08,
    0xba, 0x78, 0x25, 0x2e, 0x1c, 0xa6, 0xb4, 0xc6, 0xe8, 0xdd, 0x74, 0x1f, 0x4b, 0xbd, 0x8b, 0x8a,
    0x70, 0x3e, 0xb5, 0x66, 0x48, 0x03, 0xf6, 0x0e, 0x61, 0x35, 0x57, 0xb9, 0x86, 0xc1, 0x1d, 0x9e,
    0xe1, 0xf8, 0x98, 0x11, 0x69, 0xd9, 0x8e, 0x94, 0x9b, 0x1e, 0x87, 0xe9, 0xce, 0x55, 0x28, 0xdf,
    0x8c, 0xa1, 0x89, 0x0d, 0xbf, 0xe6, 0x42, 0x68, 0x41, 0x99, 0x2d, 0x0f, 0xb0, 0x54, 0xbb, 0x16,
];

const RCON: [u8; 10] = [0x01, 0x02, 0x04, 0x08, 0x10, 0x20, 0x40, 0x80, 0x1b, 0x36];

/// AES-128 encryption gadget. Holds the S-box as circuit constants so every
/// SubBytes lookup shares one table.
#[derive(Clone)]
pub struct Aes128Gadget {
    sbox: Vec<FpVar<BnFr>>,
}

impl Aes128Gadget {
    pub fn new() -> Self {
        Self {
            sbox: SBOX.iter().map(|&b| FpVar::constant(BnFr::from(b as u64))).collect(),
        }
    }

    /// S-box lookup of a variable byte via the bit-indexed mux tree.
    fn sub_byte(&self, b: &U8Var) -> Result<U8Var, SynthesisError> {
        // the select gadget wants the index bits most-significant first
        let position: Vec<Boolean<BnFr>> = b.bits.iter().rev().cloned().collect();
        let selected = FpVar::conditionally_select_power_of_two_vector(&position, &self.sbox)?;
        U8Var::from_fp(&selected)
    }

    /// FIPS-197 key expansion: 44 words, RotWord+SubWord+Rcon every fourth.
    fn expand_key(&self, key: &[U8Var]) -> Result<Vec<Vec<U8Var>>, SynthesisError> {
        let mut w: Vec<Vec<U8Var>> = Vec::with_capacity(44);
        for i in 0..4 {
            w.push(key[4 * i..4 * i + 4].to_vec());
        }
        for i in 4..44 {
            let mut temp = w[i - 1].clone();
            if i % 4 == 0 {
                temp.rotate_left(1);
                for t in temp.iter_mut() {
                    *t = self.sub_byte(t)?;
                }
                temp[0] = temp[0].xor(&U8Var::constant(RCON[i / 4 - 1]))?;
            }
            let word = w[i - 4]
                .iter()
                .zip(temp.iter())
                .map(|(a, b)| a.xor(b))
                .collect::<Result<Vec<_>, _>>()?;
            w.push(word);
        }
        Ok(w)
    }

    /// Encrypts one 16-byte block under a 16-byte key.
    pub fn encrypt(
        &self,
        key: &[FpVar<BnFr>],
        plaintext: &[FpVar<BnFr>],
    ) -> Result<Vec<FpVar<BnFr>>, SynthesisError> {
        debug_assert_eq!(key.len(), 16);
        debug_assert_eq!(plaintext.len(), 16);
        let key = key.iter().map(U8Var::from_fp).collect::<Result<Vec<_>, _>>()?;
        let state = plaintext
            .iter()
            .map(U8Var::from_fp)
            .collect::<Result<Vec<_>, _>>()?;
        let out = self.encrypt_u8(&key, state)?;
        out.iter().map(|b| b.to_fp()).collect()
    }

    pub(crate) fn encrypt_u8(
        &self,
        key: &[U8Var],
        mut state: Vec<U8Var>,
    ) -> Result<Vec<U8Var>, SynthesisError> {
        let w = self.expand_key(key)?;

        add_round_key(&mut state, &w[0..4])?;
        for round in 1..10 {
            state = self.sub_bytes(state)?;
            state = shift_rows(state);
            state = mix_columns(state)?;
            add_round_key(&mut state, &w[4 * round..4 * round + 4])?;
        }
        state = self.sub_bytes(state)?;
        state = shift_rows(state);
        add_round_key(&mut state, &w[40..44])?;
        Ok(state)
    }

    fn sub_bytes(&self, state: Vec<U8Var>) -> Result<Vec<U8Var>, SynthesisError> {
        state.iter().map(|b| self.sub_byte(b)).collect()
    }
}

impl Default for Aes128Gadget {
    fn default() -> Self {
        Self::new()
    }
}

// state index r + 4c, row r, column c
fn shift_rows(state: Vec<U8Var>) -> Vec<U8Var> {
    let mut out = state.clone();
    for r in 0..4 {
        for c in 0..4 {
            out[r + 4 * c] = state[r + 4 * ((c + r) % 4)].clone();
        }
    }
    out
}

fn mix_columns(state: Vec<U8Var>) -> Result<Vec<U8Var>, SynthesisError> {
    let mut out = Vec::with_capacity(16);
    for c in 0..4 {
        let a0 = &state[4 * c];
        let a1 = &state[4 * c + 1];
        let a2 = &state[4 * c + 2];
        let a3 = &state[4 * c + 3];

        let x3 = |v: &U8Var| -> Result<U8Var, SynthesisError> { v.xtime()?.xor(v) };

        out.push(a0.xtime()?.xor(&x3(a1)?)?.xor(a2)?.xor(a3)?);
        out.push(a0.xor(&a1.xtime()?)?.xor(&x3(a2)?)?.xor(a3)?);
        out.push(a0.xor(a1)?.xor(&a2.xtime()?)?.xor(&x3(a3)?)?);
        out.push(x3(a0)?.xor(a1)?.xor(a2)?.xor(&a3.xtime()?)?);
    }
    Ok(out)
}

fn add_round_key(state: &mut [U8Var], words: &[Vec<U8Var>]) -> Result<(), SynthesisError> {
    for c in 0..4 {
        for r in 0..4 {
            state[r + 4 * c] = state[r + 4 * c].xor(&words[c][r])?;
        }
    }
    Ok(())
}

/// Proves `AES128(key, plain) == cipher` for a private key and plaintext.
#[derive(Clone)]
pub struct Aes128Circuit {
    /// Private cipher key.
    pub key: [u8; 16],
    /// Private plaintext block.
    pub plain: [u8; 16],
    /// Public expected ciphertext block.
    pub cipher: [u8; 16],
}

impl ConstraintSynthesizer<BnFr> for Aes128Circuit {
    fn generate_constraints(self, cs: ConstraintSystemRef<BnFr>) -> Result<(), SynthesisError> {
        let cipher = alloc_public_bytes(cs.clone(), &self.cipher)?;
        let key = alloc_witness_bytes(cs.clone(), &self.key)?;
        let plain = alloc_witness_bytes(cs, &self.plain)?;

        let aes = Aes128Gadget::new();
        let out = aes.encrypt(&key, &plain)?;
        for (o, c) in out.iter().zip(cipher.iter()) {
            o.enforce_equal(c)?;
        }
        Ok(())
    }
}

impl Aes128Circuit {
    /// Public inputs in allocation order.
    pub fn public_inputs(&self) -> Vec<BnFr> {
        fr_bytes(&self.cipher)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::solving_succeeded;
    use aes::cipher::{generic_array::GenericArray, BlockEncrypt, KeyInit};
    use aes::Aes128;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha20Rng;

    fn reference_encrypt(key: &[u8; 16], plain: &[u8; 16]) -> [u8; 16] {
        let cipher = Aes128::new(GenericArray::from_slice(key));
        let mut block = GenericArray::clone_from_slice(plain);
        cipher.encrypt_block(&mut block);
        block.into()
    }

    #[test]
    fn test_fips197_vector() {
        let key: [u8; 16] = hex::decode("000102030405060708090a0b0c0d0e0f")
            .unwrap()
            .try_into()
            .unwrap();
        let plain: [u8; 16] = hex::decode("00112233445566778899aabbccddeeff")
            .unwrap()
            .try_into()
            .unwrap();
        let cipher: [u8; 16] = hex::decode("69c4e0d86a7b0430d8cdb78070b4c55a")
            .unwrap()
            .try_into()
            .unwrap();
        assert_eq!(reference_encrypt(&key, &plain), cipher);
        assert!(solving_succeeded(Aes128Circuit { key, plain, cipher }).unwrap());
    }

    #[test]
    fn test_zero_block_vector() {
        // ECBK commitment from a captured session
        let key: [u8; 16] = hex::decode("f6f077cf8bfff92607c8ca6362f0948b")
            .unwrap()
            .try_into()
            .unwrap();
        let plain = [0u8; 16];
        let cipher: [u8; 16] = hex::decode("2c02f543f56dd7abc50a4b35201be8cd")
            .unwrap()
            .try_into()
            .unwrap();
        assert_eq!(reference_encrypt(&key, &plain), cipher);
        assert!(solving_succeeded(Aes128Circuit { key, plain, cipher }).unwrap());
    }

    #[test]
    fn test_agreement_random() {
        let mut rng = ChaCha20Rng::seed_from_u64(1);
        let key: [u8; 16] = rng.gen();
        let plain: [u8; 16] = rng.gen();
        let cipher = reference_encrypt(&key, &plain);
        assert!(solving_succeeded(Aes128Circuit { key, plain, cipher }).unwrap());
    }

    #[test]
    fn test_rejects_wrong_ciphertext() {
        let key = [0x11u8; 16];
        let plain = [0x22u8; 16];
        let mut cipher = reference_encrypt(&key, &plain);
        cipher[5] ^= 0x80;
        assert!(!solving_succeeded(Aes128Circuit { key, plain, cipher }).unwrap());
    }
}
