//! Streaming SHA-256 compression gadget.
//!
//! Follows FIPS-180-4: a 64-byte block buffer, eight 32-bit state words and a
//! byte-length counter. Two entry points beyond the standard digest:
//!
//! * [`Sha256Gadget::new_with_iv`] installs a caller-supplied chaining value,
//!   turning the compression function into SHACAL-2. The prover uses it to
//!   resume an HMAC inner hash whose prefix was absorbed outside the circuit.
//! * [`Sha256Gadget::write_return`] emits the raw state words without any
//!   padding; only meaningful when the written data is a whole number of
//!   blocks.

use ark_bn254::Fr as BnFr;
use ark_r1cs_std::{eq::EqGadget, fields::fp::FpVar};
use ark_relations::r1cs::{ConstraintSynthesizer, ConstraintSystemRef, SynthesisError};

use crate::bits::{U32Var, U64Var, U8Var};

use super::{alloc_public_bytes, alloc_witness_bytes, fr_bytes};

const CHUNK: usize = 64;

const INIT: [u32; 8] = [
    0x6a09e667, 0xbb67ae85, 0x3c6ef372, 0xa54ff53a, 0x510e527f, 0x9b05688c, 0x1f83d9ab, 0x5be0cd19,
];

#[rustfmt::skip]
const K: [u32; 64] = [
    0x428a2f98, 0x71374491, 0xb5c0fbcf, 0xe9b5dba5, 0x3956c25b, 0x59f111f1, 0x923f82a4, 0xab1c5ed5,
    0xd807aa98, 0x12835b01, 0x243185be, 0x550c7dc3, 0x72be5d74, 0x80deb1fe, 0x9bdc06a7, 0xc19bf174,
    0xe49b69c1, 0xefbe4786, 0x0fc19dc6, 0x240ca1cc, 0x2de92c6f, 0x4a7484aa, 0x5cb0a9dc, 0x76f988da,
    0x983e5152, 0xa831c66d, 0xb00327c8, 0xbf597fc7, 0xc6e00bf3, 0xd5a79147, 0x06ca6351, 0x14292967,
    0x27b70a85, 0x2e1b2138, 0x4d2c6dfc, 0x53380d13, 0x650a7354, 0x766a0abb, 0x81c2c92e, 0x92722c85,
    0xa2bfe8a1, 0xa81a664b, 0xc24b8b70, 0xc76c51a3, 0xd192e819, 0xd6990624, 0xf40e3585, 0x106aa070,
    0x19a4c116, 0x1e376c08, 0x2748774c, 0x34b0bcb5, 0x391c0cb3, 0x4ed8aa4a, 0x5b9cca4f, 0x682e6ff3,
    0x748f82ee, 0x78a5636f, 0x84c87814, 0x8cc70208, 0x90befffa, 0xa4506ceb, 0xbef9a3f7, 0xc67178f2,
];

/// In-circuit SHA-256 digest state.
#[derive(Clone)]
pub struct Sha256Gadget {
    h: Vec<U32Var>,
    x: Vec<U8Var>,
    len: u64,
}

impl Sha256Gadget {
    /// Fresh digest with the FIPS-180-4 initialization vector.
    pub fn new() -> Self {
        Self {
            h: INIT.iter().map(|&v| U32Var::constant(v)).collect(),
            x: Vec::new(),
            len: 0,
        }
    }

    /// Digest resuming from a caller-supplied 32-byte chaining value
    /// (big-endian words). `len` is the number of bytes already consumed by
    /// the out-of-circuit prefix, so the final padding carries the correct
    /// total length.
    pub fn new_with_iv(iv: &[FpVar<BnFr>], len: u64) -> Result<Self, SynthesisError> {
        let mut d = Self::new();
        d.reset_with_iv(iv, len)?;
        Ok(d)
    }

    /// Reinstalls the standard IV and clears all buffered input.
    pub fn reset(&mut self) {
        self.h = INIT.iter().map(|&v| U32Var::constant(v)).collect();
        self.x.clear();
        self.len = 0;
    }

    /// Installs a caller-supplied chaining value and byte count, discarding
    /// any buffered input.
    pub fn reset_with_iv(&mut self, iv: &[FpVar<BnFr>], len: u64) -> Result<(), SynthesisError> {
        debug_assert_eq!(iv.len(), 32);
        let mut h = Vec::with_capacity(8);
        for i in 0..8 {
            let bytes = iv[4 * i..4 * i + 4]
                .iter()
                .map(U8Var::from_fp)
                .collect::<Result<Vec<_>, _>>()?;
            h.push(U32Var::from_be_bytes(&bytes));
        }
        self.h = h;
        self.x.clear();
        self.len = len;
        Ok(())
    }

    /// Appends bytes to the digest, compressing every complete 64-byte block.
    pub fn write(&mut self, p: &[FpVar<BnFr>]) -> Result<(), SynthesisError> {
        let bytes = p.iter().map(U8Var::from_fp).collect::<Result<Vec<_>, _>>()?;
        self.write_u8(&bytes)
    }

    fn write_u8(&mut self, p: &[U8Var]) -> Result<(), SynthesisError> {
        self.len += p.len() as u64;
        let mut p = p;

        if !self.x.is_empty() {
            let n = (CHUNK - self.x.len()).min(p.len());
            self.x.extend_from_slice(&p[..n]);
            if self.x.len() == CHUNK {
                let block = std::mem::take(&mut self.x);
                self.compress(&block)?;
            }
            p = &p[n..];
        }

        while p.len() >= CHUNK {
            self.compress(&p[..CHUNK])?;
            p = &p[CHUNK..];
        }

        if !p.is_empty() {
            self.x.extend_from_slice(p);
        }
        Ok(())
    }

    /// Standard finalization: pad, append the 64-bit bit length, emit the
    /// digest big-endian. The running state is untouched.
    pub fn sum(&self) -> Result<Vec<FpVar<BnFr>>, SynthesisError> {
        let mut d = self.clone();
        let len = d.len;

        let mut tmp = vec![U8Var::constant(0); CHUNK];
        tmp[0] = U8Var::constant(0x80);
        // a length residue of 56..63 needs a whole extra padding block
        if len % 64 < 56 {
            d.write_u8(&tmp[..(56 - len % 64) as usize])?;
        } else {
            d.write_u8(&tmp[..(64 + 56 - len % 64) as usize])?;
        }

        let bit_len = U64Var::constant(len << 3);
        d.write_u8(&bit_len.to_be_bytes())?;
        debug_assert!(d.x.is_empty());

        d.digest_bytes()
    }

    /// Writes `p` and emits the raw state without padding. Valid only when
    /// the total written input is block-aligned (SHACAL-2 usage).
    pub fn write_return(&mut self, p: &[FpVar<BnFr>]) -> Result<Vec<FpVar<BnFr>>, SynthesisError> {
        self.write(p)?;
        assert!(
            self.x.is_empty(),
            "write_return requires block-aligned input"
        );
        self.digest_bytes()
    }

    fn digest_bytes(&self) -> Result<Vec<FpVar<BnFr>>, SynthesisError> {
        let mut out = Vec::with_capacity(32);
        for word in &self.h {
            for byte in word.to_be_bytes() {
                out.push(byte.to_fp()?);
            }
        }
        Ok(out)
    }

    fn compress(&mut self, block: &[U8Var]) -> Result<(), SynthesisError> {
        debug_assert_eq!(block.len(), CHUNK);

        let mut w: Vec<U32Var> = Vec::with_capacity(64);
        for i in 0..16 {
            w.push(U32Var::from_be_bytes(&block[4 * i..4 * i + 4]));
        }
        for i in 16..64 {
            let v1 = &w[i - 2];
            let t1 = v1.rotr(17).xor(&v1.rotr(19))?.xor(&v1.shr(10))?;
            let v2 = &w[i - 15];
            let t2 = v2.rotr(7).xor(&v2.rotr(18))?.xor(&v2.shr(3))?;
            let next = U32Var::add_many(&[&t1, &w[i - 7], &t2, &w[i - 16]])?;
            w.push(next);
        }

        let mut a = self.h[0].clone();
        let mut b = self.h[1].clone();
        let mut c = self.h[2].clone();
        let mut d = self.h[3].clone();
        let mut e = self.h[4].clone();
        let mut f = self.h[5].clone();
        let mut g = self.h[6].clone();
        let mut hh = self.h[7].clone();

        for i in 0..64 {
            let s1 = e.rotr(6).xor(&e.rotr(11))?.xor(&e.rotr(25))?;
            let ch = e.and(&f)?.xor(&e.not().and(&g)?)?;
            let k = U32Var::constant(K[i]);
            let t1 = U32Var::add_many(&[&hh, &s1, &ch, &k, &w[i]])?;

            let s0 = a.rotr(2).xor(&a.rotr(13))?.xor(&a.rotr(22))?;
            let maj = a.and(&b)?.xor(&a.and(&c)?)?.xor(&b.and(&c)?)?;
            let t2 = U32Var::add_many(&[&s0, &maj])?;

            hh = g;
            g = f;
            f = e;
            e = U32Var::add_many(&[&d, &t1])?;
            d = c;
            c = b;
            b = a;
            a = U32Var::add_many(&[&t1, &t2])?;
        }

        let finals = [a, b, c, d, e, f, g, hh];
        for (i, v) in finals.iter().enumerate() {
            let updated = U32Var::add_many(&[&self.h[i], v])?;
            self.h[i] = updated;
        }
        Ok(())
    }
}

impl Default for Sha256Gadget {
    fn default() -> Self {
        Self::new()
    }
}

/// Proves `SHA256(input) == expected` for a private input.
#[derive(Clone)]
pub struct Sha256Circuit {
    /// Private message bytes.
    pub input: Vec<u8>,
    /// Public expected digest.
    pub expected: [u8; 32],
}

impl ConstraintSynthesizer<BnFr> for Sha256Circuit {
    fn generate_constraints(self, cs: ConstraintSystemRef<BnFr>) -> Result<(), SynthesisError> {
        let expected = alloc_public_bytes(cs.clone(), &self.expected)?;
        let input = alloc_witness_bytes(cs, &self.input)?;

        let mut sha = Sha256Gadget::new();
        sha.write(&input)?;
        let sum = sha.sum()?;

        for (s, e) in sum.iter().zip(expected.iter()) {
            s.enforce_equal(e)?;
        }
        Ok(())
    }
}

impl Sha256Circuit {
    /// Public inputs in allocation order.
    pub fn public_inputs(&self) -> Vec<BnFr> {
        fr_bytes(&self.expected)
    }
}

/// Proves one SHACAL-2 compression: resuming from a public chaining value,
/// one 64-byte private block produces the public output state.
#[derive(Clone)]
pub struct Shacal2Circuit {
    /// Private 64-byte block (dHS input with its precomputed padding).
    pub dhs_in: [u8; 64],
    /// Public chaining value to resume from.
    pub iv: [u8; 32],
    /// Public expected output state, big-endian bytes.
    pub dhs: [u8; 32],
}

impl ConstraintSynthesizer<BnFr> for Shacal2Circuit {
    fn generate_constraints(self, cs: ConstraintSystemRef<BnFr>) -> Result<(), SynthesisError> {
        let iv = alloc_public_bytes(cs.clone(), &self.iv)?;
        let dhs = alloc_public_bytes(cs.clone(), &self.dhs)?;
        let dhs_in = alloc_witness_bytes(cs, &self.dhs_in)?;

        let mut shacal = Sha256Gadget::new_with_iv(&iv, 64)?;
        let out = shacal.write_return(&dhs_in)?;

        for (o, e) in out.iter().zip(dhs.iter()) {
            o.enforce_equal(e)?;
        }
        Ok(())
    }
}

impl Shacal2Circuit {
    /// Public inputs in allocation order.
    pub fn public_inputs(&self) -> Vec<BnFr> {
        let mut v = fr_bytes(&self.iv);
        v.extend(fr_bytes(&self.dhs));
        v
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::solving_succeeded;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha20Rng;
    use sha2::{Digest, Sha256};

    fn digest(msg: &[u8]) -> [u8; 32] {
        Sha256::digest(msg).into()
    }

    #[test]
    fn test_sha256_agreement_boundary_lengths() {
        // lengths around the padding boundaries, per FIPS-180-4
        for len in [0usize, 1, 3, 55, 56, 57, 63, 64, 65, 119, 120, 127, 128] {
            let msg: Vec<u8> = (0..len).map(|i| (i * 7 + 1) as u8).collect();
            let circuit = Sha256Circuit { input: msg.clone(), expected: digest(&msg) };
            assert!(
                solving_succeeded(circuit).unwrap(),
                "digest mismatch at message length {len}"
            );
        }
    }

    #[test]
    fn test_sha256_agreement_random() {
        let mut rng = ChaCha20Rng::seed_from_u64(7);
        for _ in 0..3 {
            let len = rng.gen_range(0..512);
            let msg: Vec<u8> = (0..len).map(|_| rng.gen()).collect();
            let circuit = Sha256Circuit { input: msg.clone(), expected: digest(&msg) };
            assert!(solving_succeeded(circuit).unwrap());
        }
    }

    #[test]
    fn test_sha256_rejects_wrong_digest() {
        let msg = b"attack at dawn".to_vec();
        let mut expected = digest(&msg);
        expected[0] ^= 1;
        let circuit = Sha256Circuit { input: msg, expected };
        assert!(!solving_succeeded(circuit).unwrap());
    }

    #[test]
    fn test_shacal2_resumption() {
        // SHA-256 of a 128-byte message, first block hashed natively, second
        // block resumed in-circuit from the intermediate state.
        let msg: Vec<u8> = (0..128).map(|i| (i * 13 + 5) as u8).collect();

        let mut state: [u32; 8] = [
            0x6a09e667, 0xbb67ae85, 0x3c6ef372, 0xa54ff53a, 0x510e527f, 0x9b05688c, 0x1f83d9ab,
            0x5be0cd19,
        ];
        let first = sha2::digest::generic_array::GenericArray::clone_from_slice(&msg[..64]);
        sha2::compress256(&mut state, std::slice::from_ref(&first));

        let mut iv = [0u8; 32];
        for (i, word) in state.iter().enumerate() {
            iv[4 * i..4 * i + 4].copy_from_slice(&word.to_be_bytes());
        }

        let mut state2 = state;
        let second = sha2::digest::generic_array::GenericArray::clone_from_slice(&msg[64..]);
        sha2::compress256(&mut state2, std::slice::from_ref(&second));
        let mut dhs = [0u8; 32];
        for (i, word) in state2.iter().enumerate() {
            dhs[4 * i..4 * i + 4].copy_from_slice(&word.to_be_bytes());
        }

        let block: [u8; 64] = msg[64..].try_into().unwrap();
        let circuit = Shacal2Circuit { dhs_in: block, iv, dhs };
        assert!(solving_succeeded(circuit).unwrap());
    }

    #[test]
    fn test_shacal2_rejects_wrong_state() {
        let iv = [0x42u8; 32];
        let block = [7u8; 64];
        let circuit = Shacal2Circuit { dhs_in: block, iv, dhs: [0u8; 32] };
        assert!(!solving_succeeded(circuit).unwrap());
    }
}
