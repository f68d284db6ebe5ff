//! Bit-decomposed integer views over circuit variables.
//!
//! Gadgets exchange bytes as `FpVar<Fr>` field elements. The first gadget
//! that needs bit access converts through [`U8Var::from_fp`], which allocates
//! the boolean witnesses and asserts the recomposition once; everything
//! downstream reuses the same bit array. Bits are stored LSB-first.

use ark_bn254::Fr as BnFr;
use ark_ff::{BigInteger, PrimeField};
use ark_r1cs_std::fields::fp::FpVar;
use ark_r1cs_std::prelude::*;
use ark_relations::r1cs::SynthesisError;

/// Decomposes `v` into `n` boolean bits (LSB-first) and asserts
/// `sum(b_i * 2^i) == v`. Constant inputs produce constant bits without
/// touching the constraint system.
pub fn to_bits(v: &FpVar<BnFr>, n: usize) -> Result<Vec<Boolean<BnFr>>, SynthesisError> {
    if let FpVar::Constant(c) = v {
        let repr = c.into_bigint();
        return Ok((0..n).map(|i| Boolean::constant(repr.get_bit(i))).collect());
    }

    let cs = v.cs();
    let mut bits = Vec::with_capacity(n);
    for i in 0..n {
        bits.push(Boolean::new_witness(cs.clone(), || {
            Ok(v.value()?.into_bigint().get_bit(i))
        })?);
    }
    let recomposed = Boolean::le_bits_to_fp_var(&bits)?;
    recomposed.enforce_equal(v)?;
    Ok(bits)
}

/// Recomposes LSB-first bits into a field element.
pub fn from_bits(bits: &[Boolean<BnFr>]) -> Result<FpVar<BnFr>, SynthesisError> {
    Boolean::le_bits_to_fp_var(bits)
}

/// Bitwise XOR of two field elements interpreted as `size`-bit integers.
///
/// Both operands are range-constrained to `size` bits by the decomposition.
pub fn variable_xor(
    a: &FpVar<BnFr>,
    b: &FpVar<BnFr>,
    size: usize,
) -> Result<FpVar<BnFr>, SynthesisError> {
    let a_bits = to_bits(a, size)?;
    let b_bits = to_bits(b, size)?;
    let mut out = Vec::with_capacity(size);
    for (x, y) in a_bits.iter().zip(b_bits.iter()) {
        out.push(x.xor(y)?);
    }
    from_bits(&out)
}

fn xor_bits(
    a: &[Boolean<BnFr>],
    b: &[Boolean<BnFr>],
) -> Result<Vec<Boolean<BnFr>>, SynthesisError> {
    a.iter().zip(b.iter()).map(|(x, y)| x.xor(y)).collect()
}

fn and_bits(
    a: &[Boolean<BnFr>],
    b: &[Boolean<BnFr>],
) -> Result<Vec<Boolean<BnFr>>, SynthesisError> {
    a.iter().zip(b.iter()).map(|(x, y)| x.and(y)).collect()
}

fn or_bits(
    a: &[Boolean<BnFr>],
    b: &[Boolean<BnFr>],
) -> Result<Vec<Boolean<BnFr>>, SynthesisError> {
    a.iter().zip(b.iter()).map(|(x, y)| x.or(y)).collect()
}

/// An 8-bit value backed by boolean circuit variables, LSB-first.
#[derive(Clone)]
pub struct U8Var {
    pub(crate) bits: Vec<Boolean<BnFr>>,
}

impl U8Var {
    /// Constant byte; no witnesses allocated.
    pub fn constant(v: u8) -> Self {
        Self {
            bits: (0..8).map(|i| Boolean::constant((v >> i) & 1 == 1)).collect(),
        }
    }

    /// Decomposes a field element into a byte view, asserting it fits 8 bits.
    pub fn from_fp(v: &FpVar<BnFr>) -> Result<Self, SynthesisError> {
        Ok(Self { bits: to_bits(v, 8)? })
    }

    /// Wraps existing bits (LSB-first). Callers guarantee `bits.len() == 8`.
    pub fn from_bits(bits: &[Boolean<BnFr>]) -> Self {
        debug_assert_eq!(bits.len(), 8);
        Self { bits: bits.to_vec() }
    }

    /// Linear recomposition back to a field element.
    pub fn to_fp(&self) -> Result<FpVar<BnFr>, SynthesisError> {
        from_bits(&self.bits)
    }

    pub fn xor(&self, other: &Self) -> Result<Self, SynthesisError> {
        Ok(Self { bits: xor_bits(&self.bits, &other.bits)? })
    }

    pub fn and(&self, other: &Self) -> Result<Self, SynthesisError> {
        Ok(Self { bits: and_bits(&self.bits, &other.bits)? })
    }

    pub fn or(&self, other: &Self) -> Result<Self, SynthesisError> {
        Ok(Self { bits: or_bits(&self.bits, &other.bits)? })
    }

    pub fn not(&self) -> Self {
        Self { bits: self.bits.iter().map(|b| b.not()).collect() }
    }

    /// GF(2^8) doubling under the AES polynomial x^8 + x^4 + x^3 + x + 1.
    pub fn xtime(&self) -> Result<Self, SynthesisError> {
        let hi = &self.bits[7];
        let mut out = Vec::with_capacity(8);
        // shift left, then fold the carry back through 0x1b
        out.push(hi.clone()); // bit 0
        out.push(self.bits[0].xor(hi)?); // bit 1
        out.push(self.bits[1].clone()); // bit 2
        out.push(self.bits[2].xor(hi)?); // bit 3
        out.push(self.bits[3].xor(hi)?); // bit 4
        out.push(self.bits[4].clone()); // bit 5
        out.push(self.bits[5].clone()); // bit 6
        out.push(self.bits[6].clone()); // bit 7
        Ok(Self { bits: out })
    }
}

/// A 32-bit word backed by boolean circuit variables, LSB-first.
#[derive(Clone)]
pub struct U32Var {
    pub(crate) bits: Vec<Boolean<BnFr>>,
}

impl U32Var {
    pub fn constant(v: u32) -> Self {
        Self {
            bits: (0..32).map(|i| Boolean::constant((v >> i) & 1 == 1)).collect(),
        }
    }

    /// Decomposes a field element into a word view, asserting it fits 32 bits.
    pub fn from_fp(v: &FpVar<BnFr>) -> Result<Self, SynthesisError> {
        Ok(Self { bits: to_bits(v, 32)? })
    }

    /// Builds a word from four big-endian bytes.
    pub fn from_be_bytes(bytes: &[U8Var]) -> Self {
        debug_assert_eq!(bytes.len(), 4);
        let mut bits = Vec::with_capacity(32);
        // byte 3 is least significant
        for j in (0..4).rev() {
            bits.extend(bytes[j].bits.iter().cloned());
        }
        Self { bits }
    }

    /// Splits the word into four big-endian bytes.
    pub fn to_be_bytes(&self) -> Vec<U8Var> {
        (0..4)
            .map(|j| U8Var::from_bits(&self.bits[(3 - j) * 8..(3 - j) * 8 + 8]))
            .collect()
    }

    pub fn to_fp(&self) -> Result<FpVar<BnFr>, SynthesisError> {
        from_bits(&self.bits)
    }

    pub fn xor(&self, other: &Self) -> Result<Self, SynthesisError> {
        Ok(Self { bits: xor_bits(&self.bits, &other.bits)? })
    }

    pub fn and(&self, other: &Self) -> Result<Self, SynthesisError> {
        Ok(Self { bits: and_bits(&self.bits, &other.bits)? })
    }

    pub fn or(&self, other: &Self) -> Result<Self, SynthesisError> {
        Ok(Self { bits: or_bits(&self.bits, &other.bits)? })
    }

    pub fn not(&self) -> Self {
        Self { bits: self.bits.iter().map(|b| b.not()).collect() }
    }

    /// Rotate right; pure bit rearrangement, no constraints.
    pub fn rotr(&self, k: usize) -> Self {
        Self {
            bits: (0..32).map(|i| self.bits[(i + k) % 32].clone()).collect(),
        }
    }

    /// Rotate left.
    pub fn rotl(&self, k: usize) -> Self {
        self.rotr(32 - (k % 32))
    }

    /// Logical shift right; zero-fills from the top.
    pub fn shr(&self, k: usize) -> Self {
        Self {
            bits: (0..32)
                .map(|i| {
                    if i + k < 32 {
                        self.bits[i + k].clone()
                    } else {
                        Boolean::constant(false)
                    }
                })
                .collect(),
        }
    }

    /// Logical shift left; zero-fills from the bottom.
    pub fn shl(&self, k: usize) -> Self {
        Self {
            bits: (0..32)
                .map(|i| {
                    if i >= k {
                        self.bits[i - k].clone()
                    } else {
                        Boolean::constant(false)
                    }
                })
                .collect(),
        }
    }

    /// Addition of several words modulo 2^32. The sum is recomposed into one
    /// field element and re-decomposed with enough headroom for the carries;
    /// bits above 32 are discarded.
    pub fn add_many(words: &[&U32Var]) -> Result<U32Var, SynthesisError> {
        debug_assert!(!words.is_empty());
        let mut sum = FpVar::<BnFr>::zero();
        for w in words {
            sum += w.to_fp()?;
        }
        let mut extra = 0usize;
        while (1usize << extra) < words.len() {
            extra += 1;
        }
        let bits = to_bits(&sum, 32 + extra)?;
        Ok(U32Var { bits: bits[..32].to_vec() })
    }
}

/// A 64-bit value backed by boolean circuit variables, LSB-first. Only needed
/// for the SHA-256 length block.
#[derive(Clone)]
pub struct U64Var {
    pub(crate) bits: Vec<Boolean<BnFr>>,
}

impl U64Var {
    pub fn constant(v: u64) -> Self {
        Self {
            bits: (0..64).map(|i| Boolean::constant((v >> i) & 1 == 1)).collect(),
        }
    }

    /// Splits the value into eight big-endian bytes.
    pub fn to_be_bytes(&self) -> Vec<U8Var> {
        (0..8)
            .map(|j| U8Var::from_bits(&self.bits[(7 - j) * 8..(7 - j) * 8 + 8]))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_relations::r1cs::ConstraintSystem;

    fn witness_byte(
        cs: &ark_relations::r1cs::ConstraintSystemRef<BnFr>,
        v: u8,
    ) -> FpVar<BnFr> {
        FpVar::new_witness(cs.clone(), || Ok(BnFr::from(v as u64))).unwrap()
    }

    #[test]
    fn test_to_bits_roundtrip() {
        let cs = ConstraintSystem::<BnFr>::new_ref();
        let v = witness_byte(&cs, 0xa7);
        let bits = to_bits(&v, 8).unwrap();
        let back = from_bits(&bits).unwrap();
        back.enforce_equal(&v).unwrap();
        assert!(cs.is_satisfied().unwrap());
    }

    #[test]
    fn test_to_bits_rejects_overflow() {
        let cs = ConstraintSystem::<BnFr>::new_ref();
        let v = FpVar::new_witness(cs.clone(), || Ok(BnFr::from(256u64))).unwrap();
        let _ = to_bits(&v, 8).unwrap();
        assert!(!cs.is_satisfied().unwrap());
    }

    #[test]
    fn test_variable_xor() {
        let cs = ConstraintSystem::<BnFr>::new_ref();
        let a = witness_byte(&cs, 0x36);
        let b = witness_byte(&cs, 0x5c);
        let x = variable_xor(&a, &b, 8).unwrap();
        x.enforce_equal(&FpVar::constant(BnFr::from((0x36u8 ^ 0x5c) as u64)))
            .unwrap();
        assert!(cs.is_satisfied().unwrap());
    }

    #[test]
    fn test_u32_rotations_and_shifts() {
        let cs = ConstraintSystem::<BnFr>::new_ref();
        let raw = 0x6a09e667u32;
        let fp = FpVar::new_witness(cs.clone(), || Ok(BnFr::from(raw as u64))).unwrap();
        let w = U32Var::from_fp(&fp).unwrap();

        for k in [1usize, 7, 13, 31] {
            let r = w.rotr(k).to_fp().unwrap();
            r.enforce_equal(&FpVar::constant(BnFr::from(raw.rotate_right(k as u32) as u64)))
                .unwrap();
            let l = w.rotl(k).to_fp().unwrap();
            l.enforce_equal(&FpVar::constant(BnFr::from(raw.rotate_left(k as u32) as u64)))
                .unwrap();
            let s = w.shr(k).to_fp().unwrap();
            s.enforce_equal(&FpVar::constant(BnFr::from((raw >> k) as u64)))
                .unwrap();
            let t = w.shl(k).to_fp().unwrap();
            t.enforce_equal(&FpVar::constant(BnFr::from((raw << k) as u64)))
                .unwrap();
        }
        assert!(cs.is_satisfied().unwrap());
    }

    #[test]
    fn test_u32_add_many_wraps() {
        let cs = ConstraintSystem::<BnFr>::new_ref();
        let vals = [0xffff_fff0u32, 0x20, 0x1234_5678];
        let words: Vec<U32Var> = vals
            .iter()
            .map(|&v| {
                let fp = FpVar::new_witness(cs.clone(), || Ok(BnFr::from(v as u64))).unwrap();
                U32Var::from_fp(&fp).unwrap()
            })
            .collect();
        let refs: Vec<&U32Var> = words.iter().collect();
        let sum = U32Var::add_many(&refs).unwrap();
        let expected = vals.iter().fold(0u32, |a, &b| a.wrapping_add(b));
        sum.to_fp()
            .unwrap()
            .enforce_equal(&FpVar::constant(BnFr::from(expected as u64)))
            .unwrap();
        assert!(cs.is_satisfied().unwrap());
    }

    #[test]
    fn test_u8_xtime() {
        let cs = ConstraintSystem::<BnFr>::new_ref();
        for &(input, expected) in &[(0x57u8, 0xaeu8), (0xae, 0x47), (0x80, 0x1b), (0x01, 0x02)] {
            let fp = witness_byte(&cs, input);
            let b = U8Var::from_fp(&fp).unwrap();
            b.xtime()
                .unwrap()
                .to_fp()
                .unwrap()
                .enforce_equal(&FpVar::constant(BnFr::from(expected as u64)))
                .unwrap();
        }
        assert!(cs.is_satisfied().unwrap());
    }

    #[test]
    fn test_u32_be_byte_order() {
        let w = U32Var::constant(0x0a0b0c0d);
        let bytes = w.to_be_bytes();
        let expected = [0x0au8, 0x0b, 0x0c, 0x0d];
        for (b, e) in bytes.iter().zip(expected.iter()) {
            let got = b.to_fp().unwrap();
            if let FpVar::Constant(c) = got {
                assert_eq!(c, BnFr::from(*e as u64));
            } else {
                panic!("constant byte expected");
            }
        }
    }
}
