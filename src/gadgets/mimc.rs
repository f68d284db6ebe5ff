//! MiMC permutation over the BN254 scalar field.
//!
//! Exponent-5 rounds with constants drawn from an iterated Keccak-256 chain,
//! chained over multiple inputs with Miyaguchi-Preneel. The native and
//! in-circuit versions share the constant schedule, so a digest computed by
//! [`Mimc`] is exactly what [`MimcGadget`] reproduces inside the circuit.

use ark_bn254::Fr as BnFr;
use ark_ff::{Field, PrimeField};
use ark_r1cs_std::fields::{fp::FpVar, FieldVar};
use ark_relations::r1cs::SynthesisError;
use sha3::{Digest, Keccak256};

/// Number of exponent-5 rounds for 128-bit security on BN254.
pub const MIMC_ROUNDS: usize = 110;

const SEED: &[u8] = b"zktls-oracle.mimc.bn254";

fn round_constants() -> Vec<BnFr> {
    let mut constants = Vec::with_capacity(MIMC_ROUNDS);
    let mut state = Keccak256::digest(SEED);
    for _ in 0..MIMC_ROUNDS {
        state = Keccak256::digest(state);
        constants.push(BnFr::from_be_bytes_mod_order(&state));
    }
    constants
}

/// Native MiMC, used by the witness side and tests.
pub struct Mimc {
    constants: Vec<BnFr>,
}

impl Mimc {
    pub fn new() -> Self {
        Self { constants: round_constants() }
    }

    fn permute(&self, m: BnFr, k: BnFr) -> BnFr {
        let mut x = m;
        for c in &self.constants {
            let t = x + k + c;
            x = t.square().square() * t;
        }
        x + k
    }

    /// Miyaguchi-Preneel chain over the inputs; empty input hashes to zero.
    pub fn hash(&self, inputs: &[BnFr]) -> BnFr {
        let mut h = BnFr::from(0u64);
        for &m in inputs {
            h = self.permute(m, h) + h + m;
        }
        h
    }
}

impl Default for Mimc {
    fn default() -> Self {
        Self::new()
    }
}

/// In-circuit MiMC with the same constant schedule.
pub struct MimcGadget {
    constants: Vec<BnFr>,
}

impl MimcGadget {
    pub fn new() -> Self {
        Self { constants: round_constants() }
    }

    fn permute(&self, m: &FpVar<BnFr>, k: &FpVar<BnFr>) -> Result<FpVar<BnFr>, SynthesisError> {
        let mut x = m.clone();
        for c in &self.constants {
            let t = &x + k + FpVar::constant(*c);
            x = t.square()?.square()? * &t;
        }
        Ok(x + k)
    }

    /// Absorbs the inputs Miyaguchi-Preneel style and returns the digest
    /// element.
    pub fn hash(&self, inputs: &[FpVar<BnFr>]) -> Result<FpVar<BnFr>, SynthesisError> {
        let mut h = FpVar::<BnFr>::zero();
        for m in inputs {
            let p = self.permute(m, &h)?;
            h = p + &h + m;
        }
        Ok(h)
    }
}

impl Default for MimcGadget {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_r1cs_std::{alloc::AllocVar, eq::EqGadget};
    use ark_relations::r1cs::ConstraintSystem;
    use ark_std::UniformRand;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    #[test]
    fn test_native_and_gadget_agree() {
        let mut rng = ChaCha20Rng::seed_from_u64(3);
        let inputs: Vec<BnFr> = (0..5).map(|_| BnFr::rand(&mut rng)).collect();
        let expected = Mimc::new().hash(&inputs);

        let cs = ConstraintSystem::<BnFr>::new_ref();
        let vars: Vec<FpVar<BnFr>> = inputs
            .iter()
            .map(|v| FpVar::new_witness(cs.clone(), || Ok(*v)).unwrap())
            .collect();
        let digest = MimcGadget::new().hash(&vars).unwrap();
        digest.enforce_equal(&FpVar::constant(expected)).unwrap();
        assert!(cs.is_satisfied().unwrap());
    }

    #[test]
    fn test_empty_input_is_zero() {
        assert_eq!(Mimc::new().hash(&[]), BnFr::from(0u64));
    }

    #[test]
    fn test_order_sensitivity() {
        let mimc = Mimc::new();
        let a = mimc.hash(&[BnFr::from(1u64), BnFr::from(2u64)]);
        let b = mimc.hash(&[BnFr::from(2u64), BnFr::from(1u64)]);
        assert_ne!(a, b);
    }
}
