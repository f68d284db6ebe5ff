//! ASCII decimal to field element conversion.

use ark_bn254::Fr as BnFr;
use ark_ff::Field;
use ark_r1cs_std::{
    eq::EqGadget,
    fields::{fp::FpVar, FieldVar},
};
use ark_relations::r1cs::{ConstraintSynthesizer, ConstraintSystemRef, SynthesisError};
use core::cmp::Ordering;

use crate::bits::{from_bits, to_bits};

use super::alloc_witness_bytes;

/// Converts an ASCII digit string to its integer value in the field.
///
/// Every byte is range-constrained to `[0x30, 0x39]`, so a malicious witness
/// cannot smuggle non-digit bytes into the accumulated value. Signs, decimal
/// points and leading zeros get no special treatment; an empty slice yields
/// zero.
pub fn string_to_int(digits: &[FpVar<BnFr>]) -> Result<FpVar<BnFr>, SynthesisError> {
    let zero_char = FpVar::constant(BnFr::from(0x30u64));
    let nine_char = FpVar::constant(BnFr::from(0x39u64));

    let mut sum = FpVar::<BnFr>::zero();
    for (k, byte) in digits.iter().rev().enumerate() {
        // constrain to 8 bits, then to the digit range
        let byte = from_bits(&to_bits(byte, 8)?)?;
        zero_char.enforce_cmp(&byte, Ordering::Less, true)?;
        byte.enforce_cmp(&nine_char, Ordering::Less, true)?;

        let digit = &byte - &zero_char;
        let weight = BnFr::from(10u64).pow([k as u64]);
        sum += digit * FpVar::constant(weight);
    }
    Ok(sum)
}

/// Proves a private digit window parses to a public integer.
#[derive(Clone)]
pub struct Str2IntCircuit {
    /// Private plaintext buffer.
    pub plain_chunks: Vec<u8>,
    /// Public parsed value.
    pub value: u64,
    /// Digit window start (structural).
    pub value_start: usize,
    /// Digit window end (structural).
    pub value_end: usize,
}

impl ConstraintSynthesizer<BnFr> for Str2IntCircuit {
    fn generate_constraints(self, cs: ConstraintSystemRef<BnFr>) -> Result<(), SynthesisError> {
        use ark_r1cs_std::alloc::AllocVar;
        let value = FpVar::new_input(cs.clone(), || Ok(BnFr::from(self.value)))?;
        let plain = alloc_witness_bytes(cs, &self.plain_chunks)?;

        let parsed = string_to_int(&plain[self.value_start..self.value_end])?;
        parsed.enforce_equal(&value)
    }
}

impl Str2IntCircuit {
    /// Public inputs in allocation order.
    pub fn public_inputs(&self) -> Vec<BnFr> {
        vec![BnFr::from(self.value)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::solving_succeeded;

    fn circuit_for(digits: &str, value: u64) -> Str2IntCircuit {
        Str2IntCircuit {
            plain_chunks: digits.as_bytes().to_vec(),
            value,
            value_start: 0,
            value_end: digits.len(),
        }
    }

    #[test]
    fn test_parses_decimal() {
        assert!(solving_succeeded(circuit_for("38002", 38002)).unwrap());
    }

    #[test]
    fn test_leading_zeros() {
        assert!(solving_succeeded(circuit_for("00001", 1)).unwrap());
    }

    #[test]
    fn test_empty_window_is_zero() {
        assert!(solving_succeeded(circuit_for("", 0)).unwrap());
    }

    #[test]
    fn test_wrong_value_rejected() {
        assert!(!solving_succeeded(circuit_for("38002", 38003)).unwrap());
    }

    #[test]
    fn test_non_digit_rejected() {
        // ':' is 0x3a, one past '9'; the range constraint must catch it
        let mut circuit = circuit_for("38:02", 0);
        // value that the unconstrained accumulator would produce
        circuit.value = 3 * 10000 + 8 * 1000 + 10 * 100 + 0 * 10 + 2;
        assert!(!solving_succeeded(circuit).unwrap());
    }

    #[test]
    fn test_value_window_inside_record() {
        // plaintext chunk from a captured session: ...,"price":"38002.2",...
        let plain = hex::decode("302c353631204575726f227d2c227072696365223a2233383030322e32222c22")
            .unwrap();
        let circuit = Str2IntCircuit {
            plain_chunks: plain,
            value: 38002,
            value_start: 22,
            value_end: 27,
        };
        assert!(solving_succeeded(circuit).unwrap());
    }
}
