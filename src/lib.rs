//! Zero-knowledge circuits over TLS 1.3 sessions - Groth16/BN254
//!
//! This crate builds the arithmetic circuits behind a TLS oracle proof: given
//! the recorded ciphertext of a TLS 1.3 session, the prover shows that
//!
//! 1. the TLS 1.3 key schedule derives a specific AES-128-GCM traffic key,
//! 2. that key is consistent with the public authentication-tag inputs
//!    (`ECB_K(0^128)` and `ECB_K(IV||ctr)`),
//! 3. a chosen record chunk decrypts to a known plaintext under CTR mode, and
//! 4. the plaintext carries an expected substring and a decimal value above a
//!    public threshold,
//!
//! all without revealing the traffic key or the surrounding plaintext.
//!
//! Circuits are R1CS over the BN254 scalar field (`ark_bn254::Fr`) and prove
//! with Groth16. The gadget layer (`gadgets`) composes as a strict DAG:
//! bit helpers feed AES and SHA-256, SHA-256 feeds HMAC and the key schedule,
//! AES feeds the CTR/record layer, and `gadgets::oracle` wires everything into
//! the end-to-end predicate.

#![forbid(unsafe_code)]

pub mod backend;
pub mod bits;
pub mod error;
pub mod gadgets;
pub mod witness;

// Re-export main types
pub use backend::{proof_with_backend, prover_succeeded, solving_succeeded, Backend, ProofStats};
pub use error::{ProvingError, WitnessError};
pub use gadgets::oracle::OracleCircuit;
pub use gadgets::record::RecordOffsets;
pub use witness::{Direction, OracleParams};
