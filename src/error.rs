//! Error types for the witness and proving layers.
//!
//! Witness errors surface before any circuit is built; proving errors wrap
//! whatever the backend reports. An unsatisfied constraint is a single
//! terminal error, never a recoverable condition.

use ark_relations::r1cs::SynthesisError;

/// Errors raised while decoding and assembling a witness from JSON.
#[derive(Debug, thiserror::Error)]
pub enum WitnessError {
    /// The witness document is not valid JSON or misses required fields.
    #[error("witness JSON parse failed: {0}")]
    Json(#[from] serde_json::Error),

    /// A hex-encoded field contains non-hex characters or an odd length.
    #[error("invalid hex in witness field `{field}`: {source}")]
    HexDecode {
        /// Name of the offending JSON field.
        field: &'static str,
        /// Decoder failure detail.
        #[source]
        source: hex::FromHexError,
    },

    /// A field decoded to a different byte count than the circuit expects.
    #[error("witness field `{field}` expects {expected} bytes, got {actual}")]
    LengthMismatch {
        /// Name of the offending JSON field.
        field: &'static str,
        /// Expected byte count.
        expected: usize,
        /// Actual byte count after decoding.
        actual: usize,
    },

    /// An integer field (possibly string-encoded) failed to parse.
    #[error("witness field `{field}` is not a valid integer: {value}")]
    InvalidInteger {
        /// Name of the offending JSON field.
        field: &'static str,
        /// The raw value as found in the document.
        value: String,
    },
}

/// Errors raised by the proving driver.
#[derive(Debug, thiserror::Error)]
pub enum ProvingError {
    /// Constraint synthesis failed, or the witness does not satisfy the
    /// constraint system.
    #[error("constraint synthesis failed: {0}")]
    Synthesis(#[from] SynthesisError),

    /// A recognized backend name that this build does not wire up.
    #[error("backend `{0}` is not available in this build")]
    UnsupportedBackend(String),

    /// The backend name is not one of `groth16`, `plonk`, `plonkFRI`.
    #[error("unknown backend `{0}`")]
    UnknownBackend(String),

    /// The generated proof did not verify against the public inputs.
    #[error("proof verification failed")]
    VerificationFailed,

    /// Artifact size measurement failed to serialize a key or proof.
    #[error("artifact serialization failed: {0}")]
    Serialization(#[from] ark_serialize::SerializationError),
}
