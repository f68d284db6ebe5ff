//! Proving backend driver.
//!
//! Runs the compile / setup / prove / verify pipeline for a circuit,
//! measuring per-phase wall-clock and the compressed byte sizes of the
//! produced artifacts. Groth16 over BN254 is the wired backend; the PLONK
//! names are recognized for interface compatibility and report themselves
//! unavailable.

use std::fmt;
use std::str::FromStr;
use std::time::{Duration, Instant};

use ark_bn254::{Bn254, Fr as BnFr};
use ark_groth16::{prepare_verifying_key, Groth16};
use ark_relations::r1cs::{
    ConstraintSynthesizer, ConstraintSystem, OptimizationGoal, SynthesisMode,
};
use ark_serialize::CanonicalSerialize;
use ark_snark::{CircuitSpecificSetupSNARK, SNARK};
use ark_std::rand::{CryptoRng, RngCore};
use log::debug;

use crate::error::ProvingError;

/// Proving system selector.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Backend {
    /// Groth16 over BN254, the wired backend.
    Groth16,
    /// KZG-based PLONK; recognized, not wired into this build.
    Plonk,
    /// FRI-based PLONK; recognized, not wired into this build.
    PlonkFri,
}

impl FromStr for Backend {
    type Err = ProvingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "groth16" => Ok(Self::Groth16),
            "plonk" => Ok(Self::Plonk),
            "plonkFRI" => Ok(Self::PlonkFri),
            other => Err(ProvingError::UnknownBackend(other.to_string())),
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Groth16 => "groth16",
            Self::Plonk => "plonk",
            Self::PlonkFri => "plonkFRI",
        })
    }
}

/// Per-phase timings and artifact sizes of one proving run. Size fields stay
/// `None` when the run stops after compilation.
#[derive(Clone, Debug, Default)]
pub struct ProofStats {
    /// Constraint count after finalization.
    pub constraints: usize,
    /// Public input variable count (including the leading one).
    pub instance_variables: usize,
    /// Private witness variable count.
    pub witness_variables: usize,
    /// Constraint synthesis wall-clock.
    pub compile: Duration,
    /// Circuit-specific setup wall-clock.
    pub setup: Option<Duration>,
    /// Proving wall-clock.
    pub prove: Option<Duration>,
    /// Verification wall-clock.
    pub verify: Option<Duration>,
    /// Compressed proving key size in bytes.
    pub proving_key_bytes: Option<usize>,
    /// Compressed verifying key size in bytes.
    pub verifying_key_bytes: Option<usize>,
    /// Compressed proof size in bytes.
    pub proof_bytes: Option<usize>,
    /// Compressed public input size in bytes.
    pub public_input_bytes: Option<usize>,
}

/// Compiles and, unless `compile_only` is set, proves and verifies `circuit`
/// with the requested backend, returning per-phase measurements.
///
/// `public_inputs` must match the circuit's input allocation order (every
/// circuit type exposes a `public_inputs()` accessor for this).
pub fn proof_with_backend<C, R>(
    backend: Backend,
    compile_only: bool,
    circuit: C,
    public_inputs: &[BnFr],
    rng: &mut R,
) -> Result<ProofStats, ProvingError>
where
    C: ConstraintSynthesizer<BnFr> + Clone,
    R: RngCore + CryptoRng,
{
    if backend != Backend::Groth16 {
        return Err(ProvingError::UnsupportedBackend(backend.to_string()));
    }

    // compile
    let start = Instant::now();
    let cs = ConstraintSystem::<BnFr>::new_ref();
    cs.set_optimization_goal(OptimizationGoal::Constraints);
    cs.set_mode(SynthesisMode::Setup);
    circuit.clone().generate_constraints(cs.clone())?;
    cs.finalize();
    let compile = start.elapsed();

    let mut stats = ProofStats {
        constraints: cs.num_constraints(),
        instance_variables: cs.num_instance_variables(),
        witness_variables: cs.num_witness_variables(),
        compile,
        ..ProofStats::default()
    };
    debug!(
        "compiled constraint system: {} constraints, {} instance, {} witness, {:?}",
        stats.constraints, stats.instance_variables, stats.witness_variables, compile
    );
    if compile_only {
        return Ok(stats);
    }

    // setup
    let start = Instant::now();
    let (pk, vk) = Groth16::<Bn254>::setup(circuit.clone(), rng)?;
    stats.setup = Some(start.elapsed());
    stats.proving_key_bytes = Some(pk.compressed_size());
    stats.verifying_key_bytes = Some(vk.compressed_size());
    debug!(
        "groth16 setup in {:?}, pk {} bytes, vk {} bytes",
        stats.setup.unwrap_or_default(),
        stats.proving_key_bytes.unwrap_or_default(),
        stats.verifying_key_bytes.unwrap_or_default()
    );

    // prove
    let start = Instant::now();
    let proof = Groth16::<Bn254>::prove(&pk, circuit, rng)?;
    stats.prove = Some(start.elapsed());
    stats.proof_bytes = Some(proof.compressed_size());
    stats.public_input_bytes = Some(public_inputs.compressed_size());
    debug!(
        "groth16 prove in {:?}, proof {} bytes, public inputs {} bytes",
        stats.prove.unwrap_or_default(),
        stats.proof_bytes.unwrap_or_default(),
        stats.public_input_bytes.unwrap_or_default()
    );

    // verify
    let start = Instant::now();
    let pvk = prepare_verifying_key(&vk);
    let accepted = Groth16::<Bn254>::verify_with_processed_vk(&pvk, public_inputs, &proof)?;
    stats.verify = Some(start.elapsed());
    debug!("groth16 verify in {:?}: {}", stats.verify.unwrap_or_default(), accepted);

    if !accepted {
        return Err(ProvingError::VerificationFailed);
    }
    Ok(stats)
}

/// Synthesizes the circuit with its witness and reports whether every
/// constraint is satisfied. The cheap correctness check used throughout the
/// gadget tests.
pub fn solving_succeeded<C>(circuit: C) -> Result<bool, ProvingError>
where
    C: ConstraintSynthesizer<BnFr>,
{
    let cs = ConstraintSystem::<BnFr>::new_ref();
    circuit.generate_constraints(cs.clone())?;
    let satisfied = cs.is_satisfied()?;
    if !satisfied {
        debug!("unsatisfied constraint: {:?}", cs.which_is_unsatisfied()?);
    }
    Ok(satisfied)
}

/// Full Groth16 round: setup, prove, verify. Returns the verifier's verdict.
pub fn prover_succeeded<C, R>(
    circuit: C,
    public_inputs: &[BnFr],
    rng: &mut R,
) -> Result<bool, ProvingError>
where
    C: ConstraintSynthesizer<BnFr> + Clone,
    R: RngCore + CryptoRng,
{
    let (pk, vk) = Groth16::<Bn254>::setup(circuit.clone(), rng)?;
    let proof = Groth16::<Bn254>::prove(&pk, circuit, rng)?;
    let pvk = prepare_verifying_key(&vk);
    Ok(Groth16::<Bn254>::verify_with_processed_vk(&pvk, public_inputs, &proof)?)
}
