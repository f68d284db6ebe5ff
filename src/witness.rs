//! Witness loading and circuit assembly.
//!
//! The proof pipeline hands over a JSON document with hex-encoded byte
//! strings (no `0x` prefix) and integers that may arrive as numbers or as
//! decimal strings. Everything here fails with a descriptive
//! [`WitnessError`] before any circuit is built; length and offset problems
//! never reach the constraint system.

use serde::Deserialize;
use serde_json::Value;

use crate::error::WitnessError;
use crate::gadgets::oracle::OracleCircuit;
use crate::gadgets::record::RecordOffsets;

/// Which application-traffic direction the proof targets. The witness
/// document transports both key sets; the circuit consumes one.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    /// Server-to-client traffic (`ivSapp` / `SATSin` / `tkSAPPin`).
    Server,
    /// Client-to-server traffic (`ivCapp` / `CATSin` / `tkCAPPin`).
    Client,
}

/// Raw oracle witness document, one field per recognized JSON key.
/// Unrecognized keys are ignored.
#[derive(Clone, Debug, Deserialize)]
pub struct OracleParams {
    /// 32 secret bytes of the dHS expansion block.
    #[serde(rename = "dHSin")]
    pub dhs_in: String,
    /// Outer-HMAC intermediate state for the SHACAL-2 resumption.
    #[serde(rename = "intermediateHashHSopad")]
    pub intermediate_hash_hs_opad: String,
    /// Master-secret expansion input.
    #[serde(rename = "MSin")]
    pub ms_in: String,
    /// Server traffic-secret expansion input.
    #[serde(rename = "SATSin")]
    pub sats_in: String,
    /// Client traffic-secret expansion input.
    #[serde(rename = "CATSin")]
    pub cats_in: String,
    /// Server traffic-key expansion input.
    #[serde(rename = "tkSAPPin")]
    pub tk_sapp_in: String,
    /// Client traffic-key expansion input.
    #[serde(rename = "tkCAPPin")]
    pub tk_capp_in: String,
    /// Tag mask commitment.
    #[serde(rename = "ECB0")]
    pub ecb0: String,
    /// GHASH subkey commitment.
    #[serde(rename = "ECBK")]
    pub ecbk: String,
    /// Server record nonce.
    #[serde(rename = "ivSapp")]
    pub iv_sapp: String,
    /// Client record nonce.
    #[serde(rename = "ivCapp")]
    pub iv_capp: String,
    /// Ciphertext of the selected chunks.
    pub cipher_chunks: String,
    /// Plaintext of the selected chunks.
    pub plain_chunks: String,
    /// Counter of the first verified block.
    pub chunk_index: Value,
    /// Expected substring, plain ASCII.
    pub substring: String,
    /// Substring window start within `plain_chunks`.
    pub substring_start: Value,
    /// Substring window end.
    pub substring_end: Value,
    /// Value window start.
    pub value_start: Value,
    /// Value window end.
    pub value_end: Value,
    /// Record sequence number, 8 hex-encoded bytes. Absent means the first
    /// record of the connection (all zero).
    #[serde(default)]
    pub sequence_number: String,
}

impl OracleParams {
    /// Parses a witness document.
    pub fn from_json(doc: &str) -> Result<Self, WitnessError> {
        Ok(serde_json::from_str(doc)?)
    }

    /// Assembles the end-to-end circuit for one traffic direction. The
    /// policy threshold is fixed by the verifier, not the document.
    pub fn assemble(
        &self,
        direction: Direction,
        threshold: u64,
    ) -> Result<OracleCircuit, WitnessError> {
        let dhs_secret: [u8; 32] = hex_array("dHSin", &self.dhs_in)?;
        let intermediate_hash_hs_opad: [u8; 32] =
            hex_array("intermediateHashHSopad", &self.intermediate_hash_hs_opad)?;
        let ms_in: [u8; 32] = hex_array("MSin", &self.ms_in)?;
        let ecb0: [u8; 16] = hex_array("ECB0", &self.ecb0)?;
        let ecbk: [u8; 16] = hex_array("ECBK", &self.ecbk)?;

        let (iv, xats_in, tk_xapp_in): ([u8; 12], [u8; 32], [u8; 32]) = match direction {
            Direction::Server => (
                hex_array("ivSapp", &self.iv_sapp)?,
                hex_array("SATSin", &self.sats_in)?,
                hex_array("tkSAPPin", &self.tk_sapp_in)?,
            ),
            Direction::Client => (
                hex_array("ivCapp", &self.iv_capp)?,
                hex_array("CATSin", &self.cats_in)?,
                hex_array("tkCAPPin", &self.tk_capp_in)?,
            ),
        };

        let cipher_chunks = hex_field("cipher_chunks", &self.cipher_chunks)?;
        let plain_chunks = hex_field("plain_chunks", &self.plain_chunks)?;
        if cipher_chunks.len() != plain_chunks.len() {
            return Err(WitnessError::LengthMismatch {
                field: "cipher_chunks",
                expected: plain_chunks.len(),
                actual: cipher_chunks.len(),
            });
        }

        let sequence_number: [u8; 8] = if self.sequence_number.is_empty() {
            [0u8; 8]
        } else {
            hex_array("sequence_number", &self.sequence_number)?
        };

        let chunk_index = int_field("chunk_index", &self.chunk_index)?;
        let offsets = RecordOffsets {
            substring_start: int_field("substring_start", &self.substring_start)? as usize,
            substring_end: int_field("substring_end", &self.substring_end)? as usize,
            value_start: int_field("value_start", &self.value_start)? as usize,
            value_end: int_field("value_end", &self.value_end)? as usize,
        };

        let substring = self.substring.as_bytes().to_vec();
        if offsets.substring_end - offsets.substring_start != substring.len() {
            return Err(WitnessError::LengthMismatch {
                field: "substring",
                expected: offsets.substring_end - offsets.substring_start,
                actual: substring.len(),
            });
        }
        for (field, end) in [
            ("substring_end", offsets.substring_end),
            ("value_end", offsets.value_end),
        ] {
            if end > plain_chunks.len() {
                return Err(WitnessError::LengthMismatch {
                    field,
                    expected: plain_chunks.len(),
                    actual: end,
                });
            }
        }

        // dHS block: secret half plus precomputed padding for the 96-byte
        // pre-image that SHACAL-2 resumes into
        let mut dhs_in = [0u8; 64];
        dhs_in[..32].copy_from_slice(&dhs_secret);
        dhs_in[32..].copy_from_slice(&pad_sha256(96));

        let tag_counter = u64::from_be_bytes(sequence_number) as u32 + 1;

        Ok(OracleCircuit {
            dhs_in,
            intermediate_hash_hs_opad,
            ms_in,
            xats_in,
            tk_xapp_in,
            iv_counter: iv_counter_block(&iv, tag_counter),
            zeros: [0u8; 16],
            ecb0,
            ecbk,
            plain_chunks,
            iv,
            cipher_chunks,
            chunk_index,
            substring,
            threshold,
            sequence_number,
            offsets,
        })
    }
}

/// SHA-256 padding for a message of `len` bytes: `0x80`, zero fill to
/// 56 mod 64, then the 64-bit big-endian bit length.
pub fn pad_sha256(len: u64) -> Vec<u8> {
    let t = if len % 64 < 56 { 56 - len % 64 } else { 64 + 56 - len % 64 };
    let mut pad = vec![0u8; t as usize + 8];
    pad[0] = 0x80;
    let bits = len << 3;
    pad[t as usize..].copy_from_slice(&bits.to_be_bytes());
    pad
}

/// Counter block handed to the auth-tag gadget: the base record nonce
/// followed by the big-endian block counter, formed byte-wise. Recorded
/// sessions commit to counter `sequence_number + 1` under the unmasked
/// nonce (1 for the first record, 2 for the second).
pub fn iv_counter_block(iv: &[u8; 12], counter: u32) -> [u8; 16] {
    let mut block = [0u8; 16];
    block[..12].copy_from_slice(iv);
    block[12..].copy_from_slice(&counter.to_be_bytes());
    block
}

fn hex_field(field: &'static str, s: &str) -> Result<Vec<u8>, WitnessError> {
    hex::decode(s).map_err(|source| WitnessError::HexDecode { field, source })
}

fn hex_array<const N: usize>(field: &'static str, s: &str) -> Result<[u8; N], WitnessError> {
    hex_field(field, s)?
        .try_into()
        .map_err(|v: Vec<u8>| WitnessError::LengthMismatch {
            field,
            expected: N,
            actual: v.len(),
        })
}

fn int_field(field: &'static str, v: &Value) -> Result<u64, WitnessError> {
    match v {
        Value::Number(n) => n.as_u64().ok_or_else(|| WitnessError::InvalidInteger {
            field,
            value: n.to_string(),
        }),
        Value::String(s) => s.parse::<u64>().map_err(|_| WitnessError::InvalidInteger {
            field,
            value: s.clone(),
        }),
        other => Err(WitnessError::InvalidInteger {
            field,
            value: other.to_string(),
        }),
    }
}
