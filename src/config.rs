//! Protocol-wide constants: domain separators and the attribute-index
//! conventions used across the requester/signer/verifier roles, made
//! explicit here rather than left as positional magic numbers.

use crate::curve::G1;

/// Domain separator for hashing an attribute's plaintext value into `Fr`.
/// Scalar encoding of an attribute is deterministic.
pub const ATTRIBUTE_HASH_DOMAIN: &[u8] = b"el-passo/attribute/v1";

/// Domain separator for every Fiat-Shamir challenge derivation.
pub const FIAT_SHAMIR_DOMAIN: &[u8] = b"el-passo/fiat-shamir/v1";

/// Domain separator for hashing a service name into a G1 base point,
/// used to derive the per-service pseudonym `phi`.
pub const SERVICE_PSEUDONYM_DOMAIN: &[u8] = b"el-passo/service-pseudonym/v1";

/// Domain separator used to hash a fresh random seed into `g`/`g~` when a
/// `Signer` is constructed without agreed-upon generators.
pub const GENERATOR_DOMAIN: &[u8] = b"el-passo/generator/v1";

/// The attribute index that carries the user's primary secret `s`
/// (0-indexed).
pub const PRIMARY_SECRET_INDEX: usize = 0;

/// The attribute index that carries the identity attribute `gamma` used
/// under escrow (0-indexed).
pub const IDENTITY_ATTRIBUTE_INDEX: usize = 1;

/// Agreed-upon parameters for ElGamal identity escrow: the escrow
/// authority's public key and the two generators both prover and verifier
/// must agree on out of band.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EscrowParams {
    /// The accountability authority's ElGamal public key, `Y_auth`.
    pub authority_public_key: G1,
    /// Generator `g_h` used for `E1 = epsilon * g_h`.
    pub g_h: G1,
    /// Generator `h` used for `E2 = epsilon * Y_auth + gamma * h`.
    pub h: G1,
}

impl EscrowParams {
    pub fn new(authority_public_key: G1, g_h: G1, h: G1) -> Self {
        Self {
            authority_public_key,
            g_h,
            h,
        }
    }
}
