//! Error taxonomy for the EL PASSO cryptographic core.

use thiserror::Error;

/// Failure kinds for every fallible operation exposed by this crate.
///
/// Every failure aborts the enclosing operation with no partial output.
/// Verification entry points (`Requester::verify`, `Verifier::verify_id`,
/// ...) collapse this into a single boolean at the API boundary but still
/// log the rich variant internally.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// An `AttributeVector` (or revealed-slots vector) did not have exactly
    /// `n` entries, where `n` is the public key's fixed attribute count.
    #[error("attribute count mismatch: expected {expected}, got {actual}")]
    AttributeCountMismatch { expected: usize, actual: usize },

    /// A recomputed Fiat-Shamir challenge did not match the one carried in
    /// the proof, or the final pairing check failed.
    #[error("NIZK proof rejected")]
    NizkRejected,

    /// Decoding a TLV-encoded message failed.
    #[error("malformed input: {0}")]
    MalformedInput(#[from] crate::tlv::DecodeError),

    /// An operation was invoked out of protocol order or with required
    /// parameters missing (e.g. escrow parameters absent when policy
    /// requires escrow).
    #[error("protocol misuse: {0}")]
    ProtocolMisuse(&'static str),

    /// The CSPRNG backing a `sample` step was unavailable.
    ///
    /// Every sampling call in this crate goes through `rand::rngs::OsRng`,
    /// whose `RngCore` impl already fails loudly on a broken OS entropy
    /// source by panicking before control returns to this crate's code —
    /// so this variant is never constructed today. It stays in the
    /// taxonomy for a host that substitutes a fallible custom RNG into
    /// `nizk::prove`'s generic `R: Rng` parameter and wants to surface that
    /// failure as a `Result` instead of a panic.
    #[error("randomness unavailable: {0}")]
    RandomnessUnavailable(&'static str),
}
