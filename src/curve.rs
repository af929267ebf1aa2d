//! Thin adapter over the BLS12-381 Type-3 pairing: G1, G2, GT, the scalar
//! field Fr, the pairing, hash-to-curve for G1 and G2, and hash-to-scalar.
//!
//! A minimal set of type aliases and two hashing helpers over `ark-ec`;
//! everything else in this crate builds on top of this module rather than
//! touching `ark-ec`/`ark-ff` directly.

use ark_bls12_381::{g1, g2, Bls12_381};
use ark_ec::hashing::curve_maps::wb::WBMap;
use ark_ec::hashing::map_to_curve_hasher::MapToCurveBasedHasher;
use ark_ec::hashing::HashToCurve;
use ark_ec::pairing::Pairing;
use ark_ff::field_hashers::{DefaultFieldHasher, HashToField};
use sha2::Sha256;
use std::sync::Once;

/// The concrete Type-3 pairing engine used throughout this crate.
pub type Engine = Bls12_381;

pub type G1 = <Engine as Pairing>::G1;
pub type G1Affine = <Engine as Pairing>::G1Affine;
pub type G2 = <Engine as Pairing>::G2;
pub type G2Affine = <Engine as Pairing>::G2Affine;
pub type GT = <Engine as Pairing>::TargetField;
pub type Fr = <Engine as Pairing>::ScalarField;

/// `e: G1 x G2 -> GT`.
pub fn pairing(p: G1, q: G2) -> GT {
    Engine::pairing(p, q).0
}

static INIT: Once = Once::new();

/// Idempotent, process-wide initialization hook.
///
/// `arkworks` needs no global handshake before use, so this currently does
/// nothing beyond running once; it exists so host code has a single place
/// to call before spawning worker threads.
pub fn init() {
    INIT.call_once(|| {
        tracing::debug!(target: "el_passo::curve", "curve backend ready");
    });
}

type G1Hasher = MapToCurveBasedHasher<G1, DefaultFieldHasher<Sha256>, WBMap<g1::Config>>;
type G2Hasher = MapToCurveBasedHasher<G2, DefaultFieldHasher<Sha256>, WBMap<g2::Config>>;

/// Domain-separated hash-to-curve into G1, used for the service-bound
/// pseudonym base point `H_G1(service_name)`.
pub fn hash_to_g1(dst: &[u8], msg: &[u8]) -> G1 {
    let hasher = G1Hasher::new(dst).expect("valid hash-to-curve domain separator");
    hasher
        .hash(msg)
        .expect("hash-to-curve to G1 should not fail")
        .into()
}

/// Domain-separated hash-to-curve into G2 (kept for symmetry / future use;
/// the protocol itself only needs hash-to-curve in G1).
pub fn hash_to_g2(dst: &[u8], msg: &[u8]) -> G2 {
    let hasher = G2Hasher::new(dst).expect("valid hash-to-curve domain separator");
    hasher
        .hash(msg)
        .expect("hash-to-curve to G2 should not fail")
        .into()
}

/// Domain-separated hash-to-scalar, used to encode every attribute value
/// into `Fr` and to derive Fiat-Shamir challenges.
pub fn hash_to_scalar(dst: &[u8], msg: &[u8]) -> Fr {
    let hasher = DefaultFieldHasher::<Sha256>::new(dst);
    let elems: Vec<Fr> = hasher.hash_to_field(msg, 1);
    elems[0]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_to_g1_is_deterministic() {
        let a = hash_to_g1(b"el-passo/service-pseudonym/v1", b"service-a");
        let b = hash_to_g1(b"el-passo/service-pseudonym/v1", b"service-a");
        assert_eq!(a, b);
    }

    #[test]
    fn hash_to_g1_is_domain_separated_by_message() {
        let a = hash_to_g1(b"el-passo/service-pseudonym/v1", b"service-a");
        let b = hash_to_g1(b"el-passo/service-pseudonym/v1", b"service-b");
        assert_ne!(a, b);
    }

    #[test]
    fn hash_to_scalar_is_deterministic_and_domain_separated() {
        let a = hash_to_scalar(b"el-passo/attribute/v1", b"alice@example.com");
        let b = hash_to_scalar(b"el-passo/attribute/v1", b"alice@example.com");
        assert_eq!(a, b);

        let c = hash_to_scalar(b"el-passo/fiat-shamir/v1", b"alice@example.com");
        assert_ne!(a, c, "distinct domain separators must not collide");
    }
}
