//! Generic Fiat-Shamir Schnorr engine.
//!
//! A `Statement` is an ordered list of `Equation`s over G1 and/or G2, each
//! naming the secrets (by `SecretId`) and bases that make up its left-hand
//! side and the public value it must equal. One `SecretId` can appear in
//! more than one equation (the primary secret `s` appears in both the `k`
//! and `φ` equations) and contributes exactly one entry to the response
//! vector, fixing response ordering by construction rather than by
//! convention.
//!
//! This is a generalization of a fixed two-base single-secret Schnorr
//! proof to an arbitrary multi-equation, multi-group statement.

use crate::config::FIAT_SHAMIR_DOMAIN;
use crate::curve::{hash_to_scalar, Fr, G1, G2};
use ark_ff::UniformRand;
use ark_serialize::CanonicalSerialize;
use std::collections::HashMap;

/// Identifies one secret scalar shared across equations.
///
/// Attribute secrets use their position in the `AttributeVector` (`0..n`)
/// as their id, which is exactly what lets the primary secret and the
/// identity attribute alias between the `k`/`φ` equations and the escrow
/// equations for free. `T_SECRET` and `EPSILON_SECRET` are reserved ids
/// for the two secrets that are never attribute positions.
pub type SecretId = usize;

/// Reserved id for the blinding scalar `t`.
pub const T_SECRET: SecretId = usize::MAX - 1;
/// Reserved id for the escrow randomness `ε`.
pub const EPSILON_SECRET: SecretId = usize::MAX - 2;

#[derive(Clone, Debug)]
pub struct G1Term {
    pub secret: SecretId,
    pub base: G1,
}

#[derive(Clone, Debug)]
pub struct G2Term {
    pub secret: SecretId,
    pub base: G2,
}

/// One linear equation over G1: `public = offset + Σ term.base * secret[term.secret]`.
///
/// `offset` is a publicly known constant (not itself a secret-weighted
/// term) — used by the `k` equation's `X̃` summand.
/// Most equations have no such constant; those set `offset` to the group
/// identity.
#[derive(Clone, Debug)]
pub struct G1Equation {
    pub terms: Vec<G1Term>,
    pub offset: G1,
    pub public: G1,
}

/// One linear equation over G2: `public = offset + Σ term.base * secret[term.secret]`.
#[derive(Clone, Debug)]
pub struct G2Equation {
    pub terms: Vec<G2Term>,
    pub offset: G2,
    pub public: G2,
}

#[derive(Clone, Debug)]
pub enum Equation {
    G1(G1Equation),
    G2(G2Equation),
}

enum Commitment {
    G1(G1),
    G2(G2),
}

impl Commitment {
    fn absorb(&self, buf: &mut Vec<u8>) {
        match self {
            Commitment::G1(v) => v
                .serialize_compressed(buf)
                .expect("canonical serialization of a curve element must not fail"),
            Commitment::G2(v) => v
                .serialize_compressed(buf)
                .expect("canonical serialization of a curve element must not fail"),
        }
    }
}

impl Equation {
    fn absorb_public(&self, buf: &mut Vec<u8>) {
        match self {
            Equation::G1(eq) => eq
                .public
                .serialize_compressed(buf)
                .expect("canonical serialization of a curve element must not fail"),
            Equation::G2(eq) => eq
                .public
                .serialize_compressed(buf)
                .expect("canonical serialization of a curve element must not fail"),
        }
    }

    fn commitment_from_witnesses(&self, witnesses: &HashMap<SecretId, Fr>) -> Commitment {
        match self {
            Equation::G1(eq) => {
                let mut v = eq.offset;
                for term in &eq.terms {
                    let w = witnesses
                        .get(&term.secret)
                        .expect("every equation term must have a sampled witness");
                    v += term.base * w;
                }
                Commitment::G1(v)
            }
            Equation::G2(eq) => {
                let mut v = eq.offset;
                for term in &eq.terms {
                    let w = witnesses
                        .get(&term.secret)
                        .expect("every equation term must have a sampled witness");
                    v += term.base * w;
                }
                Commitment::G2(v)
            }
        }
    }

    /// `V = offset*(1-c) + c*public + Σ rᵢ*baseᵢ`. Reduces to the textbook
    /// `c*public + Σ rᵢ*baseᵢ` whenever `offset` is the group identity.
    fn commitment_from_responses(
        &self,
        challenge: Fr,
        responses: &HashMap<SecretId, Fr>,
    ) -> Option<Commitment> {
        let one_minus_c = Fr::from(1u64) - challenge;
        match self {
            Equation::G1(eq) => {
                let mut v = eq.offset * one_minus_c + eq.public * challenge;
                for term in &eq.terms {
                    let r = responses.get(&term.secret)?;
                    v += term.base * r;
                }
                Some(Commitment::G1(v))
            }
            Equation::G2(eq) => {
                let mut v = eq.offset * one_minus_c + eq.public * challenge;
                for term in &eq.terms {
                    let r = responses.get(&term.secret)?;
                    v += term.base * r;
                }
                Some(Commitment::G2(v))
            }
        }
    }
}

/// A statement to be proved: an ordered equation list plus the canonical
/// order the response vector is packed in.
pub struct Statement {
    pub secret_order: Vec<SecretId>,
    pub equations: Vec<Equation>,
}

impl Statement {
    pub fn new(secret_order: Vec<SecretId>, equations: Vec<Equation>) -> Self {
        Self {
            secret_order,
            equations,
        }
    }
}

/// The output of `prove`: a challenge and a response aligned one-to-one
/// with `Statement::secret_order` — this is exactly the `rs` vector carried
/// on the wire.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Proof {
    pub challenge: Fr,
    pub responses: Vec<Fr>,
}

fn derive_challenge(
    equations: &[Equation],
    commitments: &[Commitment],
    associated_data: &[u8],
) -> Fr {
    let mut buf = Vec::new();
    for eq in equations {
        eq.absorb_public(&mut buf);
    }
    for c in commitments {
        c.absorb(&mut buf);
    }
    buf.extend_from_slice(associated_data);
    hash_to_scalar(FIAT_SHAMIR_DOMAIN, &buf)
}

/// Proves `statement`, given the witness for every `SecretId` it references.
///
/// `secrets` must contain an entry for every id in `statement.secret_order`;
/// missing entries are a programmer error (caller assembled the wrong
/// statement), not a runtime-reportable condition.
pub fn prove<R: ark_std::rand::Rng + ?Sized>(
    statement: &Statement,
    secrets: &HashMap<SecretId, Fr>,
    associated_data: &[u8],
    rng: &mut R,
) -> Proof {
    let witnesses: HashMap<SecretId, Fr> = statement
        .secret_order
        .iter()
        .map(|id| (*id, Fr::rand(rng)))
        .collect();

    let commitments: Vec<Commitment> = statement
        .equations
        .iter()
        .map(|eq| eq.commitment_from_witnesses(&witnesses))
        .collect();

    let challenge = derive_challenge(&statement.equations, &commitments, associated_data);

    let responses = statement
        .secret_order
        .iter()
        .map(|id| {
            let w = witnesses[id];
            let s = secrets
                .get(id)
                .expect("every id in secret_order must have a witness secret");
            w - *s * challenge
        })
        .collect();

    Proof {
        challenge,
        responses,
    }
}

/// Verifies `proof` against `statement`. Returns `false` on any mismatch,
/// including a malformed response vector length; callers never see why a
/// proof failed, only that it did.
pub fn verify(statement: &Statement, proof: &Proof, associated_data: &[u8]) -> bool {
    if proof.responses.len() != statement.secret_order.len() {
        return false;
    }
    let responses: HashMap<SecretId, Fr> = statement
        .secret_order
        .iter()
        .copied()
        .zip(proof.responses.iter().copied())
        .collect();

    let commitments: Vec<Commitment> = match statement
        .equations
        .iter()
        .map(|eq| eq.commitment_from_responses(proof.challenge, &responses))
        .collect::<Option<Vec<_>>>()
    {
        Some(c) => c,
        None => return false,
    };

    let recomputed = derive_challenge(&statement.equations, &commitments, associated_data);
    recomputed == proof.challenge
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_ec::CurveGroup;
    use ark_ff::Zero;
    use ark_std::test_rng;

    /// Single-equation statement: `A = t*g + m*Y`, the RequestID shape with
    /// one hidden attribute.
    fn toy_statement(g: G1, y: G1, public: G1) -> Statement {
        Statement::new(
            vec![0, T_SECRET],
            vec![Equation::G1(G1Equation {
                terms: vec![
                    G1Term { secret: 0, base: y },
                    G1Term {
                        secret: T_SECRET,
                        base: g,
                    },
                ],
                offset: G1::zero(),
                public,
            })],
        )
    }

    #[test]
    fn completeness_honest_proof_verifies() {
        let mut rng = test_rng();
        let g = G1::rand(&mut rng);
        let y = G1::rand(&mut rng);
        let m = Fr::rand(&mut rng);
        let t = Fr::rand(&mut rng);
        let public = g * t + y * m;

        let statement = toy_statement(g, y, public);
        let mut secrets = HashMap::new();
        secrets.insert(0, m);
        secrets.insert(T_SECRET, t);

        let proof = prove(&statement, &secrets, b"associated-data", &mut rng);
        assert!(verify(&statement, &proof, b"associated-data"));
    }

    #[test]
    fn soundness_tampered_response_is_rejected() {
        let mut rng = test_rng();
        let g = G1::rand(&mut rng);
        let y = G1::rand(&mut rng);
        let m = Fr::rand(&mut rng);
        let t = Fr::rand(&mut rng);
        let public = g * t + y * m;

        let statement = toy_statement(g, y, public);
        let mut secrets = HashMap::new();
        secrets.insert(0, m);
        secrets.insert(T_SECRET, t);

        let mut proof = prove(&statement, &secrets, b"associated-data", &mut rng);
        proof.responses[0] += Fr::from(1u64);
        assert!(!verify(&statement, &proof, b"associated-data"));
    }

    #[test]
    fn soundness_tampered_challenge_is_rejected() {
        let mut rng = test_rng();
        let g = G1::rand(&mut rng);
        let y = G1::rand(&mut rng);
        let m = Fr::rand(&mut rng);
        let t = Fr::rand(&mut rng);
        let public = g * t + y * m;

        let statement = toy_statement(g, y, public);
        let mut secrets = HashMap::new();
        secrets.insert(0, m);
        secrets.insert(T_SECRET, t);

        let mut proof = prove(&statement, &secrets, b"associated-data", &mut rng);
        proof.challenge += Fr::from(1u64);
        assert!(!verify(&statement, &proof, b"associated-data"));
    }

    #[test]
    fn associated_data_binds_the_proof() {
        let mut rng = test_rng();
        let g = G1::rand(&mut rng);
        let y = G1::rand(&mut rng);
        let m = Fr::rand(&mut rng);
        let t = Fr::rand(&mut rng);
        let public = g * t + y * m;

        let statement = toy_statement(g, y, public);
        let mut secrets = HashMap::new();
        secrets.insert(0, m);
        secrets.insert(T_SECRET, t);

        let proof = prove(&statement, &secrets, b"hello", &mut rng);
        assert!(verify(&statement, &proof, b"hello"));
        assert!(!verify(&statement, &proof, b"hellx"));
    }

    #[test]
    fn tampered_public_value_is_rejected() {
        let mut rng = test_rng();
        let g = G1::rand(&mut rng);
        let y = G1::rand(&mut rng);
        let m = Fr::rand(&mut rng);
        let t = Fr::rand(&mut rng);
        let public = g * t + y * m;

        let statement = toy_statement(g, y, public);
        let mut secrets = HashMap::new();
        secrets.insert(0, m);
        secrets.insert(T_SECRET, t);
        let proof = prove(&statement, &secrets, b"associated-data", &mut rng);

        let mut tampered = statement;
        if let Equation::G1(eq) = &mut tampered.equations[0] {
            eq.public += g;
        }
        assert!(!verify(&tampered, &proof, b"associated-data"));
    }

    #[test]
    fn wrong_length_response_vector_is_rejected() {
        let mut rng = test_rng();
        let g = G1::rand(&mut rng);
        let y = G1::rand(&mut rng);
        let m = Fr::rand(&mut rng);
        let t = Fr::rand(&mut rng);
        let public = g * t + y * m;

        let statement = toy_statement(g, y, public);
        let mut secrets = HashMap::new();
        secrets.insert(0, m);
        secrets.insert(T_SECRET, t);
        let mut proof = prove(&statement, &secrets, b"associated-data", &mut rng);
        proof.responses.pop();
        assert!(!verify(&statement, &proof, b"associated-data"));
    }
}
