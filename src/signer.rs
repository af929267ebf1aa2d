//! IdP role: `KeyGen` and `ProvideID`.

use crate::config::{self, GENERATOR_DOMAIN};
use crate::curve::{hash_to_g1, hash_to_g2, hash_to_scalar, Fr, G1};
use crate::error::Error;
use crate::nizk::{self, Equation, G1Equation, G1Term, Statement, T_SECRET};
use crate::types::{Credential, CredentialRequest, PublicKey, SecretKey};
use ark_ec::CurveGroup;
use ark_ff::{UniformRand, Zero};
use rand::rngs::OsRng;
use std::collections::HashMap;

const LOG_TARGET: &str = "el_passo::signer";

/// Holds the IdP's secret key and the public key it derives. Instances are
/// immutable after construction; `ProvideID` is pure with respect to the
/// instance.
#[derive(Clone)]
pub struct Signer {
    secret: SecretKey,
    public: PublicKey,
}

impl Signer {
    /// `KeyGen(n)` with `g`, `g~` derived by hashing a fresh random seed
    /// into each group.
    #[tracing::instrument(target = "el_passo::signer", skip_all, fields(n = n))]
    pub fn new(n: usize) -> Self {
        let mut rng = OsRng;
        let mut seed = [0u8; 32];
        rand::RngCore::fill_bytes(&mut rng, &mut seed);
        let g = hash_to_g1(GENERATOR_DOMAIN, &seed);
        let g_tilde = hash_to_g2(GENERATOR_DOMAIN, &seed);
        Self::new_with_generators(n, g, g_tilde)
    }

    /// `KeyGen(n)` with `g`, `g~` agreed upon out of band.
    #[tracing::instrument(target = "el_passo::signer", skip_all, fields(n = n))]
    pub fn new_with_generators(n: usize, g: G1, g_tilde: crate::curve::G2) -> Self {
        let mut rng = OsRng;
        let x = Fr::rand(&mut rng);
        let ys: Vec<Fr> = (0..n).map(|_| Fr::rand(&mut rng)).collect();

        let secret = SecretKey::new(x, g);
        let big_x_tilde = g_tilde * x;
        let y: Vec<G1> = ys.iter().map(|yi| g * yi).collect();
        let y_tilde: Vec<crate::curve::G2> = ys.iter().map(|yi| g_tilde * yi).collect();

        tracing::debug!(target: LOG_TARGET, n, "generated a fresh IdP key pair");

        Self {
            secret,
            public: PublicKey {
                g,
                g_tilde,
                big_x_tilde,
                y,
                y_tilde,
            },
        }
    }

    /// Returns the public key generated at construction.
    pub fn key_gen(&self) -> PublicKey {
        self.public.clone()
    }

    /// Accessor for the public key, for use by Requester/Verifier instances
    /// constructed elsewhere.
    pub fn public_key(&self) -> PublicKey {
        self.public.clone()
    }

    /// `ProvideID(request, associated_data)`.
    #[tracing::instrument(target = "el_passo::signer", skip_all)]
    pub fn provide_id(
        &self,
        request: &CredentialRequest,
        associated_data: &[u8],
    ) -> Result<Credential, Error> {
        let n = self.public.max_attributes();
        if request.attrs.len() != n {
            return Err(Error::AttributeCountMismatch {
                expected: n,
                actual: request.attrs.len(),
            });
        }

        let hidden_indices: Vec<usize> = (0..n)
            .filter(|&i| request.attrs[i].is_none())
            .collect();

        let statement = request_id_statement(&self.public, &hidden_indices, request.a);
        let proof = nizk::Proof {
            challenge: request.c,
            responses: request.rs.clone(),
        };
        if !nizk::verify(&statement, &proof, associated_data) {
            tracing::debug!(target: LOG_TARGET, "rejected RequestID NIZK proof");
            return Err(Error::NizkRejected);
        }

        let mut a_star = request.a;
        for i in 0..n {
            if let Some(value) = &request.attrs[i] {
                let m = hash_to_scalar(config::ATTRIBUTE_HASH_DOMAIN, value);
                a_star += self.public.y[i] * m;
            }
        }

        let mut rng = OsRng;
        let mut u = Fr::rand(&mut rng);
        while u.is_zero() {
            u = Fr::rand(&mut rng);
        }

        let sigma1 = self.public.g * u;
        let sigma2 = (self.secret.big_x + a_star) * u;

        tracing::debug!(target: LOG_TARGET, n, revealed = n - hidden_indices.len(), "issued a credential");

        Ok(Credential { sigma1, sigma2 })
    }
}

/// Builds the RequestID NIZK statement for a given set of
/// hidden attribute indices and a claimed commitment `a`.
pub(crate) fn request_id_statement(
    public: &PublicKey,
    hidden_indices: &[usize],
    a: G1,
) -> Statement {
    let mut secret_order: Vec<usize> = hidden_indices.to_vec();
    secret_order.sort_unstable();
    secret_order.push(T_SECRET);

    let mut terms: Vec<G1Term> = hidden_indices
        .iter()
        .map(|&i| G1Term {
            secret: i,
            base: public.y[i],
        })
        .collect();
    terms.push(G1Term {
        secret: T_SECRET,
        base: public.g,
    });

    Statement::new(
        secret_order,
        vec![Equation::G1(G1Equation {
            terms,
            offset: G1::zero(),
            public: a,
        })],
    )
}

/// Maps hidden-attribute scalars plus the blinding scalar into the
/// `HashMap<SecretId, Fr>` the `nizk` engine expects.
pub(crate) fn request_id_secrets(
    hidden_indices: &[usize],
    hidden_scalars: &[Fr],
    t: Fr,
) -> HashMap<usize, Fr> {
    let mut secrets = HashMap::new();
    for (&i, &m) in hidden_indices.iter().zip(hidden_scalars.iter()) {
        secrets.insert(i, m);
    }
    secrets.insert(T_SECRET, t);
    secrets
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::requester::Requester;
    use crate::types::AttributeSlot;

    #[test]
    fn provide_id_rejects_wrong_attribute_count() {
        let signer = Signer::new(3);
        let requester = Requester::new(signer.public_key());
        let (mut request, _pending) = requester
            .request_id(
                vec![
                    AttributeSlot::Hidden(b"s".to_vec()),
                    AttributeSlot::Hidden(b"g".to_vec()),
                    AttributeSlot::Revealed(b"tp".to_vec()),
                ],
                b"associated-data",
            )
            .unwrap();
        request.attrs.pop();
        request.rs.pop();
        let result = signer.provide_id(&request, b"associated-data");
        assert!(matches!(
            result,
            Err(Error::AttributeCountMismatch { expected: 3, actual: 2 })
        ));
    }

    #[test]
    fn provide_id_rejects_tampered_proof() {
        let signer = Signer::new(3);
        let requester = Requester::new(signer.public_key());
        let (mut request, _pending) = requester
            .request_id(
                vec![
                    AttributeSlot::Hidden(b"s".to_vec()),
                    AttributeSlot::Hidden(b"g".to_vec()),
                    AttributeSlot::Revealed(b"tp".to_vec()),
                ],
                b"associated-data",
            )
            .unwrap();
        request.rs[0] += Fr::from(1u64);
        let result = signer.provide_id(&request, b"associated-data");
        assert!(matches!(result, Err(Error::NizkRejected)));
    }

    #[test]
    fn provide_id_accepts_honest_request() {
        let signer = Signer::new(3);
        let requester = Requester::new(signer.public_key());
        let (request, _pending) = requester
            .request_id(
                vec![
                    AttributeSlot::Hidden(b"s".to_vec()),
                    AttributeSlot::Hidden(b"g".to_vec()),
                    AttributeSlot::Revealed(b"tp".to_vec()),
                ],
                b"associated-data",
            )
            .unwrap();
        assert!(signer.provide_id(&request, b"associated-data").is_ok());
    }
}
