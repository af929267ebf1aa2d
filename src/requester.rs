//! User/Holder role: `RequestID`, `Unblind`, `Verify`, `Randomize`, and
//! `ProveID`.

use crate::config::{
    self, EscrowParams, IDENTITY_ATTRIBUTE_INDEX, PRIMARY_SECRET_INDEX, SERVICE_PSEUDONYM_DOMAIN,
};
use crate::curve::{hash_to_g1, hash_to_scalar, pairing, Fr, G1};
use crate::error::Error;
use crate::nizk::{self, Equation, G1Equation, G1Term, G2Equation, G2Term, Statement, EPSILON_SECRET, T_SECRET};
use crate::signer::{request_id_secrets, request_id_statement};
use crate::types::{
    AttributeSlot, AttributeVector, Credential, CredentialRequest, EscrowCiphertext, IdProof,
    PendingRequest, PublicKey, RevealedAttrs,
};
use ark_ec::CurveGroup;
use ark_ff::{UniformRand, Zero};
use rand::rngs::OsRng;
use std::collections::HashMap;

const LOG_TARGET: &str = "el_passo::requester";

/// Holds the (shared, immutable) IdP public key a User/Holder operates
/// against.
#[derive(Clone)]
pub struct Requester {
    public: PublicKey,
}

fn wire_attrs(attrs: &AttributeVector) -> RevealedAttrs {
    attrs
        .iter()
        .map(|slot| match slot {
            AttributeSlot::Hidden(_) => None,
            AttributeSlot::Revealed(value) => Some(value.clone()),
        })
        .collect()
}

fn hidden_indices_and_scalars(attrs: &AttributeVector) -> (Vec<usize>, Vec<Fr>) {
    let mut indices = Vec::new();
    let mut scalars = Vec::new();
    for (i, slot) in attrs.iter().enumerate() {
        if let AttributeSlot::Hidden(value) = slot {
            indices.push(i);
            scalars.push(hash_to_scalar(config::ATTRIBUTE_HASH_DOMAIN, value));
        }
    }
    (indices, scalars)
}

fn sample_nonzero(rng: &mut OsRng) -> Fr {
    loop {
        let candidate = Fr::rand(rng);
        if !candidate.is_zero() {
            return candidate;
        }
    }
}

impl Requester {
    pub fn new(public: PublicKey) -> Self {
        Self { public }
    }

    /// The fixed attribute count `n` this key supports.
    pub fn max_attributes(&self) -> usize {
        self.public.max_attributes()
    }

    /// `RequestID(attr_vector, associated_data)`. Returns the wire message
    /// plus the owned blinding state `unblind` consumes, so a stale or
    /// reused request can't be unblinded twice.
    #[tracing::instrument(target = "el_passo::requester", skip_all)]
    pub fn request_id(
        &self,
        attrs: AttributeVector,
        associated_data: &[u8],
    ) -> Result<(CredentialRequest, PendingRequest), Error> {
        let n = self.public.max_attributes();
        if attrs.len() != n {
            return Err(Error::AttributeCountMismatch {
                expected: n,
                actual: attrs.len(),
            });
        }

        let mut rng = OsRng;
        let t = Fr::rand(&mut rng);

        let (hidden_indices, hidden_scalars) = hidden_indices_and_scalars(&attrs);

        let a = hidden_indices
            .iter()
            .zip(hidden_scalars.iter())
            .fold(self.public.g * t, |acc, (&i, &m)| acc + self.public.y[i] * m);

        let statement = request_id_statement(&self.public, &hidden_indices, a);
        let secrets = request_id_secrets(&hidden_indices, &hidden_scalars, t);
        let proof = nizk::prove(&statement, &secrets, associated_data, &mut rng);

        tracing::debug!(target: LOG_TARGET, n, hidden = hidden_indices.len(), "built a RequestID message");

        let request = CredentialRequest {
            a,
            c: proof.challenge,
            rs: proof.responses,
            attrs: wire_attrs(&attrs),
        };
        Ok((request, PendingRequest { t }))
    }

    /// `Unblind(credential)`. Consumes the `PendingRequest`
    /// produced by the matching `request_id` call.
    pub fn unblind(&self, pending: PendingRequest, credential: Credential) -> Credential {
        Credential {
            sigma1: credential.sigma1,
            sigma2: credential.sigma2 - credential.sigma1 * pending.t,
        }
    }

    /// `Verify(credential, all_plain_attrs)`.
    #[tracing::instrument(target = "el_passo::requester", skip_all)]
    pub fn verify(&self, credential: &Credential, plain_attrs: &[Vec<u8>]) -> bool {
        verify_credential(&self.public, credential, plain_attrs)
    }

    /// `Randomize(credential)`.
    pub fn randomize(&self, credential: &Credential) -> Credential {
        let mut rng = OsRng;
        let r = sample_nonzero(&mut rng);
        Credential {
            sigma1: credential.sigma1 * r,
            sigma2: credential.sigma2 * r,
        }
    }

    /// `ProveID` without identity escrow.
    pub fn prove_id_no_escrow(
        &self,
        credential: &Credential,
        attrs: &AttributeVector,
        associated_data: &[u8],
        service_name: &[u8],
    ) -> Result<IdProof, Error> {
        self.prove_id_inner(credential, attrs, associated_data, service_name, None)
    }

    /// `ProveID` with identity escrow.
    pub fn prove_id(
        &self,
        credential: &Credential,
        attrs: &AttributeVector,
        associated_data: &[u8],
        service_name: &[u8],
        escrow: &EscrowParams,
    ) -> Result<IdProof, Error> {
        self.prove_id_inner(credential, attrs, associated_data, service_name, Some(escrow))
    }

    #[tracing::instrument(target = "el_passo::requester", skip_all)]
    fn prove_id_inner(
        &self,
        credential: &Credential,
        attrs: &AttributeVector,
        associated_data: &[u8],
        service_name: &[u8],
        escrow: Option<&EscrowParams>,
    ) -> Result<IdProof, Error> {
        let n = self.public.max_attributes();
        if attrs.len() != n {
            return Err(Error::AttributeCountMismatch {
                expected: n,
                actual: attrs.len(),
            });
        }
        if !attrs[PRIMARY_SECRET_INDEX].is_hidden() {
            return Err(Error::ProtocolMisuse(
                "the primary secret attribute must be hidden for ProveID",
            ));
        }
        if escrow.is_some() && !attrs[IDENTITY_ATTRIBUTE_INDEX].is_hidden() {
            return Err(Error::ProtocolMisuse(
                "the identity attribute must be hidden when escrow is used",
            ));
        }

        let mut rng = OsRng;
        let r = sample_nonzero(&mut rng);
        let t = Fr::rand(&mut rng);

        let sigma1p = credential.sigma1 * r;
        let sigma2p = (credential.sigma2 + credential.sigma1 * t) * r;

        let (hidden_indices, hidden_scalars) = hidden_indices_and_scalars(attrs);

        let mut k = self.public.big_x_tilde;
        for (&i, &m) in hidden_indices.iter().zip(hidden_scalars.iter()) {
            k += self.public.y_tilde[i] * m;
        }
        k += self.public.g_tilde * t;

        let s = hash_to_scalar(
            config::ATTRIBUTE_HASH_DOMAIN,
            attrs[PRIMARY_SECRET_INDEX].value(),
        );
        let h_service = hash_to_g1(SERVICE_PSEUDONYM_DOMAIN, service_name);
        let phi: G1 = h_service * s;

        let mut secrets: HashMap<usize, Fr> = hidden_indices
            .iter()
            .zip(hidden_scalars.iter())
            .map(|(&i, &m)| (i, m))
            .collect();
        secrets.insert(T_SECRET, t);

        let escrow_points = escrow.map(|params| {
            let epsilon = Fr::rand(&mut rng);
            let gamma = hash_to_scalar(
                config::ATTRIBUTE_HASH_DOMAIN,
                attrs[IDENTITY_ATTRIBUTE_INDEX].value(),
            );
            let e1 = params.g_h * epsilon;
            let e2 = params.authority_public_key * epsilon + params.h * gamma;
            secrets.insert(EPSILON_SECRET, epsilon);
            (params, e1, e2)
        });

        let statement =
            prove_id_statement(&self.public, &hidden_indices, k, phi, h_service, escrow_points);
        let proof = nizk::prove(&statement, &secrets, associated_data, &mut rng);

        let escrow_ciphertext = escrow_points.map(|(_, e1, e2)| EscrowCiphertext { e1, e2 });

        tracing::debug!(
            target: LOG_TARGET,
            n,
            escrow = escrow_ciphertext.is_some(),
            "built an IdProof"
        );

        Ok(IdProof {
            sigma1: sigma1p,
            sigma2: sigma2p,
            k,
            phi,
            c: proof.challenge,
            rs: proof.responses,
            attrs: wire_attrs(attrs),
            escrow: escrow_ciphertext,
        })
    }
}

/// Builds the ProveID NIZK statement shared by the
/// prover (`Requester::prove_id`/`prove_id_no_escrow`) and the verifier
/// (`Verifier::verify_id`/`verify_id_no_escrow`): both sides must agree on
/// exactly the same bases and equation order for the Fiat-Shamir transcript
/// to line up.
pub(crate) fn prove_id_statement(
    public: &PublicKey,
    hidden_indices: &[usize],
    k: crate::curve::G2,
    phi: G1,
    h_service: G1,
    escrow: Option<(&EscrowParams, G1, G1)>,
) -> Statement {
    let mut secret_order: Vec<usize> = hidden_indices.to_vec();
    secret_order.sort_unstable();
    secret_order.push(T_SECRET);

    let mut k_terms: Vec<G2Term> = hidden_indices
        .iter()
        .map(|&i| G2Term {
            secret: i,
            base: public.y_tilde[i],
        })
        .collect();
    k_terms.push(G2Term {
        secret: T_SECRET,
        base: public.g_tilde,
    });

    let mut equations = vec![
        Equation::G2(G2Equation {
            terms: k_terms,
            offset: public.big_x_tilde,
            public: k,
        }),
        Equation::G1(G1Equation {
            terms: vec![G1Term {
                secret: PRIMARY_SECRET_INDEX,
                base: h_service,
            }],
            offset: G1::zero(),
            public: phi,
        }),
    ];

    if let Some((params, e1, e2)) = escrow {
        secret_order.push(EPSILON_SECRET);
        equations.push(Equation::G1(G1Equation {
            terms: vec![G1Term {
                secret: EPSILON_SECRET,
                base: params.g_h,
            }],
            offset: G1::zero(),
            public: e1,
        }));
        equations.push(Equation::G1(G1Equation {
            terms: vec![
                G1Term {
                    secret: EPSILON_SECRET,
                    base: params.authority_public_key,
                },
                G1Term {
                    secret: IDENTITY_ATTRIBUTE_INDEX,
                    base: params.h,
                },
            ],
            offset: G1::zero(),
            public: e2,
        }));
    }

    Statement::new(secret_order, equations)
}

/// Shared between `Requester::verify` and `Verifier::verify`.
pub(crate) fn verify_credential(
    public: &PublicKey,
    credential: &Credential,
    plain_attrs: &[Vec<u8>],
) -> bool {
    if credential.is_degenerate() {
        return false;
    }
    let n = public.max_attributes();
    if plain_attrs.len() != n {
        return false;
    }
    let mut k_tilde = public.big_x_tilde;
    for i in 0..n {
        let m = hash_to_scalar(config::ATTRIBUTE_HASH_DOMAIN, &plain_attrs[i]);
        k_tilde += public.y_tilde[i] * m;
    }
    pairing(credential.sigma1, k_tilde) == pairing(credential.sigma2, public.g_tilde)
}
