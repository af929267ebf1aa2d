//! Relying Party role: `Verify` and `VerifyID`.

use crate::config::EscrowParams;
use crate::curve::hash_to_g1;
use crate::error::Error;
use crate::nizk::{self, Proof};
use crate::requester::{prove_id_statement, verify_credential};
use crate::types::{Credential, IdProof, PublicKey};
use ark_ec::CurveGroup;
use ark_ff::Zero;

const LOG_TARGET: &str = "el_passo::verifier";

/// Holds the (shared, immutable) IdP public key an RP checks credentials
/// and ID proofs against.
#[derive(Clone)]
pub struct Verifier {
    public: PublicKey,
}

impl Verifier {
    pub fn new(public: PublicKey) -> Self {
        Self { public }
    }

    /// `Verify(credential, all_plain_attrs)`.
    pub fn verify(&self, credential: &Credential, plain_attrs: &[Vec<u8>]) -> bool {
        verify_credential(&self.public, credential, plain_attrs)
    }

    /// `VerifyID` without identity escrow.
    #[tracing::instrument(target = "el_passo::verifier", skip_all)]
    pub fn verify_id_no_escrow(
        &self,
        proof: &IdProof,
        associated_data: &[u8],
        service_name: &[u8],
    ) -> bool {
        match self.verify_id_inner(proof, associated_data, service_name, None) {
            Ok(accepted) => accepted,
            Err(err) => {
                tracing::debug!(target: LOG_TARGET, %err, "rejected IdProof");
                false
            }
        }
    }

    /// `VerifyID` with identity escrow required by policy.
    #[tracing::instrument(target = "el_passo::verifier", skip_all)]
    pub fn verify_id(
        &self,
        proof: &IdProof,
        associated_data: &[u8],
        service_name: &[u8],
        escrow: &EscrowParams,
    ) -> bool {
        match self.verify_id_inner(proof, associated_data, service_name, Some(escrow)) {
            Ok(accepted) => accepted,
            Err(err) => {
                tracing::debug!(target: LOG_TARGET, %err, "rejected IdProof");
                false
            }
        }
    }

    fn verify_id_inner(
        &self,
        proof: &IdProof,
        associated_data: &[u8],
        service_name: &[u8],
        escrow: Option<&EscrowParams>,
    ) -> Result<bool, Error> {
        let n = self.public.max_attributes();
        if proof.attrs.len() != n {
            return Err(Error::AttributeCountMismatch {
                expected: n,
                actual: proof.attrs.len(),
            });
        }

        // Step 2: escrow presence must match policy.
        let escrow_points = match (escrow, &proof.escrow) {
            (Some(params), Some(ciphertext)) => Some((params, ciphertext.e1, ciphertext.e2)),
            (None, None) => None,
            _ => {
                return Err(Error::ProtocolMisuse(
                    "escrow presence in the proof does not match verifier policy",
                ))
            }
        };

        let hidden_indices: Vec<usize> = (0..n).filter(|&i| proof.attrs[i].is_none()).collect();
        let h_service = hash_to_g1(crate::config::SERVICE_PSEUDONYM_DOMAIN, service_name);

        let statement = prove_id_statement(
            &self.public,
            &hidden_indices,
            proof.k,
            proof.phi,
            h_service,
            escrow_points,
        );
        let candidate = Proof {
            challenge: proof.c,
            responses: proof.rs.clone(),
        };
        if !nizk::verify(&statement, &candidate, associated_data) {
            return Ok(false);
        }

        // Step 5: absorb revealed attributes into k.
        let mut k_tilde = proof.k;
        for i in 0..n {
            if let Some(value) = &proof.attrs[i] {
                let m = crate::curve::hash_to_scalar(crate::config::ATTRIBUTE_HASH_DOMAIN, value);
                k_tilde += self.public.y_tilde[i] * m;
            }
        }

        if proof.sigma1.is_zero() {
            return Ok(false);
        }

        let accepted = crate::curve::pairing(proof.sigma1, k_tilde)
            == crate::curve::pairing(proof.sigma2, self.public.g_tilde);
        Ok(accepted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::requester::Requester;
    use crate::signer::Signer;
    use crate::types::AttributeSlot;
    use ark_ff::UniformRand;
    use ark_std::test_rng;

    fn issue_credential(
        signer: &Signer,
        requester: &Requester,
        attrs: Vec<AttributeSlot>,
    ) -> Credential {
        let (request, pending) = requester.request_id(attrs, b"associated-data").unwrap();
        let blind_credential = signer.provide_id(&request, b"associated-data").unwrap();
        requester.unblind(pending, blind_credential)
    }

    fn sample_attrs() -> Vec<AttributeSlot> {
        vec![
            AttributeSlot::Hidden(b"s".to_vec()),
            AttributeSlot::Hidden(b"gamma".to_vec()),
            AttributeSlot::Revealed(b"tp".to_vec()),
        ]
    }

    #[test]
    fn verify_id_no_escrow_accepts_honest_proof() {
        let signer = Signer::new(3);
        let requester = Requester::new(signer.public_key());
        let credential = issue_credential(&signer, &requester, sample_attrs());

        let proof = requester
            .prove_id_no_escrow(&credential, &sample_attrs(), b"associated-data", b"service")
            .unwrap();

        let verifier = Verifier::new(signer.public_key());
        assert!(verifier.verify_id_no_escrow(&proof, b"associated-data", b"service"));
    }

    #[test]
    fn verify_id_rejects_wrong_associated_data() {
        let signer = Signer::new(3);
        let requester = Requester::new(signer.public_key());
        let credential = issue_credential(&signer, &requester, sample_attrs());

        let proof = requester
            .prove_id_no_escrow(&credential, &sample_attrs(), b"associated-data", b"service")
            .unwrap();

        let verifier = Verifier::new(signer.public_key());
        assert!(!verifier.verify_id_no_escrow(&proof, b"tampered", b"service"));
    }

    #[test]
    fn verify_id_rejects_wrong_service_name() {
        let signer = Signer::new(3);
        let requester = Requester::new(signer.public_key());
        let credential = issue_credential(&signer, &requester, sample_attrs());

        let proof = requester
            .prove_id_no_escrow(&credential, &sample_attrs(), b"associated-data", b"service-a")
            .unwrap();

        let verifier = Verifier::new(signer.public_key());
        assert!(!verifier.verify_id_no_escrow(&proof, b"associated-data", b"service-b"));
    }

    #[test]
    fn verify_id_rejects_tampered_revealed_attribute() {
        let signer = Signer::new(3);
        let requester = Requester::new(signer.public_key());
        let credential = issue_credential(&signer, &requester, sample_attrs());

        let mut proof = requester
            .prove_id_no_escrow(&credential, &sample_attrs(), b"associated-data", b"service")
            .unwrap();
        proof.attrs[2] = Some(b"forged".to_vec());

        let verifier = Verifier::new(signer.public_key());
        assert!(!verifier.verify_id_no_escrow(&proof, b"associated-data", b"service"));
    }

    #[test]
    fn verify_id_with_escrow_accepts_honest_proof_and_rejects_wrong_authority() {
        let mut rng = test_rng();
        let signer = Signer::new(3);
        let requester = Requester::new(signer.public_key());
        let credential = issue_credential(&signer, &requester, sample_attrs());

        let escrow = EscrowParams::new(
            crate::curve::G1::rand(&mut rng),
            crate::curve::G1::rand(&mut rng),
            crate::curve::G1::rand(&mut rng),
        );

        let proof = requester
            .prove_id(&credential, &sample_attrs(), b"associated-data", b"service", &escrow)
            .unwrap();

        let verifier = Verifier::new(signer.public_key());
        assert!(verifier.verify_id(&proof, b"associated-data", b"service", &escrow));

        let wrong_escrow = EscrowParams::new(
            crate::curve::G1::rand(&mut rng),
            escrow.g_h,
            escrow.h,
        );
        assert!(!verifier.verify_id(&proof, b"associated-data", b"service", &wrong_escrow));
    }

    #[test]
    fn verify_id_rejects_zeroed_escrow_ciphertext() {
        let mut rng = test_rng();
        let signer = Signer::new(3);
        let requester = Requester::new(signer.public_key());
        let credential = issue_credential(&signer, &requester, sample_attrs());

        let escrow = EscrowParams::new(
            crate::curve::G1::rand(&mut rng),
            crate::curve::G1::rand(&mut rng),
            crate::curve::G1::rand(&mut rng),
        );

        let mut proof = requester
            .prove_id(&credential, &sample_attrs(), b"associated-data", b"service", &escrow)
            .unwrap();
        if let Some(ciphertext) = &mut proof.escrow {
            ciphertext.e1 = crate::curve::G1::rand(&mut rng) - crate::curve::G1::rand(&mut rng);
        }

        let verifier = Verifier::new(signer.public_key());
        assert!(!verifier.verify_id(&proof, b"associated-data", b"service", &escrow));
    }

    #[test]
    fn verify_id_no_escrow_rejects_a_proof_built_with_escrow() {
        let mut rng = test_rng();
        let signer = Signer::new(3);
        let requester = Requester::new(signer.public_key());
        let credential = issue_credential(&signer, &requester, sample_attrs());

        let escrow = EscrowParams::new(
            crate::curve::G1::rand(&mut rng),
            crate::curve::G1::rand(&mut rng),
            crate::curve::G1::rand(&mut rng),
        );
        let proof = requester
            .prove_id(&credential, &sample_attrs(), b"associated-data", b"service", &escrow)
            .unwrap();

        let verifier = Verifier::new(signer.public_key());
        assert!(!verifier.verify_id_no_escrow(&proof, b"associated-data", b"service"));
    }

    #[test]
    fn verify_id_rejects_a_hidden_revealed_swap_at_the_same_index() {
        let signer = Signer::new(3);
        let requester = Requester::new(signer.public_key());
        let credential = issue_credential(&signer, &requester, sample_attrs());

        let mut proof = requester
            .prove_id_no_escrow(&credential, &sample_attrs(), b"associated-data", b"service")
            .unwrap();
        // sample_attrs() hides index 1 ("gamma") and reveals index 2 ("tp");
        // swap which of the two the wire message claims is revealed, values
        // unchanged.
        proof.attrs.swap(1, 2);

        let verifier = Verifier::new(signer.public_key());
        assert!(!verifier.verify_id_no_escrow(&proof, b"associated-data", b"service"));
    }
}
