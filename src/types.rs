//! Core data model: keys, attribute vectors, credentials, and the wire
//! messages exchanged between the three protocol roles.
//!
//! Secret-bearing structs implement `zeroize::{Zeroize, ZeroizeOnDrop}`
//! manually, since the curve scalar/point types here don't derive the
//! trait themselves.

use crate::curve::{Fr, G1, G2};
use ark_ec::CurveGroup;
use ark_ff::Zero;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// The IdP's secret key: `x` and its public image `X = x * g`.
///
/// Never shared between instances, never mutated after `KeyGen`, zeroized
/// on drop.
#[derive(Clone)]
pub struct SecretKey {
    pub(crate) x: Fr,
    pub(crate) big_x: G1,
}

impl std::fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretKey").field("x", &"<redacted>").finish()
    }
}

impl Zeroize for SecretKey {
    fn zeroize(&mut self) {
        self.x = Fr::from(0u64);
        self.big_x = G1::zero();
    }
}

impl ZeroizeOnDrop for SecretKey {}

impl Drop for SecretKey {
    fn drop(&mut self) {
        self.zeroize();
    }
}

impl SecretKey {
    pub(crate) fn new(x: Fr, g: G1) -> Self {
        Self { x, big_x: g * x }
    }
}

/// The IdP's public key: `n` is fixed at `KeyGen` and bounds every
/// `AttributeVector` this key can be used with.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PublicKey {
    /// Generator of G1.
    pub g: G1,
    /// Generator of G2.
    pub g_tilde: G2,
    /// `X~ = x * g~`.
    pub big_x_tilde: G2,
    /// `Y_i = y_i * g`, one per attribute slot.
    pub y: Vec<G1>,
    /// `Y~_i = y_i * g~`, one per attribute slot.
    pub y_tilde: Vec<G2>,
}

impl PublicKey {
    /// The fixed maximum number of attributes this key supports.
    pub fn max_attributes(&self) -> usize {
        self.y.len()
    }
}

/// One slot of an `AttributeVector`: either a value to be committed and
/// hidden from the signer/verifier, or a value carried in the clear.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AttributeSlot {
    Hidden(Vec<u8>),
    Revealed(Vec<u8>),
}

impl AttributeSlot {
    pub fn value(&self) -> &[u8] {
        match self {
            AttributeSlot::Hidden(v) | AttributeSlot::Revealed(v) => v,
        }
    }

    pub fn is_hidden(&self) -> bool {
        matches!(self, AttributeSlot::Hidden(_))
    }
}

/// An ordered vector of exactly `n` attribute slots.
pub type AttributeVector = Vec<AttributeSlot>;

/// A PS signature pair `(sigma1, sigma2)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Credential {
    pub sigma1: G1,
    pub sigma2: G1,
}

impl Credential {
    /// `sigma1 == 0`, the one structural defect every check must reject
    /// before trusting the pairing equation.
    pub fn is_degenerate(&self) -> bool {
        self.sigma1.is_zero()
    }
}

/// The revealed-or-hidden view of an `AttributeVector` carried on the wire:
/// `None` marks a hidden slot, `Some(bytes)` a cleartext attribute.
pub type RevealedAttrs = Vec<Option<Vec<u8>>>;

/// The message a Requester sends an IdP to request a blind signature.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CredentialRequest {
    pub a: G1,
    pub c: Fr,
    pub rs: Vec<Fr>,
    pub attrs: RevealedAttrs,
}

/// ElGamal identity-escrow ciphertext `(E1, E2)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EscrowCiphertext {
    pub e1: G1,
    pub e2: G1,
}

/// The message a Requester sends an RP to prove possession of a valid
/// credential.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IdProof {
    pub sigma1: G1,
    pub sigma2: G1,
    pub k: G2,
    pub phi: G1,
    pub c: Fr,
    pub rs: Vec<Fr>,
    pub attrs: RevealedAttrs,
    pub escrow: Option<EscrowCiphertext>,
}

/// The Requester-only blinding state produced by `request_id` and consumed
/// by `unblind`.
///
/// Owning this value, rather than stashing `t` as mutable state on the
/// Requester, turns "unblind reused against a stale request" into a
/// compile-time move error instead of a runtime check.
pub struct PendingRequest {
    pub(crate) t: Fr,
}

impl Zeroize for PendingRequest {
    fn zeroize(&mut self) {
        self.t = Fr::from(0u64);
    }
}

impl ZeroizeOnDrop for PendingRequest {}

impl Drop for PendingRequest {
    fn drop(&mut self) {
        self.zeroize();
    }
}
