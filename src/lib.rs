pub mod config;
pub mod curve;
pub mod error;
pub mod nizk;
pub mod requester;
pub mod signer;
pub mod tlv;
pub mod types;
pub mod verifier;

pub use config::EscrowParams;
pub use error::Error;
pub use requester::Requester;
pub use signer::Signer;
pub use types::{
    AttributeSlot, AttributeVector, Credential, CredentialRequest, EscrowCiphertext, IdProof,
    PendingRequest, PublicKey,
};
pub use verifier::Verifier;
