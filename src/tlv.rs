//! Canonical TLV wire codec.
//!
//! A tag-length-value byte layout, re-expressed as a Rust `Encoder`/
//! `Decoder` pair built on `ark-serialize`'s compressed point/scalar
//! encoding. Base64 transport uses the standard, unpadded alphabet.

use crate::curve::{Fr, G1, G2};
use crate::types::{Credential, CredentialRequest, EscrowCiphertext, IdProof, PublicKey};
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use base64::engine::general_purpose::STANDARD_NO_PAD;
use base64::Engine as _;
use thiserror::Error;

/// Single-byte element tags.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum Tag {
    G1 = 1,
    G2 = 2,
    Fr = 3,
    G1List = 4,
    G2List = 5,
    FrList = 6,
    StrList = 7,
}

impl Tag {
    fn from_u8(byte: u8) -> Result<Self, DecodeError> {
        match byte {
            1 => Ok(Tag::G1),
            2 => Ok(Tag::G2),
            3 => Ok(Tag::Fr),
            4 => Ok(Tag::G1List),
            5 => Ok(Tag::G2List),
            6 => Ok(Tag::FrList),
            7 => Ok(Tag::StrList),
            other => Err(DecodeError::UnknownTag(other)),
        }
    }
}

/// Distinct decode failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("unknown tag byte {0}")]
    UnknownTag(u8),
    #[error("truncated varint")]
    TruncatedVarint,
    #[error("reserved varint prefix byte {0:#04x}")]
    ReservedVarintPrefix(u8),
    #[error("truncated payload: need {needed} bytes, have {available}")]
    TruncatedPayload { needed: usize, available: usize },
    #[error("tag mismatch: expected {expected:?}, found {found:?}")]
    TagMismatch { expected: Tag, found: Tag },
    #[error("curve element or scalar failed to deserialize")]
    InvalidElement,
    #[error("string list entry is not valid utf-8")]
    InvalidUtf8,
    #[error("invalid base64")]
    InvalidBase64,
}

/// Encodes a non-negative length/count as a varint.
fn append_varint(buf: &mut Vec<u8>, v: usize) {
    if v < 253 {
        buf.push(v as u8);
    } else if v <= 0xFFFF {
        buf.push(0xFD);
        buf.push((v >> 8) as u8);
        buf.push((v & 0xFF) as u8);
    } else {
        panic!("varint value {v} exceeds the supported 16-bit range");
    }
}

fn parse_varint(buf: &[u8], pos: &mut usize) -> Result<usize, DecodeError> {
    let first = *buf.get(*pos).ok_or(DecodeError::TruncatedVarint)?;
    match first {
        0..=252 => {
            *pos += 1;
            Ok(first as usize)
        }
        0xFD => {
            let hi = *buf.get(*pos + 1).ok_or(DecodeError::TruncatedVarint)?;
            let lo = *buf.get(*pos + 2).ok_or(DecodeError::TruncatedVarint)?;
            *pos += 3;
            Ok(((hi as usize) << 8) | lo as usize)
        }
        reserved => Err(DecodeError::ReservedVarintPrefix(reserved)),
    }
}

fn take(buf: &[u8], pos: &mut usize, len: usize) -> Result<&[u8], DecodeError> {
    let available = buf.len().saturating_sub(*pos);
    if available < len {
        return Err(DecodeError::TruncatedPayload {
            needed: len,
            available,
        });
    }
    let slice = &buf[*pos..*pos + len];
    *pos += len;
    Ok(slice)
}

/// Appends a length-prefixed byte string, with or without its leading tag
/// (list elements omit their own tag).
fn append_bytes_element(buf: &mut Vec<u8>, tag: Option<Tag>, bytes: &[u8]) {
    if let Some(tag) = tag {
        buf.push(tag as u8);
    }
    append_varint(buf, bytes.len());
    buf.extend_from_slice(bytes);
}

fn parse_bytes_element<'a>(
    buf: &'a [u8],
    pos: &mut usize,
    expected: Option<Tag>,
) -> Result<&'a [u8], DecodeError> {
    if let Some(expected) = expected {
        let found = Tag::from_u8(*buf.get(*pos).ok_or(DecodeError::TruncatedVarint)?)?;
        if found != expected {
            return Err(DecodeError::TagMismatch { expected, found });
        }
        *pos += 1;
    }
    let len = parse_varint(buf, pos)?;
    take(buf, pos, len)
}

fn serialize_compressed<T: CanonicalSerialize>(value: &T) -> Vec<u8> {
    let mut bytes = Vec::new();
    value
        .serialize_compressed(&mut bytes)
        .expect("canonical serialization of a curve element must not fail");
    bytes
}

fn deserialize_compressed<T: CanonicalDeserialize>(bytes: &[u8]) -> Result<T, DecodeError> {
    T::deserialize_compressed(bytes).map_err(|_| DecodeError::InvalidElement)
}

/// Append-only builder for one TLV message.
#[derive(Default)]
pub struct Encoder {
    buf: Vec<u8>,
}

impl Encoder {
    pub fn new() -> Self {
        Self { buf: Vec::new() }
    }

    pub fn append_g1(&mut self, value: &G1) -> &mut Self {
        append_bytes_element(&mut self.buf, Some(Tag::G1), &serialize_compressed(value));
        self
    }

    pub fn append_g2(&mut self, value: &G2) -> &mut Self {
        append_bytes_element(&mut self.buf, Some(Tag::G2), &serialize_compressed(value));
        self
    }

    pub fn append_fr(&mut self, value: &Fr) -> &mut Self {
        append_bytes_element(&mut self.buf, Some(Tag::Fr), &serialize_compressed(value));
        self
    }

    pub fn append_g1_list(&mut self, values: &[G1]) -> &mut Self {
        self.buf.push(Tag::G1List as u8);
        append_varint(&mut self.buf, values.len());
        for value in values {
            append_bytes_element(&mut self.buf, None, &serialize_compressed(value));
        }
        self
    }

    pub fn append_g2_list(&mut self, values: &[G2]) -> &mut Self {
        self.buf.push(Tag::G2List as u8);
        append_varint(&mut self.buf, values.len());
        for value in values {
            append_bytes_element(&mut self.buf, None, &serialize_compressed(value));
        }
        self
    }

    pub fn append_fr_list(&mut self, values: &[Fr]) -> &mut Self {
        self.buf.push(Tag::FrList as u8);
        append_varint(&mut self.buf, values.len());
        for value in values {
            append_bytes_element(&mut self.buf, None, &serialize_compressed(value));
        }
        self
    }

    /// A hidden slot is encoded as the empty string.
    pub fn append_str_list(&mut self, values: &[Option<Vec<u8>>]) -> &mut Self {
        self.buf.push(Tag::StrList as u8);
        append_varint(&mut self.buf, values.len());
        for value in values {
            let bytes = value.as_deref().unwrap_or(&[]);
            append_bytes_element(&mut self.buf, None, bytes);
        }
        self
    }

    pub fn finish(self) -> Vec<u8> {
        self.buf
    }
}

/// Cursor-based reader over one TLV message.
pub struct Decoder<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Decoder<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub fn parse_g1(&mut self) -> Result<G1, DecodeError> {
        let bytes = parse_bytes_element(self.buf, &mut self.pos, Some(Tag::G1))?;
        deserialize_compressed(bytes)
    }

    pub fn parse_g2(&mut self) -> Result<G2, DecodeError> {
        let bytes = parse_bytes_element(self.buf, &mut self.pos, Some(Tag::G2))?;
        deserialize_compressed(bytes)
    }

    pub fn parse_fr(&mut self) -> Result<Fr, DecodeError> {
        let bytes = parse_bytes_element(self.buf, &mut self.pos, Some(Tag::Fr))?;
        deserialize_compressed(bytes)
    }

    pub fn parse_g1_list(&mut self) -> Result<Vec<G1>, DecodeError> {
        let found = Tag::from_u8(*self.buf.get(self.pos).ok_or(DecodeError::TruncatedVarint)?)?;
        if found != Tag::G1List {
            return Err(DecodeError::TagMismatch {
                expected: Tag::G1List,
                found,
            });
        }
        self.pos += 1;
        let count = parse_varint(self.buf, &mut self.pos)?;
        (0..count)
            .map(|_| {
                let bytes = parse_bytes_element(self.buf, &mut self.pos, None)?;
                deserialize_compressed(bytes)
            })
            .collect()
    }

    pub fn parse_g2_list(&mut self) -> Result<Vec<G2>, DecodeError> {
        let found = Tag::from_u8(*self.buf.get(self.pos).ok_or(DecodeError::TruncatedVarint)?)?;
        if found != Tag::G2List {
            return Err(DecodeError::TagMismatch {
                expected: Tag::G2List,
                found,
            });
        }
        self.pos += 1;
        let count = parse_varint(self.buf, &mut self.pos)?;
        (0..count)
            .map(|_| {
                let bytes = parse_bytes_element(self.buf, &mut self.pos, None)?;
                deserialize_compressed(bytes)
            })
            .collect()
    }

    pub fn parse_fr_list(&mut self) -> Result<Vec<Fr>, DecodeError> {
        let found = Tag::from_u8(*self.buf.get(self.pos).ok_or(DecodeError::TruncatedVarint)?)?;
        if found != Tag::FrList {
            return Err(DecodeError::TagMismatch {
                expected: Tag::FrList,
                found,
            });
        }
        self.pos += 1;
        let count = parse_varint(self.buf, &mut self.pos)?;
        (0..count)
            .map(|_| {
                let bytes = parse_bytes_element(self.buf, &mut self.pos, None)?;
                deserialize_compressed(bytes)
            })
            .collect()
    }

    pub fn parse_str_list(&mut self) -> Result<Vec<Option<Vec<u8>>>, DecodeError> {
        let found = Tag::from_u8(*self.buf.get(self.pos).ok_or(DecodeError::TruncatedVarint)?)?;
        if found != Tag::StrList {
            return Err(DecodeError::TagMismatch {
                expected: Tag::StrList,
                found,
            });
        }
        self.pos += 1;
        let count = parse_varint(self.buf, &mut self.pos)?;
        (0..count)
            .map(|_| {
                let bytes = parse_bytes_element(self.buf, &mut self.pos, None)?;
                Ok(if bytes.is_empty() {
                    None
                } else {
                    Some(bytes.to_vec())
                })
            })
            .collect()
    }

    /// Bytes left unconsumed; a caller checking for trailing garbage after
    /// parsing a whole message can assert this is zero.
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }
}

// --- Message-level encodings -------------------------------------------

pub fn encode_public_key(pk: &PublicKey) -> Vec<u8> {
    Encoder::new()
        .append_g1(&pk.g)
        .append_g2(&pk.g_tilde)
        .append_g2(&pk.big_x_tilde)
        .append_g1_list(&pk.y)
        .append_g2_list(&pk.y_tilde)
        .finish()
}

pub fn decode_public_key(bytes: &[u8]) -> Result<PublicKey, DecodeError> {
    let mut decoder = Decoder::new(bytes);
    Ok(PublicKey {
        g: decoder.parse_g1()?,
        g_tilde: decoder.parse_g2()?,
        big_x_tilde: decoder.parse_g2()?,
        y: decoder.parse_g1_list()?,
        y_tilde: decoder.parse_g2_list()?,
    })
}

pub fn encode_credential(cred: &Credential) -> Vec<u8> {
    Encoder::new()
        .append_g1(&cred.sigma1)
        .append_g1(&cred.sigma2)
        .finish()
}

pub fn decode_credential(bytes: &[u8]) -> Result<Credential, DecodeError> {
    let mut decoder = Decoder::new(bytes);
    Ok(Credential {
        sigma1: decoder.parse_g1()?,
        sigma2: decoder.parse_g1()?,
    })
}

pub fn encode_credential_request(req: &CredentialRequest) -> Vec<u8> {
    Encoder::new()
        .append_g1(&req.a)
        .append_fr(&req.c)
        .append_fr_list(&req.rs)
        .append_str_list(&req.attrs)
        .finish()
}

pub fn decode_credential_request(bytes: &[u8]) -> Result<CredentialRequest, DecodeError> {
    let mut decoder = Decoder::new(bytes);
    Ok(CredentialRequest {
        a: decoder.parse_g1()?,
        c: decoder.parse_fr()?,
        rs: decoder.parse_fr_list()?,
        attrs: decoder.parse_str_list()?,
    })
}

pub fn encode_id_proof(proof: &IdProof) -> Vec<u8> {
    let mut encoder = Encoder::new();
    encoder
        .append_g1(&proof.sigma1)
        .append_g1(&proof.sigma2)
        .append_g2(&proof.k)
        .append_g1(&proof.phi)
        .append_fr(&proof.c)
        .append_fr_list(&proof.rs)
        .append_str_list(&proof.attrs);
    if let Some(escrow) = &proof.escrow {
        encoder.append_g1(&escrow.e1).append_g1(&escrow.e2);
    }
    encoder.finish()
}

pub fn decode_id_proof(bytes: &[u8]) -> Result<IdProof, DecodeError> {
    let mut decoder = Decoder::new(bytes);
    let sigma1 = decoder.parse_g1()?;
    let sigma2 = decoder.parse_g1()?;
    let k = decoder.parse_g2()?;
    let phi = decoder.parse_g1()?;
    let c = decoder.parse_fr()?;
    let rs = decoder.parse_fr_list()?;
    let attrs = decoder.parse_str_list()?;
    let escrow = if decoder.remaining() > 0 {
        let e1 = decoder.parse_g1()?;
        let e2 = decoder.parse_g1()?;
        Some(EscrowCiphertext { e1, e2 })
    } else {
        None
    };
    Ok(IdProof {
        sigma1,
        sigma2,
        k,
        phi,
        c,
        rs,
        attrs,
        escrow,
    })
}

/// Standard, unpadded Base64 transport.
pub fn to_base64(bytes: &[u8]) -> String {
    STANDARD_NO_PAD.encode(bytes)
}

pub fn from_base64(text: &str) -> Result<Vec<u8>, DecodeError> {
    STANDARD_NO_PAD
        .decode(text)
        .map_err(|_| DecodeError::InvalidBase64)
}
