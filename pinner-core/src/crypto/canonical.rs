// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Canonical Public Keys
//!
//! Pins are compared on the canonical DER encoding of a SubjectPublicKeyInfo.
//! Both the configured pins and the keys taken from live certificates go
//! through the same parse-then-re-encode path, so incidental differences in
//! the textual input never cause a false negative.
//!
//! Re-encoding rebuilds the key material itself: RSA keys from `(n, e)` with
//! NULL parameters, P-256 and P-384 points in uncompressed SEC1 form. Any
//! other encoding that could differ between two copies of the same key is
//! rejected rather than passed through.

use std::fmt;

use base64::Engine;
use p256::elliptic_curve::sec1::ToEncodedPoint;
use pkcs8::der::asn1::{Any, BitString, UintRef};
use pkcs8::der::{Decode, Encode, Tag, Tagged};
use pkcs8::spki::{
    AlgorithmIdentifierOwned, ObjectIdentifier, SubjectPublicKeyInfoOwned, SubjectPublicKeyInfoRef,
};
use ring::digest;
use rustls_pki_types::pem::PemObject;
use rustls_pki_types::SubjectPublicKeyInfoDer;
use thiserror::Error;
use x509_parser::prelude::{FromDer, X509Certificate};
use x509_parser::public_key::{PublicKey, RSAPublicKey};
use x509_parser::x509::SubjectPublicKeyInfo;

const PEM_LINE_WIDTH: usize = 64;
const SEC1_UNCOMPRESSED: u8 = 0x04;

const RSA_ENCRYPTION: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.1");
const EC_PUBLIC_KEY: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.10045.2.1");
const SECP256R1: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.10045.3.1.7");
const SECP384R1: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.132.0.34");
const ED25519: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.101.112");
const ED448: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.101.113");

/// Errors produced while canonicalizing a public key.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyError {
    /// No usable `PUBLIC KEY` PEM block in the input.
    #[error("failed to decode PEM public key: {0}")]
    Decode(String),

    /// The key structure is malformed or uses an unsupported algorithm.
    #[error("failed to parse public key: {0}")]
    Parse(String),

    /// Re-serialization into canonical DER failed.
    #[error("failed to re-encode public key: {0}")]
    Encode(String),
}

/// A key of a batch failed to canonicalize.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("public key #{index}: {source}")]
pub struct KeyBatchError {
    /// Position of the offending key in the input.
    pub index: usize,
    /// Why it was rejected.
    #[source]
    pub source: KeyError,
}

/// Canonical DER encoding of a SubjectPublicKeyInfo.
///
/// Two `CanonicalKey`s are equal exactly when they describe the same key.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct CanonicalKey {
    der: Vec<u8>,
}

impl CanonicalKey {
    /// Canonical DER bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.der
    }

    /// SHA-256 of the canonical bytes, hex encoded.
    ///
    /// Safe to log; the same value `openssl pkey -pubin -outform der | sha256sum`
    /// prints for the key.
    pub fn fingerprint(&self) -> String {
        hex::encode(digest::digest(&digest::SHA256, &self.der).as_ref())
    }

    /// Textual (`PUBLIC KEY` PEM) form of the canonical encoding.
    pub fn to_pem(&self) -> String {
        let body = base64::engine::general_purpose::STANDARD.encode(&self.der);
        let mut pem = String::with_capacity(body.len() + body.len() / PEM_LINE_WIDTH + 64);
        pem.push_str("-----BEGIN PUBLIC KEY-----\n");
        for (i, c) in body.chars().enumerate() {
            if i > 0 && i % PEM_LINE_WIDTH == 0 {
                pem.push('\n');
            }
            pem.push(c);
        }
        pem.push_str("\n-----END PUBLIC KEY-----\n");
        pem
    }
}

impl fmt::Debug for CanonicalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CanonicalKey")
            .field("sha256", &self.fingerprint())
            .finish()
    }
}

impl AsRef<[u8]> for CanonicalKey {
    fn as_ref(&self) -> &[u8] {
        &self.der
    }
}

/// Canonicalizes a PEM `PUBLIC KEY` block.
///
/// Fails with [`KeyError::Decode`] when no envelope is found, with
/// [`KeyError::Parse`] when the DER is not a SubjectPublicKeyInfo of a
/// supported algorithm, and with [`KeyError::Encode`] when re-encoding fails.
pub fn canonicalize(pem: &str) -> Result<CanonicalKey, KeyError> {
    let spki = SubjectPublicKeyInfoDer::from_pem_slice(pem.as_bytes())
        .map_err(|e| KeyError::Decode(format!("{e:?}")))?;
    canonicalize_der(spki.as_ref())
}

/// Canonicalizes a DER-encoded SubjectPublicKeyInfo.
///
/// The structure is rebuilt from the parsed key material rather than copied:
/// RSA from `(n, e)` with NULL parameters, EC as the uncompressed point on a
/// named curve, EdDSA with absent parameters. Compressed EC points are
/// accepted on P-256 and P-384 and rejected on any other curve.
pub fn canonicalize_der(spki_der: &[u8]) -> Result<CanonicalKey, KeyError> {
    let (rest, parsed) = SubjectPublicKeyInfo::from_der(spki_der).map_err(parse_error)?;
    if !rest.is_empty() {
        return Err(KeyError::Parse(format!(
            "{} trailing bytes after SubjectPublicKeyInfo",
            rest.len()
        )));
    }
    let info = SubjectPublicKeyInfoRef::from_der(parsed.raw).map_err(parse_error)?;
    if info.subject_public_key.as_bytes().is_none() {
        return Err(KeyError::Parse("public key bit string is not octet aligned".into()));
    }

    let oid = info.algorithm.oid;
    let (algorithm, key) = match parsed.parsed() {
        Ok(PublicKey::RSA(rsa)) => rsa_key(&info, &rsa)?,
        Ok(PublicKey::EC(point)) => ec_key(&info, point.data())?,
        Ok(PublicKey::Unknown(raw)) if oid == ED25519 => edwards_key(&info, raw, 32)?,
        Ok(PublicKey::Unknown(raw)) if oid == ED448 => edwards_key(&info, raw, 57)?,
        Ok(_) => return Err(KeyError::Parse(format!("unsupported algorithm {oid}"))),
        Err(e) => return Err(parse_error(e)),
    };

    let der = SubjectPublicKeyInfoOwned {
        algorithm,
        subject_public_key: BitString::from_bytes(&key).map_err(encode_error)?,
    }
    .to_der()
    .map_err(encode_error)?;

    Ok(CanonicalKey { der })
}

/// Canonicalizes the public key carried by a DER-encoded X.509 certificate.
pub fn canonicalize_certificate_key(cert_der: &[u8]) -> Result<CanonicalKey, KeyError> {
    let (_, cert) = X509Certificate::from_der(cert_der)
        .map_err(|e| KeyError::Parse(format!("certificate: {e}")))?;
    canonicalize_der(cert.public_key().raw)
}

/// Canonicalizes every key of `pems`, stopping at the first failure.
pub fn canonicalize_all<I, S>(pems: I) -> Result<Vec<CanonicalKey>, KeyBatchError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    pems.into_iter()
        .enumerate()
        .map(|(index, pem)| {
            canonicalize(pem.as_ref()).map_err(|source| KeyBatchError { index, source })
        })
        .collect()
}

type KeyParts = (AlgorithmIdentifierOwned, Vec<u8>);

fn rsa_key(
    info: &SubjectPublicKeyInfoRef<'_>,
    rsa: &RSAPublicKey<'_>,
) -> Result<KeyParts, KeyError> {
    if let Some(params) = &info.algorithm.parameters {
        if params.tag() != Tag::Null {
            return Err(KeyError::Parse("RSA parameters must be NULL".into()));
        }
    }

    let modulus = strip_leading_zeros(rsa.modulus);
    let exponent = strip_leading_zeros(rsa.exponent);
    if modulus.is_empty() {
        return Err(KeyError::Parse("RSA modulus is zero".into()));
    }
    if exponent.is_empty() {
        return Err(KeyError::Parse("RSA exponent is zero".into()));
    }

    // PKCS#1 RSAPublicKey ::= SEQUENCE { modulus INTEGER, publicExponent INTEGER }
    let key = vec![
        UintRef::new(modulus).map_err(encode_error)?,
        UintRef::new(exponent).map_err(encode_error)?,
    ]
    .to_der()
    .map_err(encode_error)?;

    let algorithm = AlgorithmIdentifierOwned {
        oid: RSA_ENCRYPTION,
        parameters: Some(Any::new(Tag::Null, Vec::<u8>::new()).map_err(encode_error)?),
    };
    Ok((algorithm, key))
}

fn ec_key(info: &SubjectPublicKeyInfoRef<'_>, point: &[u8]) -> Result<KeyParts, KeyError> {
    let curve = info
        .algorithm
        .parameters_oid()
        .map_err(|e| KeyError::Parse(format!("EC parameters must name a curve: {e}")))?;

    let key = if curve == SECP256R1 {
        p256::PublicKey::from_sec1_bytes(point)
            .map_err(|_| KeyError::Parse("invalid P-256 point".into()))?
            .to_encoded_point(false)
            .as_bytes()
            .to_vec()
    } else if curve == SECP384R1 {
        p384::PublicKey::from_sec1_bytes(point)
            .map_err(|_| KeyError::Parse("invalid P-384 point".into()))?
            .to_encoded_point(false)
            .as_bytes()
            .to_vec()
    } else if point.first() == Some(&SEC1_UNCOMPRESSED) {
        point.to_vec()
    } else {
        return Err(KeyError::Parse(format!("point on curve {curve} must be uncompressed")));
    };

    let algorithm = AlgorithmIdentifierOwned {
        oid: EC_PUBLIC_KEY,
        parameters: Some(
            Any::new(Tag::ObjectIdentifier, curve.as_bytes()).map_err(encode_error)?,
        ),
    };
    Ok((algorithm, key))
}

fn edwards_key(
    info: &SubjectPublicKeyInfoRef<'_>,
    raw: &[u8],
    len: usize,
) -> Result<KeyParts, KeyError> {
    if info.algorithm.parameters.is_some() {
        return Err(KeyError::Parse("EdDSA parameters must be absent".into()));
    }
    if raw.len() != len {
        return Err(KeyError::Parse(format!(
            "expected a {len}-byte EdDSA key, got {} bytes",
            raw.len()
        )));
    }

    let algorithm = AlgorithmIdentifierOwned {
        oid: info.algorithm.oid,
        parameters: None,
    };
    Ok((algorithm, raw.to_vec()))
}

fn strip_leading_zeros(bytes: &[u8]) -> &[u8] {
    let start = bytes.iter().position(|b| *b != 0).unwrap_or(bytes.len());
    &bytes[start..]
}

fn parse_error(e: impl fmt::Display) -> KeyError {
    KeyError::Parse(e.to_string())
}

fn encode_error(e: impl fmt::Display) -> KeyError {
    KeyError::Encode(e.to_string())
}
