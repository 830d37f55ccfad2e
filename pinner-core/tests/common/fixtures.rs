// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Test Fixtures
//!
//! Static keys in the formats operators paste into configuration, and
//! generated certificate hierarchies for live handshakes.

use std::net::{IpAddr, Ipv4Addr};

use rcgen::{
    BasicConstraints, Certificate, CertificateParams, DnType, ExtendedKeyUsagePurpose, IsCa,
    KeyPair, KeyUsagePurpose, SanType,
};
use rustls_pki_types::{CertificateDer, PrivateKeyDer, PrivatePkcs8KeyDer};

// ============================================================
// Static keys
// ============================================================

/// RSA-2048 SubjectPublicKeyInfo, 64-column PEM.
pub const RSA_PUBLIC_KEY: &str = "-----BEGIN PUBLIC KEY-----
MIIBIjANBgkqhkiG9w0BAQEFAAOCAQ8AMIIBCgKCAQEAsO3AcJUrEvC+mMVFI40q
zMj3dkV+npqxJR66yKx4wur5hY/5ZKBK7td1ffTewpMJicnN0nA7i+jPoEGE2w/s
ZXFgjpfhAC2t6Szo1GgURoQDmRqC6ZmXTchb/wcxWZ4yQtVprnrtjEUEoEvGcqK2
vQCQByGo7rcIX5HHmKj0MCPfETIL3gVKlIjRdVx2aDjMi004s8+nM1NdbFws3wKT
BGR7GnhhMaHnrFqcbRogU4ghFMvas8v4hauUoxhCsoGdh8AENr4N5yFKRgRrzn6D
yEtAz16PYFKvBFHmNGXiN/M6ylEZIr9pUuFKq1G7fC17M9UAoHLOX2iWcpEpsg29
0wIDAQAB
-----END PUBLIC KEY-----
";

/// A second, unrelated RSA-2048 key.
pub const OTHER_RSA_PUBLIC_KEY: &str = "-----BEGIN PUBLIC KEY-----
MIIBIjANBgkqhkiG9w0BAQEFAAOCAQ8AMIIBCgKCAQEAw8xAGd//BGlormd5xLST
wnoAbxiUI+CYexCIwlvuOPpyzfxUw4kQUFD+39Mne08ZZMwBJ0el3pKIgI1pblzG
fbWoiTGf8OfyoGOpppKxjt4MYs036pJCAd9ONcBkI0tQzu4SbUlQxpA4zzWotd+Z
LNRSfLPRIRhA0k/GP1SJMCtJrutcfpdWYAbdOk51ur/z1yfIIqAIh2WnpO1ckFfi
2LoJaTyvKsFS7elv2hT4ctgzXBt1SgQ4GCenLSS1SDPRMTL0KCZei5PqiwIjgTM1
UaJKMceDTkQMUe90iY8i4exK5EQgUEWnoB91K9NY5Y1BZwUFoHQblwTkferq+jhe
9QIDAQAB
-----END PUBLIC KEY-----
";

/// The key of [`RSA_PUBLIC_KEY`] as PKCS#1 `RSA PUBLIC KEY`, a different envelope.
pub const RSA_PKCS1_PUBLIC_KEY: &str = "-----BEGIN RSA PUBLIC KEY-----
MIIBCgKCAQEAsO3AcJUrEvC+mMVFI40qzMj3dkV+npqxJR66yKx4wur5hY/5ZKBK
7td1ffTewpMJicnN0nA7i+jPoEGE2w/sZXFgjpfhAC2t6Szo1GgURoQDmRqC6ZmX
Tchb/wcxWZ4yQtVprnrtjEUEoEvGcqK2vQCQByGo7rcIX5HHmKj0MCPfETIL3gVK
lIjRdVx2aDjMi004s8+nM1NdbFws3wKTBGR7GnhhMaHnrFqcbRogU4ghFMvas8v4
hauUoxhCsoGdh8AENr4N5yFKRgRrzn6DyEtAz16PYFKvBFHmNGXiN/M6ylEZIr9p
UuFKq1G7fC17M9UAoHLOX2iWcpEpsg290wIDAQAB
-----END RSA PUBLIC KEY-----
";

/// Ed25519 SubjectPublicKeyInfo.
pub const ED25519_PUBLIC_KEY: &str = "-----BEGIN PUBLIC KEY-----
MCowBQYDK2VwAyEAZDlEPeHovwcIhOuh4/UYYwqoxkSgWEEamsJbE8lShPY=
-----END PUBLIC KEY-----
";

/// DSA-1024 SubjectPublicKeyInfo (well formed, unsupported algorithm).
pub const DSA_PUBLIC_KEY: &str = "-----BEGIN PUBLIC KEY-----
MIIBvzCCATQGByqGSM44BAEwggEnAoGBAPre451ARlOQ0TOQxxLYzFda/45H6N1n
cmaFgdGQ8+K0O7zxxsOUb2luTUIhA9PXGB3KirBx19h8JDZJSzAmJ1d/GgxXUdYI
hvDr781o0yAbxpgwbpVZOnJdyB5mPZgYnd9Qrs7/ITi9LYi3FZufD9QI77I7wm+n
8m5YvUNyRIazAh0AqtgWcfM96ZcXj2vGUP64SuxN6nsLMl69lFoA2wKBgQCdt9RX
IVfb2kEemmq5AM7UxWQmFsK4LdjnGZBf9hqMBANJAz+r2SJGuFdIr+z2idfMWY7w
cbkBfa7D6sqlFGhGR2O9A1ToYXhKzEIeVLFsdeGPjv90sCfn6xoAsS4JQ0EWktVF
HrFgRwlYTlmW48teXf+q1LfI+kTVSzAdPKZ1HgOBhAACgYAcRr3SJdAVL3GPUZrR
GftTlpNgJlWMvWQwqYtu3xhV9jwdPCEsJNGDb2IL6H0hdRyOYQ74mWheVf6tGYW6
YkXUuPWGi50PxmjwQ1n1yhh7N3LLcLAT6i2DjGXqOLVww/GP6JSKbewzoz/HuAmj
Ulk0ePqaNsNScC13LGv6wen3dA==
-----END PUBLIC KEY-----
";

/// Re-wraps the base64 body of a PEM block at `width` columns with `eol`.
pub fn rewrap_pem(pem: &str, width: usize, eol: &str) -> String {
    let mut lines = pem.lines().map(str::trim).filter(|l| !l.is_empty());
    let begin = lines.next().unwrap_or_default().to_string();
    let mut body = String::new();
    let mut end = String::new();
    for line in lines {
        if line.starts_with("-----END") {
            end = line.to_string();
        } else {
            body.push_str(line);
        }
    }

    let mut out = String::new();
    out.push_str(&begin);
    out.push_str(eol);
    for chunk in body.as_bytes().chunks(width.max(1)) {
        out.push_str(std::str::from_utf8(chunk).unwrap());
        out.push_str(eol);
    }
    out.push_str(&end);
    out.push_str(eol);
    out
}

// ============================================================
// EC encodings
// ============================================================

/// `namedCurve` parameter for P-256 (prime256v1), DER encoded.
pub const P256_OID: &[u8] = &[0x06, 0x08, 0x2a, 0x86, 0x48, 0xce, 0x3d, 0x03, 0x01, 0x07];

/// `namedCurve` parameter for P-384 (secp384r1), DER encoded.
pub const P384_OID: &[u8] = &[0x06, 0x05, 0x2b, 0x81, 0x04, 0x00, 0x22];

/// id-ecPublicKey SubjectPublicKeyInfo around a SEC1 point, in whatever
/// encoding the point is given.
pub fn ec_spki_der(curve_oid: &[u8], point: &[u8]) -> Vec<u8> {
    const EC_PUBLIC_KEY_OID: &[u8] = &[0x06, 0x07, 0x2a, 0x86, 0x48, 0xce, 0x3d, 0x02, 0x01];

    let mut algorithm = EC_PUBLIC_KEY_OID.to_vec();
    algorithm.extend_from_slice(curve_oid);
    let mut bits = vec![0x00];
    bits.extend_from_slice(point);

    let mut body = der_tlv(0x30, &algorithm);
    body.extend(der_tlv(0x03, &bits));
    der_tlv(0x30, &body)
}

/// Compressed SEC1 form of an uncompressed (`04 || x || y`) point.
pub fn compress_point(uncompressed: &[u8]) -> Vec<u8> {
    let coordinate = (uncompressed.len() - 1) / 2;
    let y_is_odd = uncompressed[uncompressed.len() - 1] & 1;
    let mut out = vec![0x02 | y_is_odd];
    out.extend_from_slice(&uncompressed[1..=coordinate]);
    out
}

/// `PUBLIC KEY` PEM around arbitrary DER, without any normalization.
pub fn der_to_pem(der: &[u8]) -> String {
    use base64::Engine;

    let body = base64::engine::general_purpose::STANDARD.encode(der);
    let mut pem = String::from("-----BEGIN PUBLIC KEY-----\n");
    for line in body.as_bytes().chunks(64) {
        pem.push_str(std::str::from_utf8(line).unwrap());
        pem.push('\n');
    }
    pem.push_str("-----END PUBLIC KEY-----\n");
    pem
}

fn der_tlv(tag: u8, value: &[u8]) -> Vec<u8> {
    assert!(value.len() < 0x80, "short-form lengths only");
    let mut out = vec![tag, value.len() as u8];
    out.extend_from_slice(value);
    out
}

/// A fresh P-256 key as the compressed-point PEM `openssl ec -conv_form
/// compressed -pubout` writes.
pub fn compressed_p256_public_key_pem(key: &KeyPair) -> String {
    der_to_pem(&ec_spki_der(P256_OID, &compress_point(key.public_key_raw())))
}

// ============================================================
// Generated PKI
// ============================================================

/// Root CA, optional intermediate and a `localhost` / `127.0.0.1` leaf.
pub struct TestPki {
    pub root: Certificate,
    pub root_key: KeyPair,
    pub intermediate: Option<(Certificate, KeyPair)>,
    pub leaf: Certificate,
    pub leaf_key: KeyPair,
}

impl TestPki {
    /// Root directly signing the leaf.
    pub fn new(name: &str) -> Self {
        let (root, root_key) = ca(&format!("{name} Root CA"), None);
        let (leaf, leaf_key) = leaf(name, &root, &root_key);
        TestPki {
            root,
            root_key,
            intermediate: None,
            leaf,
            leaf_key,
        }
    }

    /// Root -> intermediate -> leaf.
    pub fn with_intermediate(name: &str) -> Self {
        let (root, root_key) = ca(&format!("{name} Root CA"), None);
        let (inter, inter_key) = ca(&format!("{name} Issuing CA"), Some((&root, &root_key)));
        let (leaf, leaf_key) = leaf(name, &inter, &inter_key);
        TestPki {
            root,
            root_key,
            intermediate: Some((inter, inter_key)),
            leaf,
            leaf_key,
        }
    }

    pub fn root_pem(&self) -> String {
        self.root.pem()
    }

    pub fn root_der(&self) -> CertificateDer<'static> {
        self.root.der().clone()
    }

    pub fn leaf_der(&self) -> CertificateDer<'static> {
        self.leaf.der().clone()
    }

    pub fn leaf_public_key_pem(&self) -> String {
        self.leaf_key.public_key_pem()
    }

    pub fn root_public_key_pem(&self) -> String {
        self.root_key.public_key_pem()
    }

    /// The leaf key as a compressed-point P-256 PEM.
    pub fn leaf_compressed_public_key_pem(&self) -> String {
        compressed_p256_public_key_pem(&self.leaf_key)
    }

    pub fn intermediate_public_key_pem(&self) -> Option<String> {
        self.intermediate.as_ref().map(|(_, key)| key.public_key_pem())
    }

    /// What a server configured with the full chain sends: leaf,
    /// intermediate (if any), root.
    pub fn full_chain(&self) -> Vec<CertificateDer<'static>> {
        let mut chain = vec![self.leaf.der().clone()];
        if let Some((inter, _)) = &self.intermediate {
            chain.push(inter.der().clone());
        }
        chain.push(self.root.der().clone());
        chain
    }

    /// The leaf's private key for a test server.
    pub fn leaf_private_key(&self) -> PrivateKeyDer<'static> {
        PrivatePkcs8KeyDer::from(self.leaf_key.serialize_der()).into()
    }
}

fn ca(common_name: &str, issuer: Option<(&Certificate, &KeyPair)>) -> (Certificate, KeyPair) {
    let key = KeyPair::generate().unwrap();
    let mut params = CertificateParams::new(Vec::<String>::new()).unwrap();
    params
        .distinguished_name
        .push(DnType::CommonName, common_name);
    params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
    params.key_usages = vec![
        KeyUsagePurpose::KeyCertSign,
        KeyUsagePurpose::CrlSign,
        KeyUsagePurpose::DigitalSignature,
    ];
    let cert = match issuer {
        Some((issuer, issuer_key)) => params.signed_by(&key, issuer, issuer_key).unwrap(),
        None => params.self_signed(&key).unwrap(),
    };
    (cert, key)
}

fn leaf(common_name: &str, issuer: &Certificate, issuer_key: &KeyPair) -> (Certificate, KeyPair) {
    let key = KeyPair::generate().unwrap();
    let mut params = CertificateParams::new(Vec::<String>::new()).unwrap();
    params
        .distinguished_name
        .push(DnType::CommonName, common_name);
    params.subject_alt_names = vec![
        SanType::DnsName("localhost".try_into().unwrap()),
        SanType::IpAddress(IpAddr::V4(Ipv4Addr::LOCALHOST)),
    ];
    params.extended_key_usages = vec![ExtendedKeyUsagePurpose::ServerAuth];
    params.key_usages = vec![KeyUsagePurpose::DigitalSignature];
    let cert = params.signed_by(&key, issuer, issuer_key).unwrap();
    (cert, key)
}
