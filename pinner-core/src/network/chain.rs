// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Verified Chains
//!
//! The certificate path a handshake validated, and the shape checks run on
//! it before any pin is compared.

use rustls_pki_types::CertificateDer;

use super::error::ChainError;

/// Certificate path validated up to a trust root.
///
/// Ordered leaf first; the last entry is the root certificate the path
/// terminates in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedChain {
    certificates: Vec<CertificateDer<'static>>,
}

impl VerifiedChain {
    /// Wraps an ordered certificate path.
    pub fn new(certificates: Vec<CertificateDer<'static>>) -> Self {
        VerifiedChain { certificates }
    }

    /// Certificates, leaf first.
    pub fn certificates(&self) -> &[CertificateDer<'static>] {
        &self.certificates
    }

    /// The end-entity certificate.
    pub fn leaf(&self) -> Option<&CertificateDer<'static>> {
        self.certificates.first()
    }

    /// Number of certificates, root included.
    pub fn len(&self) -> usize {
        self.certificates.len()
    }

    /// True for a chain with no certificates.
    pub fn is_empty(&self) -> bool {
        self.certificates.is_empty()
    }
}

/// Checks that a handshake yielded one unambiguous chain made only of
/// certificates the peer offered.
///
/// Rejects:
/// - any number of verified chains other than one;
/// - a verified chain whose length differs from the offered list;
/// - a verified certificate missing from the offered list.
///
/// The membership check does not depend on the order either side lists
/// certificates in.
pub fn check_chain_shape<'a>(
    verified: &'a [VerifiedChain],
    offered: &[CertificateDer<'_>],
) -> Result<&'a VerifiedChain, ChainError> {
    let [chain] = verified else {
        return Err(ChainError::Ambiguous {
            count: verified.len(),
        });
    };

    if offered.is_empty() {
        return Err(ChainError::NoPeerCertificates);
    }

    if chain.len() != offered.len() {
        return Err(ChainError::LengthMismatch {
            verified: chain.len(),
            offered: offered.len(),
        });
    }

    let mut unmatched: Vec<&[u8]> = offered.iter().map(|c| c.as_ref()).collect();
    for (position, cert) in chain.certificates().iter().enumerate() {
        match unmatched.iter().position(|o| *o == cert.as_ref()) {
            Some(i) => {
                unmatched.swap_remove(i);
            }
            None => return Err(ChainError::NotOffered { position }),
        }
    }

    Ok(chain)
}
