// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Trust Roots
//!
//! Root certificates private to one dialer. The process-wide or bundled
//! root stores are never consulted.

use rustls_pki_types::pem::PemObject;
use rustls_pki_types::{CertificateDer, TrustAnchor};

use super::error::ConfigError;

/// A root certificate together with the trust anchor derived from it.
#[derive(Debug, Clone)]
struct TrustRoot {
    der: CertificateDer<'static>,
    anchor: TrustAnchor<'static>,
}

/// Ordered set of trusted root certificates.
#[derive(Debug, Clone, Default)]
pub struct TrustRootSet {
    roots: Vec<TrustRoot>,
    anchors: Vec<TrustAnchor<'static>>,
}

impl TrustRootSet {
    /// Parses PEM root certificates.
    ///
    /// Each entry may hold several `CERTIFICATE` blocks (a bundle) but must
    /// hold at least one, and every block must be a usable trust anchor.
    pub fn from_pem<S: AsRef<str>>(pems: &[S]) -> Result<Self, ConfigError> {
        let mut set = TrustRootSet::default();
        for (index, pem) in pems.iter().enumerate() {
            let certs = CertificateDer::pem_slice_iter(pem.as_ref().as_bytes())
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| ConfigError::InvalidRoot {
                    index,
                    reason: format!("{e:?}"),
                })?;
            if certs.is_empty() {
                return Err(ConfigError::InvalidRoot {
                    index,
                    reason: "no CERTIFICATE block found".into(),
                });
            }
            for der in certs {
                set.push(index, der)?;
            }
        }
        Ok(set)
    }

    /// Builds the set from DER certificates.
    pub fn from_der(certs: Vec<CertificateDer<'static>>) -> Result<Self, ConfigError> {
        let mut set = TrustRootSet::default();
        for (index, der) in certs.into_iter().enumerate() {
            set.push(index, der)?;
        }
        Ok(set)
    }

    fn push(&mut self, index: usize, der: CertificateDer<'static>) -> Result<(), ConfigError> {
        let anchor = webpki::anchor_from_trusted_cert(&der)
            .map_err(|e| ConfigError::InvalidRoot {
                index,
                reason: e.to_string(),
            })?
            .to_owned();
        self.anchors.push(anchor.clone());
        self.roots.push(TrustRoot { der, anchor });
        Ok(())
    }

    /// Trust anchors in configuration order.
    pub fn anchors(&self) -> &[TrustAnchor<'static>] {
        &self.anchors
    }

    /// The root certificate an anchor was derived from.
    pub fn certificate_for(&self, anchor: &TrustAnchor<'_>) -> Option<&CertificateDer<'static>> {
        self.roots
            .iter()
            .find(|root| {
                root.anchor.subject.as_ref() == anchor.subject.as_ref()
                    && root.anchor.subject_public_key_info.as_ref()
                        == anchor.subject_public_key_info.as_ref()
            })
            .map(|root| &root.der)
    }

    /// Number of root certificates.
    pub fn len(&self) -> usize {
        self.roots.len()
    }

    /// Returns true when no root is configured; every dial will then fail
    /// chain verification.
    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }
}
