// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Public Key Pinning
//!
//! Pins are canonical SubjectPublicKeyInfo encodings. A verified chain is
//! accepted when any of its certificates carries a pinned key.

use crate::crypto::{canonicalize_all, canonicalize_certificate_key, CanonicalKey};

use super::chain::VerifiedChain;
use super::error::{ConfigError, DialError};

/// Which pin matched which certificate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PinMatch {
    /// Index of the pin in the configured order.
    pub pin_index: usize,
    /// Position of the certificate in the verified chain (0 is the leaf).
    pub chain_position: usize,
    /// SHA-256 fingerprint of the matched key.
    pub fingerprint: String,
}

/// Immutable, ordered set of pinned public keys.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PinnedKeySet {
    keys: Vec<CanonicalKey>,
}

impl PinnedKeySet {
    /// Canonicalizes every PEM public key. One bad entry rejects the whole set.
    pub fn from_pem<S: AsRef<str>>(pems: &[S]) -> Result<Self, ConfigError> {
        let keys = canonicalize_all(pems)?;
        Ok(PinnedKeySet { keys })
    }

    /// Creates a set from already canonical keys.
    pub fn from_keys(keys: Vec<CanonicalKey>) -> Self {
        PinnedKeySet { keys }
    }

    /// Number of pinned keys.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// True when no key is pinned; every dial is then rejected.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Pinned keys in configured order.
    pub fn iter(&self) -> impl Iterator<Item = &CanonicalKey> {
        self.keys.iter()
    }

    /// Searches the chain for a pinned key, stopping at the first match.
    ///
    /// Returns `Ok(None)` when nothing matches, including for an empty pin set.
    pub fn find_match(&self, chain: &VerifiedChain) -> Result<Option<PinMatch>, DialError> {
        if self.keys.is_empty() {
            return Ok(None);
        }

        let offered = chain
            .certificates()
            .iter()
            .enumerate()
            .map(|(position, cert)| {
                canonicalize_certificate_key(cert.as_ref())
                    .map_err(|source| DialError::CertificateKey { position, source })
            })
            .collect::<Result<Vec<_>, _>>()?;

        for (pin_index, pin) in self.keys.iter().enumerate() {
            for (chain_position, key) in offered.iter().enumerate() {
                if pin == key {
                    return Ok(Some(PinMatch {
                        pin_index,
                        chain_position,
                        fingerprint: pin.fingerprint(),
                    }));
                }
            }
        }

        Ok(None)
    }
}
