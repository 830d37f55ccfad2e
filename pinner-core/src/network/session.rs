// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! TLS Session Parameters
//!
//! Hardened client parameters shared by every dial: TLS 1.2 floor, an
//! explicit allow-list of forward-secret AEAD suites and no resumption.

use std::sync::Arc;

use rustls::client::Resumption;
use rustls::crypto::{ring, CryptoProvider};
use rustls::{ClientConfig, SupportedCipherSuite, SupportedProtocolVersion};

use super::verifier::ChainCapturingVerifier;

/// Cipher suites a dial may negotiate.
///
/// No CBC, RC4, 3DES, export or static-RSA key exchange.
pub static CIPHER_SUITES: &[SupportedCipherSuite] = &[
    ring::cipher_suite::TLS13_AES_256_GCM_SHA384,
    ring::cipher_suite::TLS13_AES_128_GCM_SHA256,
    ring::cipher_suite::TLS13_CHACHA20_POLY1305_SHA256,
    #[cfg(feature = "tls12")]
    ring::cipher_suite::TLS_ECDHE_ECDSA_WITH_AES_256_GCM_SHA384,
    #[cfg(feature = "tls12")]
    ring::cipher_suite::TLS_ECDHE_ECDSA_WITH_AES_128_GCM_SHA256,
    #[cfg(feature = "tls12")]
    ring::cipher_suite::TLS_ECDHE_ECDSA_WITH_CHACHA20_POLY1305_SHA256,
    #[cfg(feature = "tls12")]
    ring::cipher_suite::TLS_ECDHE_RSA_WITH_AES_256_GCM_SHA384,
    #[cfg(feature = "tls12")]
    ring::cipher_suite::TLS_ECDHE_RSA_WITH_AES_128_GCM_SHA256,
    #[cfg(feature = "tls12")]
    ring::cipher_suite::TLS_ECDHE_RSA_WITH_CHACHA20_POLY1305_SHA256,
];

/// Protocol versions a dial may negotiate, newest first.
pub static PROTOCOL_VERSIONS: &[&SupportedProtocolVersion] = &[
    &rustls::version::TLS13,
    #[cfg(feature = "tls12")]
    &rustls::version::TLS12,
];

/// Builds per-dial client configs from a fixed crypto provider.
#[derive(Debug, Clone)]
pub(crate) struct SessionPolicy {
    provider: Arc<CryptoProvider>,
}

impl SessionPolicy {
    pub(crate) fn new() -> Self {
        let provider = CryptoProvider {
            cipher_suites: CIPHER_SUITES.to_vec(),
            ..ring::default_provider()
        };
        SessionPolicy {
            provider: Arc::new(provider),
        }
    }

    pub(crate) fn provider(&self) -> &Arc<CryptoProvider> {
        &self.provider
    }

    /// Client config bound to one dial's verifier.
    ///
    /// Resumption is disabled so every connection runs full chain
    /// verification and the pin check.
    pub(crate) fn client_config(
        &self,
        verifier: Arc<ChainCapturingVerifier>,
    ) -> Result<ClientConfig, rustls::Error> {
        let mut config = ClientConfig::builder_with_provider(self.provider.clone())
            .with_protocol_versions(PROTOCOL_VERSIONS)?
            .dangerous()
            .with_custom_certificate_verifier(verifier)
            .with_no_client_auth();
        config.resumption = Resumption::disabled();
        config.enable_sni = true;
        Ok(config)
    }
}
