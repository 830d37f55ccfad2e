// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Chain-Capturing Certificate Verifier
//!
//! Standard WebPKI path validation against the dialer's own trust roots.
//! Unlike the stock rustls verifier it keeps the path it validated, so the
//! dialer can inspect the exact chain after the handshake.
//!
//! One verifier is created per dial; its capture is never shared between
//! connections.

use std::sync::Arc;

use parking_lot::Mutex;
use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::crypto::{verify_tls12_signature, verify_tls13_signature, CryptoProvider};
use rustls::{CertificateError, DigitallySignedStruct, OtherError, SignatureScheme};
use rustls_pki_types::{CertificateDer, ServerName, UnixTime};

use super::chain::VerifiedChain;
use super::trust::TrustRootSet;

#[derive(Debug)]
pub(crate) struct ChainCapturingVerifier {
    roots: Arc<TrustRootSet>,
    provider: Arc<CryptoProvider>,
    verified: Mutex<Vec<VerifiedChain>>,
}

impl ChainCapturingVerifier {
    pub(crate) fn new(roots: Arc<TrustRootSet>, provider: Arc<CryptoProvider>) -> Self {
        ChainCapturingVerifier {
            roots,
            provider,
            verified: Mutex::new(Vec::new()),
        }
    }

    /// Chains validated so far, in handshake order.
    pub(crate) fn take_verified(&self) -> Vec<VerifiedChain> {
        std::mem::take(&mut *self.verified.lock())
    }

    fn build_chain(
        &self,
        end_entity: &CertificateDer<'_>,
        intermediates: &[CertificateDer<'_>],
        now: UnixTime,
    ) -> Result<VerifiedChain, rustls::Error> {
        let cert = webpki::EndEntityCert::try_from(end_entity).map_err(certificate_error)?;

        let path = cert
            .verify_for_usage(
                self.provider.signature_verification_algorithms.all,
                self.roots.anchors(),
                intermediates,
                now,
                webpki::KeyUsage::server_auth(),
                None,
                None,
            )
            .map_err(certificate_error)?;

        let root = self.roots.certificate_for(path.anchor()).ok_or_else(|| {
            rustls::Error::General("verified path ends in an unknown trust anchor".into())
        })?;

        let mut certificates = Vec::with_capacity(intermediates.len() + 2);
        certificates.push(end_entity.clone().into_owned());
        certificates.extend(
            path.intermediate_certificates()
                .map(|c| c.der().into_owned()),
        );
        certificates.push(root.clone());

        Ok(VerifiedChain::new(certificates))
    }
}

impl ServerCertVerifier for ChainCapturingVerifier {
    fn verify_server_cert(
        &self,
        end_entity: &CertificateDer<'_>,
        intermediates: &[CertificateDer<'_>],
        server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        let chain = self.build_chain(end_entity, intermediates, now)?;

        webpki::EndEntityCert::try_from(end_entity)
            .and_then(|cert| cert.verify_is_valid_for_subject_name(server_name))
            .map_err(certificate_error)?;

        tracing::debug!(
            server_name = ?server_name,
            chain_len = chain.len(),
            "certificate path verified"
        );
        self.verified.lock().push(chain);
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls12_signature(
            message,
            cert,
            dss,
            &self.provider.signature_verification_algorithms,
        )
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls13_signature(
            message,
            cert,
            dss,
            &self.provider.signature_verification_algorithms,
        )
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.provider
            .signature_verification_algorithms
            .supported_schemes()
    }
}

fn certificate_error(err: webpki::Error) -> rustls::Error {
    use webpki::Error as E;

    let reason = match err {
        E::UnknownIssuer => CertificateError::UnknownIssuer,
        E::CertExpired { .. } => CertificateError::Expired,
        E::CertNotValidYet { .. } => CertificateError::NotValidYet,
        E::CertNotValidForName { .. } => CertificateError::NotValidForName,
        E::CertRevoked => CertificateError::Revoked,
        E::BadDer | E::BadDerTime => CertificateError::BadEncoding,
        E::InvalidSignatureForPublicKey { .. } => CertificateError::BadSignature,
        other => CertificateError::Other(OtherError(Arc::new(other))),
    };
    rustls::Error::InvalidCertificate(reason)
}
