// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Network Error Types

use std::io;

use thiserror::Error;

use crate::crypto::{KeyBatchError, KeyError};

/// The dialer could not be built from its configuration.
///
/// Always fatal: there is no partially configured dialer.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A pinned key failed to canonicalize.
    #[error("invalid pinned key: {0}")]
    InvalidPin(#[from] KeyBatchError),

    /// A trust root failed to decode or parse.
    #[error("invalid trust root #{index}: {reason}")]
    InvalidRoot {
        /// Position of the root in the configured list.
        index: usize,
        /// Decoder or parser message.
        reason: String,
    },

    /// The server name override is not a valid DNS name or IP address.
    #[error("invalid TLS server name {0:?}")]
    InvalidServerName(String),

    /// rustls refused the session parameters.
    #[error("TLS configuration rejected: {0}")]
    Tls(#[from] rustls::Error),
}

/// Why the peer's certificate chain was not acceptable.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ChainError {
    /// Path validation against the trust roots failed during the handshake.
    #[error("certificate chain not trusted: {0}")]
    Untrusted(rustls::CertificateError),

    /// The handshake did not produce exactly one verified chain.
    #[error("expected exactly one verified chain, got {count}")]
    Ambiguous {
        /// Number of verified chains.
        count: usize,
    },

    /// The peer offered certificates outside the verified path.
    #[error("verified chain has {verified} certificates but peer offered {offered}")]
    LengthMismatch {
        /// Verified chain length.
        verified: usize,
        /// Offered certificate count.
        offered: usize,
    },

    /// A certificate of the verified chain is not among the offered ones.
    #[error("verified certificate #{position} was not offered by the peer")]
    NotOffered {
        /// Position in the verified chain (0 is the leaf).
        position: usize,
    },

    /// The handshake completed without peer certificates.
    #[error("peer offered no certificates")]
    NoPeerCertificates,
}

/// A dial attempt failed. The underlying connection is closed.
#[derive(Debug, Error)]
pub enum DialError {
    /// Only `tcp`, `tcp4` and `tcp6` are supported.
    #[error("unsupported network {0:?} (expected tcp, tcp4 or tcp6)")]
    UnsupportedNetwork(String),

    /// The address is not `host:port`.
    #[error("invalid address {0:?}")]
    InvalidAddress(String),

    /// Name resolution failed.
    #[error("failed to resolve {address}: {source}")]
    Resolve {
        /// Dialed address.
        address: String,
        /// Resolver error.
        #[source]
        source: io::Error,
    },

    /// Resolution returned no address of the requested family.
    #[error("no {network} address found for {address}")]
    NoAddress {
        /// Requested network.
        network: String,
        /// Dialed address.
        address: String,
    },

    /// Every resolved address refused or failed the TCP connect.
    #[error("connection failed: {0}")]
    Connect(#[source] io::Error),

    /// The dialed host cannot be used as a TLS server name.
    #[error("invalid TLS server name {0:?}")]
    InvalidServerName(String),

    /// The dial deadline passed.
    #[error("dial timed out")]
    Timeout,

    /// The TLS handshake failed for a reason other than chain validation.
    #[error("TLS handshake failed: {0}")]
    Handshake(rustls::Error),

    /// The certificate chain was rejected.
    #[error("failed to verify certificate chain: {0}")]
    VerifyChain(#[from] ChainError),

    /// A verified certificate's public key could not be canonicalized.
    #[error("failed to read public key of verified certificate #{position}: {source}")]
    CertificateKey {
        /// Position in the verified chain.
        position: usize,
        /// Canonicalization error.
        #[source]
        source: KeyError,
    },

    /// The chain is valid but carries none of the pinned keys.
    #[error("failed to verify public key: no pinned key in verified chain")]
    FailedPin,

    /// Socket error outside the handshake.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Result type for dial operations.
pub type DialResult<T> = Result<T, DialError>;
