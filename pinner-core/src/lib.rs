// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Pinner Core Library
//!
//! TLS dialer that performs public-key pinning on top of certificate chain
//! validation against a private trust root set. A connection is only handed
//! to the caller when a certificate of the verified chain carries one of the
//! pinned public keys.

pub mod crypto;
pub mod network;

pub use crypto::{
    canonicalize, canonicalize_all, canonicalize_certificate_key, canonicalize_der,
    CanonicalKey, KeyBatchError, KeyError,
};
pub use network::{
    check_chain_shape, ChainError, ConfigError, DialError, DialResult, Dialer, DialerConfig,
    PinMatch, PinnedKeySet, PinnedStream, PinningDialer, TrustRootSet, VerifiedChain,
    ENV_TLS_SERVER_NAME,
};
