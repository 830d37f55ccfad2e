// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Pinned TLS Transport
//!
//! Dials TLS connections that must satisfy two independent checks:
//! - **Chain validation**: the peer's chain leads to one of the dialer's
//!   own trust roots and is valid for the server name;
//! - **Key pinning**: a certificate of that verified chain carries one of
//!   the pinned public keys.
//!
//! # Example
//!
//! ```ignore
//! use pinner_core::network::{DialerConfig, PinningDialer};
//!
//! let dialer = PinningDialer::new(&pinned_keys, &trust_roots, DialerConfig::from_env())?;
//! let stream = dialer.dial("tcp", "vault.internal:8200")?;
//! println!("admitted by key {}", stream.pin_match().fingerprint);
//! ```

mod chain;
mod config;
mod dialer;
mod error;
mod pinning;
mod session;
mod trust;
mod verifier;

pub use chain::{check_chain_shape, VerifiedChain};
pub use config::{DialerConfig, ENV_TLS_SERVER_NAME};
pub use dialer::{Dialer, PinnedStream, PinningDialer};
pub use error::{ChainError, ConfigError, DialError, DialResult};
pub use pinning::{PinMatch, PinnedKeySet};
pub use session::{CIPHER_SUITES, PROTOCOL_VERSIONS};
pub use trust::TrustRootSet;
