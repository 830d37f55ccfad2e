// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Cryptographic Key Handling
//!
//! Canonical public-key encoding used for pin comparison.

mod canonical;

pub use canonical::{
    canonicalize, canonicalize_all, canonicalize_certificate_key, canonicalize_der,
    CanonicalKey, KeyBatchError, KeyError,
};
