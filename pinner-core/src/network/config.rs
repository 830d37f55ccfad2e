// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Dialer Configuration

use std::time::Duration;

/// Environment variable overriding the TLS server name (SNI and hostname check).
pub const ENV_TLS_SERVER_NAME: &str = "VAULT_TLS_SERVER_NAME";

/// Configuration for a [`PinningDialer`](super::PinningDialer).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialerConfig {
    /// Server name sent as SNI and checked against the leaf certificate,
    /// instead of the host part of the dialed address.
    pub server_name: Option<String>,
    /// Deadline for TCP connect plus TLS handshake.
    pub connect_timeout: Duration,
    /// Read/write timeout applied to established streams.
    pub io_timeout: Option<Duration>,
}

impl Default for DialerConfig {
    fn default() -> Self {
        DialerConfig {
            server_name: None,
            connect_timeout: Duration::from_secs(10),
            io_timeout: Some(Duration::from_secs(30)),
        }
    }
}

impl DialerConfig {
    /// Default config with the server name override taken from
    /// [`ENV_TLS_SERVER_NAME`]. An empty value counts as unset.
    ///
    /// This is the only place the environment is read.
    pub fn from_env() -> Self {
        let server_name = std::env::var(ENV_TLS_SERVER_NAME)
            .ok()
            .filter(|v| !v.trim().is_empty());
        if let Some(name) = &server_name {
            tracing::debug!(server_name = %name, "TLS server name override from environment");
        }
        DialerConfig {
            server_name,
            ..Default::default()
        }
    }

    /// Sets the server name override.
    pub fn with_server_name(mut self, server_name: impl Into<String>) -> Self {
        self.server_name = Some(server_name.into());
        self
    }

    /// Sets the connect + handshake deadline.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sets (or clears) the stream read/write timeout.
    pub fn with_io_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.io_timeout = timeout;
        self
    }
}
