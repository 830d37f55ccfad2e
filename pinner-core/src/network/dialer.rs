// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Pinning Dialer
//!
//! Opens a TCP connection, runs the TLS handshake against the dialer's own
//! trust roots and only hands the stream out when the verified chain
//! carries a pinned public key.
//!
//! Per dial: `Dialing -> HandshakeValidated -> ChainShapeChecked ->
//! PinSearch -> Accepted | Rejected`. Nothing is kept between dials.

use std::fmt;
use std::io::{self, Read, Write};
use std::net::{IpAddr, Shutdown, SocketAddr, TcpStream, ToSocketAddrs};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use rustls::{ClientConnection, StreamOwned};
use rustls_pki_types::ServerName;
use tracing::{debug, info, warn};

use super::chain::check_chain_shape;
use super::config::DialerConfig;
use super::error::{ChainError, ConfigError, DialError, DialResult};
use super::pinning::{PinMatch, PinnedKeySet};
use super::session::SessionPolicy;
use super::trust::TrustRootSet;
use super::verifier::ChainCapturingVerifier;

/// Something that opens secured connections to `(network, address)`.
///
/// This is the extension point for HTTP clients and other collaborators
/// that need a custom transport.
pub trait Dialer: Send + Sync {
    /// Connection handed out on success.
    type Stream: Read + Write + Send;

    /// Opens a connection. `network` is `tcp`, `tcp4` or `tcp6`; `address`
    /// is `host:port` (`[v6]:port` for IPv6 literals).
    fn dial(&self, network: &str, address: &str) -> DialResult<Self::Stream>;
}

impl<D: Dialer + ?Sized> Dialer for Arc<D> {
    type Stream = D::Stream;

    fn dial(&self, network: &str, address: &str) -> DialResult<Self::Stream> {
        (**self).dial(network, address)
    }
}

/// TLS dialer enforcing public-key pins on the verified chain.
///
/// Immutable after construction and cheap to clone; safe to share between
/// threads dialing concurrently.
///
/// # Example
///
/// ```ignore
/// use pinner_core::{DialerConfig, PinningDialer};
///
/// let dialer = PinningDialer::new(&pins, &roots, DialerConfig::from_env())?;
/// let mut stream = dialer.dial("tcp", "vault.internal:8200")?;
/// stream.write_all(b"GET /v1/sys/health HTTP/1.1\r\nHost: vault\r\n\r\n")?;
/// ```
#[derive(Debug, Clone)]
pub struct PinningDialer {
    pins: Arc<PinnedKeySet>,
    roots: Arc<TrustRootSet>,
    policy: SessionPolicy,
    server_name: Option<ServerName<'static>>,
    config: DialerConfig,
}

impl PinningDialer {
    /// Builds a dialer from PEM public keys and PEM root certificates.
    ///
    /// Fails if any pin or root is unusable; a dialer is never built from a
    /// partially valid configuration.
    pub fn new<P, R>(
        pinned_keys: &[P],
        trust_roots: &[R],
        config: DialerConfig,
    ) -> Result<Self, ConfigError>
    where
        P: AsRef<str>,
        R: AsRef<str>,
    {
        let pins = PinnedKeySet::from_pem(pinned_keys)?;
        let roots = TrustRootSet::from_pem(trust_roots)?;
        Self::from_parts(pins, roots, config)
    }

    /// Builds a dialer from already parsed pins and roots.
    pub fn from_parts(
        pins: PinnedKeySet,
        roots: TrustRootSet,
        config: DialerConfig,
    ) -> Result<Self, ConfigError> {
        let server_name = config
            .server_name
            .as_deref()
            .map(|name| {
                ServerName::try_from(name.to_owned())
                    .map_err(|_| ConfigError::InvalidServerName(name.to_owned()))
            })
            .transpose()?;

        let policy = SessionPolicy::new();
        let roots = Arc::new(roots);

        // Surface provider/version mismatches now rather than on first dial.
        policy.client_config(Arc::new(ChainCapturingVerifier::new(
            roots.clone(),
            policy.provider().clone(),
        )))?;

        if pins.is_empty() {
            warn!("no pinned keys configured, every dial will be rejected");
        }
        if roots.is_empty() {
            warn!("no trust roots configured, every dial will fail chain verification");
        }
        debug!(
            pins = pins.len(),
            roots = roots.len(),
            server_name = ?config.server_name,
            "pinning dialer ready"
        );

        Ok(PinningDialer {
            pins: Arc::new(pins),
            roots,
            policy,
            server_name,
            config,
        })
    }

    /// The pinned keys.
    pub fn pins(&self) -> &PinnedKeySet {
        &self.pins
    }

    /// The trust roots.
    pub fn roots(&self) -> &TrustRootSet {
        &self.roots
    }

    /// The configuration the dialer was built with.
    pub fn config(&self) -> &DialerConfig {
        &self.config
    }

    /// Dials with the configured connect timeout.
    pub fn dial(&self, network: &str, address: &str) -> DialResult<PinnedStream> {
        self.dial_timeout(network, address, self.config.connect_timeout)
    }

    /// Dials with an explicit deadline covering name resolution, TCP connect
    /// and the whole handshake.
    ///
    /// The socket is shut down on every failure path.
    pub fn dial_timeout(
        &self,
        network: &str,
        address: &str,
        timeout: Duration,
    ) -> DialResult<PinnedStream> {
        let deadline = Instant::now() + timeout;
        let family = AddressFamily::parse(network)?;
        let (host, port) = split_host_port(address)?;

        let server_name = match &self.server_name {
            Some(name) => name.clone(),
            None => ServerName::try_from(host.to_owned())
                .map_err(|_| DialError::InvalidServerName(host.to_owned()))?,
        };

        let mut tcp = connect_tcp(family, network, address, host, port, deadline)?;

        let verifier = Arc::new(ChainCapturingVerifier::new(
            self.roots.clone(),
            self.policy.provider().clone(),
        ));
        let mut conn = match self
            .policy
            .client_config(verifier.clone())
            .and_then(|config| ClientConnection::new(Arc::new(config), server_name))
        {
            Ok(conn) => conn,
            Err(err) => {
                let _ = tcp.shutdown(Shutdown::Both);
                return Err(DialError::Handshake(err));
            }
        };

        if let Err(err) = handshake(&mut conn, &mut tcp, deadline) {
            warn!(%address, error = %err, "TLS handshake rejected");
            let _ = tcp.shutdown(Shutdown::Both);
            return Err(err);
        }

        let verified = verifier.take_verified();
        let offered = conn.peer_certificates().unwrap_or(&[]);
        let chain = match check_chain_shape(&verified, offered) {
            Ok(chain) => chain,
            Err(err) => {
                warn!(%address, error = %err, "certificate chain rejected");
                reject(conn, tcp);
                return Err(DialError::VerifyChain(err));
            }
        };

        match self.pins.find_match(chain) {
            Ok(Some(pin)) => {
                info!(
                    %address,
                    key = %pin.fingerprint,
                    chain_position = pin.chain_position,
                    "pinned key matched"
                );
                let timeouts = tcp
                    .set_read_timeout(self.config.io_timeout)
                    .and_then(|()| tcp.set_write_timeout(self.config.io_timeout));
                if let Err(err) = timeouts {
                    reject(conn, tcp);
                    return Err(DialError::Io(err));
                }
                Ok(PinnedStream {
                    inner: StreamOwned::new(conn, tcp),
                    pin,
                })
            }
            Ok(None) => {
                warn!(
                    %address,
                    chain_len = chain.len(),
                    pins = self.pins.len(),
                    "no pinned key in verified chain"
                );
                reject(conn, tcp);
                Err(DialError::FailedPin)
            }
            Err(err) => {
                warn!(%address, error = %err, "cannot read verified certificate key");
                reject(conn, tcp);
                Err(err)
            }
        }
    }
}

impl Dialer for PinningDialer {
    type Stream = PinnedStream;

    fn dial(&self, network: &str, address: &str) -> DialResult<PinnedStream> {
        PinningDialer::dial(self, network, address)
    }
}

/// A TLS stream whose verified chain carried a pinned key.
pub struct PinnedStream {
    inner: StreamOwned<ClientConnection, TcpStream>,
    pin: PinMatch,
}

impl PinnedStream {
    /// The pin that admitted this connection.
    pub fn pin_match(&self) -> &PinMatch {
        &self.pin
    }

    /// Remote address of the underlying socket.
    pub fn peer_addr(&self) -> io::Result<SocketAddr> {
        self.inner.sock.peer_addr()
    }

    /// TLS session state (negotiated version, suite, peer certificates).
    pub fn connection(&self) -> &ClientConnection {
        &self.inner.conn
    }

    /// Sends `close_notify` and shuts the socket down.
    pub fn shutdown(&mut self) -> io::Result<()> {
        self.inner.conn.send_close_notify();
        self.inner.flush()?;
        self.inner.sock.shutdown(Shutdown::Both)
    }
}

impl Read for PinnedStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }
}

impl Write for PinnedStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

impl fmt::Debug for PinnedStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PinnedStream")
            .field("peer_addr", &self.inner.sock.peer_addr().ok())
            .field("pin", &self.pin)
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AddressFamily {
    Any,
    V4,
    V6,
}

impl AddressFamily {
    fn parse(network: &str) -> DialResult<Self> {
        match network {
            "tcp" => Ok(AddressFamily::Any),
            "tcp4" => Ok(AddressFamily::V4),
            "tcp6" => Ok(AddressFamily::V6),
            other => Err(DialError::UnsupportedNetwork(other.to_owned())),
        }
    }

    fn accepts(self, addr: &SocketAddr) -> bool {
        match self {
            AddressFamily::Any => true,
            AddressFamily::V4 => addr.is_ipv4(),
            AddressFamily::V6 => addr.is_ipv6(),
        }
    }
}

/// Splits `host:port`, unwrapping `[v6]:port`.
fn split_host_port(address: &str) -> DialResult<(&str, u16)> {
    let invalid = || DialError::InvalidAddress(address.to_owned());

    let (host, port) = address.rsplit_once(':').ok_or_else(invalid)?;
    let host = match host.strip_prefix('[') {
        Some(inner) => inner.strip_suffix(']').ok_or_else(invalid)?,
        None if host.contains(':') => return Err(invalid()),
        None => host,
    };
    if host.is_empty() {
        return Err(invalid());
    }
    let port = port.parse::<u16>().map_err(|_| invalid())?;

    Ok((host, port))
}

fn remaining(deadline: Instant) -> DialResult<Duration> {
    let left = deadline.saturating_duration_since(Instant::now());
    if left.is_zero() {
        Err(DialError::Timeout)
    } else {
        Ok(left)
    }
}

/// Resolves `host` on a helper thread so a slow resolver cannot outlive
/// `deadline`. IP literals skip the resolver.
fn resolve(host: &str, port: u16, address: &str, deadline: Instant) -> DialResult<Vec<SocketAddr>> {
    if let Ok(ip) = host.parse::<IpAddr>() {
        return Ok(vec![SocketAddr::new(ip, port)]);
    }

    let resolve_error = |source| DialError::Resolve {
        address: address.to_owned(),
        source,
    };

    let left = remaining(deadline)?;
    let (tx, rx) = mpsc::channel();
    let target = (host.to_owned(), port);
    thread::Builder::new()
        .name("pinner-resolve".into())
        .spawn(move || {
            let result = target
                .to_socket_addrs()
                .map(|addrs| addrs.collect::<Vec<_>>());
            // The dial may have given up already.
            let _ = tx.send(result);
        })
        .map_err(resolve_error)?;

    match rx.recv_timeout(left) {
        Ok(result) => result.map_err(resolve_error),
        Err(RecvTimeoutError::Timeout) => {
            debug!(%address, "name resolution timed out");
            Err(DialError::Timeout)
        }
        Err(RecvTimeoutError::Disconnected) => {
            Err(resolve_error(io::Error::other("resolver thread exited")))
        }
    }
}

fn connect_tcp(
    family: AddressFamily,
    network: &str,
    address: &str,
    host: &str,
    port: u16,
    deadline: Instant,
) -> DialResult<TcpStream> {
    let addrs: Vec<SocketAddr> = resolve(host, port, address, deadline)?
        .into_iter()
        .filter(|addr| family.accepts(addr))
        .collect();

    if addrs.is_empty() {
        return Err(DialError::NoAddress {
            network: network.to_owned(),
            address: address.to_owned(),
        });
    }

    let mut last_err = None;
    for addr in addrs {
        let left = remaining(deadline)?;
        match TcpStream::connect_timeout(&addr, left) {
            Ok(stream) => {
                debug!(%addr, "TCP connected");
                return Ok(stream);
            }
            Err(err) => {
                debug!(%addr, error = %err, "TCP connect failed");
                last_err = Some(err);
            }
        }
    }

    Err(match last_err {
        Some(err) if is_timeout(&err) => DialError::Timeout,
        Some(err) => DialError::Connect(err),
        None => DialError::Timeout,
    })
}

/// Runs the handshake one socket operation at a time. Every read and write
/// gets only the time left until `deadline`, so a peer that trickles bytes
/// cannot stretch the dial.
fn handshake(conn: &mut ClientConnection, tcp: &mut TcpStream, deadline: Instant) -> DialResult<()> {
    while conn.is_handshaking() {
        flush_tls(conn, tcp, deadline)?;
        if !conn.is_handshaking() {
            break;
        }
        if !conn.wants_read() {
            return Err(DialError::Handshake(rustls::Error::HandshakeNotComplete));
        }

        tcp.set_read_timeout(Some(remaining(deadline)?))?;
        if conn.read_tls(tcp).map_err(socket_error)? == 0 {
            return Err(DialError::Io(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "peer closed the connection during the handshake",
            )));
        }
        if let Err(err) = conn.process_new_packets() {
            // Best effort: let the peer see the alert.
            let _ = conn.write_tls(tcp);
            return Err(tls_error(err));
        }
    }

    // Final flight (client Finished).
    flush_tls(conn, tcp, deadline)
}

fn flush_tls(conn: &mut ClientConnection, tcp: &mut TcpStream, deadline: Instant) -> DialResult<()> {
    while conn.wants_write() {
        tcp.set_write_timeout(Some(remaining(deadline)?))?;
        conn.write_tls(tcp).map_err(socket_error)?;
    }
    Ok(())
}

/// Sorts a TLS failure into chain rejection or other handshake error.
fn tls_error(err: rustls::Error) -> DialError {
    match err {
        rustls::Error::InvalidCertificate(reason) => {
            DialError::VerifyChain(ChainError::Untrusted(reason))
        }
        other => DialError::Handshake(other),
    }
}

fn socket_error(err: io::Error) -> DialError {
    if is_timeout(&err) {
        DialError::Timeout
    } else {
        DialError::Io(err)
    }
}

fn is_timeout(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock
    )
}

/// Closes a connection that completed the handshake but was not accepted.
fn reject(mut conn: ClientConnection, mut tcp: TcpStream) {
    conn.send_close_notify();
    while conn.wants_write() {
        if conn.write_tls(&mut tcp).is_err() {
            break;
        }
    }
    let _ = tcp.shutdown(Shutdown::Both);
}
