//! UDP receive loop
//!
//! An [`OscSocket`] owns one IPv4 UDP socket and, once started, one dedicated
//! thread. The thread runs a single-threaded tokio runtime and parks on
//! whichever finishes first: the pending receive or a shutdown request.
//! Datagrams are handed to the [`ReceiveSink`] on that same thread, so the
//! receive buffer is never written while it is being parsed.
//!
//! Shutdown is cooperative. [`OscSocket::dispose`] raises a flag and wakes the
//! thread, which closes the socket itself. A socket that was never started is
//! closed on the spot.

use std::any::Any;
use std::io;
use std::net::{Ipv4Addr, SocketAddr};
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use serde::{Deserialize, Serialize};
use socket2::{Domain, Protocol, Socket, Type};
use tokio::net::UdpSocket;
use tokio::runtime::Runtime;
use tokio::sync::Notify;
use tracing::{debug, error, info, trace, warn};

use crate::error::{Result, TransportError};
use crate::traits::ReceiveSink;

/// Receive loop configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SocketConfig {
    /// Local interface to bind (default: all interfaces)
    #[serde(default = "default_bind_addr")]
    pub bind_addr: Ipv4Addr,
    /// UDP port; 0 picks an ephemeral port
    pub port: u16,
    /// Name of the receive thread
    #[serde(default = "default_thread_name")]
    pub thread_name: String,
}

fn default_bind_addr() -> Ipv4Addr {
    Ipv4Addr::UNSPECIFIED
}

fn default_thread_name() -> String {
    "osc-receive".to_string()
}

impl Default for SocketConfig {
    fn default() -> Self {
        Self::with_port(oscore_core::DEFAULT_PORT)
    }
}

impl SocketConfig {
    pub fn with_port(port: u16) -> Self {
        Self {
            bind_addr: default_bind_addr(),
            port,
            thread_name: default_thread_name(),
        }
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::from((self.bind_addr, self.port))
    }
}

/// Back-to-back receive failures tolerated before the loop gives up
const MAX_CONSECUTIVE_FAILURES: u32 = 64;

/// State shared between the owner and the receive thread
#[derive(Default)]
struct Shared {
    close_requested: AtomicBool,
    wakeup: Notify,
    running: AtomicBool,
    closed: AtomicBool,
}

/// UDP socket with a dedicated receive thread
pub struct OscSocket<S: ReceiveSink> {
    config: SocketConfig,
    socket: Option<Socket>,
    sink: Option<S>,
    local_addr: Option<SocketAddr>,
    shared: Arc<Shared>,
    thread: Option<JoinHandle<()>>,
    started: bool,
    disposed: bool,
}

impl<S: ReceiveSink> OscSocket<S> {
    /// Create the (unbound) socket; nothing is received until [`start`](Self::start)
    pub fn new(config: SocketConfig, sink: S) -> Result<Self> {
        let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))?;

        Ok(Self {
            config,
            socket: Some(socket),
            sink: Some(sink),
            local_addr: None,
            shared: Arc::new(Shared::default()),
            thread: None,
            started: false,
            disposed: false,
        })
    }

    /// Bind the socket and launch the receive thread. Calling it again is a no-op.
    pub fn start(&mut self) -> Result<()> {
        if self.started {
            return Ok(());
        }
        if self.disposed {
            return Err(TransportError::AlreadyDisposed);
        }

        let socket = self.socket.as_ref().ok_or(TransportError::AlreadyDisposed)?;
        let addr = self.config.socket_addr();
        socket
            .bind(&addr.into())
            .map_err(|source| TransportError::BindFailed { addr, source })?;
        socket.set_nonblocking(true)?;
        self.local_addr = socket.local_addr()?.as_socket();

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_io()
            .build()?;

        let (Some(socket), Some(sink)) = (self.socket.take(), self.sink.take()) else {
            return Err(TransportError::AlreadyDisposed);
        };
        let shared = self.shared.clone();
        shared.running.store(true, Ordering::Release);

        let spawned = thread::Builder::new()
            .name(self.config.thread_name.clone())
            .spawn(move || serve(runtime, socket.into(), sink, shared));
        let handle = match spawned {
            Ok(handle) => handle,
            Err(e) => {
                self.shared.running.store(false, Ordering::Release);
                self.shared.closed.store(true, Ordering::Release);
                return Err(e.into());
            }
        };

        info!(
            "OSC socket listening on {}",
            self.local_addr.unwrap_or(addr)
        );
        self.thread = Some(handle);
        self.started = true;
        Ok(())
    }

    /// Stop receiving and close the socket. Safe to call more than once.
    ///
    /// With the loop running this only signals it; the socket is closed on the
    /// receive thread shortly after. Use [`join`](Self::join) to wait for that.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }

        if self.started {
            self.shared.close_requested.store(true, Ordering::Release);
            self.shared.wakeup.notify_one();
        } else {
            // never started: close right here
            self.socket = None;
            self.shared.closed.store(true, Ordering::Release);
        }
        self.disposed = true;
        debug!("OSC socket on port {} disposed", self.port());
    }

    /// Block until the receive thread has exited.
    ///
    /// Returns immediately if the loop was never started. Without a prior
    /// [`dispose`](Self::dispose) this only returns once the loop stops on an error.
    pub fn join(&mut self) {
        if let Some(handle) = self.thread.take() {
            if handle.join().is_err() {
                error!("OSC receive thread panicked");
            }
        }
    }

    /// Configured port, or the bound one once started on port 0
    pub fn port(&self) -> u16 {
        self.local_addr
            .map(|a| a.port())
            .unwrap_or(self.config.port)
    }

    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }

    pub fn config(&self) -> &SocketConfig {
        &self.config
    }

    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::Acquire)
    }

    /// Whether the underlying socket has been closed
    pub fn is_closed(&self) -> bool {
        self.shared.closed.load(Ordering::Acquire)
    }
}

impl<S: ReceiveSink> Drop for OscSocket<S> {
    fn drop(&mut self) {
        self.dispose();
    }
}

fn serve<S: ReceiveSink>(
    runtime: Runtime,
    socket: std::net::UdpSocket,
    mut sink: S,
    shared: Arc<Shared>,
) {
    runtime.block_on(async {
        let socket = match UdpSocket::from_std(socket) {
            Ok(socket) => socket,
            Err(e) => {
                error!("failed to register OSC socket with the runtime: {}", e);
                return;
            }
        };

        let mut failures = 0u32;
        loop {
            let received = tokio::select! {
                biased;
                _ = shared.wakeup.notified() => None,
                result = socket.recv_from(sink.buffer_mut()) => Some(result),
            };

            if shared.close_requested.load(Ordering::Acquire) {
                if let Some(Err(e)) = received {
                    trace!("receive completed after close was requested: {}", e);
                }
                break;
            }

            match received {
                // woken without a close request
                None => continue,
                Some(Ok((0, _))) => {}
                Some(Ok((len, from))) => {
                    trace!("received {} bytes from {}", len, from);
                    let parsed = panic::catch_unwind(AssertUnwindSafe(|| sink.parse_buffer(len)));
                    if let Err(panic) = parsed {
                        error!(
                            "OSC receive loop stopped, packet handler panicked: {}",
                            panic_message(panic.as_ref())
                        );
                        break;
                    }
                }
                Some(Err(e)) if is_fatal(&e) => {
                    error!("OSC receive loop stopped: {}", e);
                    break;
                }
                Some(Err(e)) if is_transient(&e) => {
                    trace!("ignoring transient receive error: {}", e);
                    continue;
                }
                Some(Err(e)) => {
                    failures += 1;
                    if failures >= MAX_CONSECUTIVE_FAILURES {
                        error!(
                            "OSC receive loop stopped after {} failed receives: {}",
                            failures, e
                        );
                        break;
                    }
                    warn!("OSC receive failed, continuing: {}", e);
                    continue;
                }
            }
            failures = 0;
        }
    });

    shared.running.store(false, Ordering::Release);
    shared.closed.store(true, Ordering::Release);
    debug!("OSC receive thread exited");
}

/// Errors that mean the socket itself can no longer receive
fn is_fatal(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::NotConnected | io::ErrorKind::BrokenPipe
    )
}

/// Errors expected in normal operation, logged at trace level only
fn is_transient(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::TimedOut
            | io::ErrorKind::WouldBlock
            | io::ErrorKind::Interrupted
            // ICMP port unreachable from an earlier send, reported on Windows
            | io::ErrorKind::ConnectionReset
    )
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    panic
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| panic.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}
