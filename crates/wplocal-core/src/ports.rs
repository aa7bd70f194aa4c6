// ── Port lease pool ──
//
// The port space is shared by every SiteServer in the process, so
// allocation re-checks candidates against all live leases before a bind
// probe confirms the OS agrees. A lease releases its port on drop.

use std::collections::HashSet;
use std::net::TcpListener;
use std::ops::RangeInclusive;
use std::sync::{Arc, Mutex};

use tracing::debug;

use crate::error::CoreError;

/// Ports offered to local sites.
pub const DEFAULT_PORT_RANGE: RangeInclusive<u16> = 8881..=8999;

/// Shared pool of port leases.
///
/// Cheap to clone; all clones share the same lease set.
#[derive(Clone)]
pub struct PortLeases {
    inner: Arc<Mutex<HashSet<u16>>>,
    range: RangeInclusive<u16>,
}

impl PortLeases {
    pub fn new() -> Self {
        Self::with_range(DEFAULT_PORT_RANGE)
    }

    /// Pool over an explicit range. Tests use narrow or empty ranges to
    /// force allocation failure.
    pub fn with_range(range: RangeInclusive<u16>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(HashSet::new())),
            range,
        }
    }

    /// Acquire the first free port: not leased by any other server, and
    /// bindable right now on the loopback interface.
    pub fn acquire(&self) -> Result<PortLease, CoreError> {
        let mut leased = self.inner.lock().expect("port lease lock poisoned");

        for port in self.range.clone() {
            if leased.contains(&port) {
                continue;
            }
            // Probe: the OS may have handed the port to an unrelated process.
            if TcpListener::bind(("127.0.0.1", port)).is_err() {
                continue;
            }
            leased.insert(port);
            debug!(port, "port leased");
            return Ok(PortLease {
                port,
                pool: Arc::clone(&self.inner),
            });
        }

        Err(CoreError::startup(format!(
            "no free port in {}-{}",
            self.range.start(),
            self.range.end()
        )))
    }

    /// Ports currently held by live leases.
    pub fn leased(&self) -> Vec<u16> {
        let leased = self.inner.lock().expect("port lease lock poisoned");
        let mut ports: Vec<u16> = leased.iter().copied().collect();
        ports.sort_unstable();
        ports
    }
}

impl Default for PortLeases {
    fn default() -> Self {
        Self::new()
    }
}

/// Exclusive hold on one port. Dropping the lease returns the port to the
/// pool.
pub struct PortLease {
    port: u16,
    pool: Arc<Mutex<HashSet<u16>>>,
}

impl PortLease {
    pub fn port(&self) -> u16 {
        self.port
    }
}

impl Drop for PortLease {
    fn drop(&mut self) {
        let mut leased = self.pool.lock().expect("port lease lock poisoned");
        leased.remove(&self.port);
        debug!(port = self.port, "port released");
    }
}

impl std::fmt::Debug for PortLease {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PortLease").field("port", &self.port).finish()
    }
}
