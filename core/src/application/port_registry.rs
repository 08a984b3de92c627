//! Port detection with deduplication and a short-lived snapshot cache.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::domain::{ListenerKey, PortInfo, Protocol};
use crate::error::Result;
use crate::ports::PlatformAdapter;

/// How long a successful snapshot is served without asking the adapter again.
pub const DEFAULT_FRESHNESS_WINDOW: Duration = Duration::from_secs(5);

#[derive(Debug, Default)]
struct RegistryState {
    cache: BTreeMap<ListenerKey, PortInfo>,
    last_update: Option<Instant>,
    last_count: usize,
}

/// Orchestrates the platform adapter and caches deduplicated snapshots.
///
/// The cache is keyed by port and pid. It is cleared whenever a detection
/// pass yields a different number of listeners than the previous pass, and
/// it is the fallback when the adapter fails.
pub struct PortRegistry<A: PlatformAdapter> {
    adapter: A,
    freshness: Duration,
    state: Mutex<RegistryState>,
}

impl<A: PlatformAdapter> PortRegistry<A> {
    pub fn new(adapter: A) -> Self {
        Self::with_freshness(adapter, DEFAULT_FRESHNESS_WINDOW)
    }

    pub fn with_freshness(adapter: A, freshness: Duration) -> Self {
        Self {
            adapter,
            freshness,
            state: Mutex::new(RegistryState::default()),
        }
    }

    /// The adapter used for detection, shared with process actions.
    pub fn adapter(&self) -> &A {
        &self.adapter
    }

    fn cached_ports(state: &RegistryState) -> Vec<PortInfo> {
        state.cache.values().cloned().collect()
    }

    /// Detect listening ports.
    ///
    /// Serves the cached snapshot while it is younger than the freshness
    /// window. On adapter failure the cache is returned regardless of age;
    /// the error only propagates when there is nothing cached.
    pub async fn detect_ports(&self) -> Result<Vec<PortInfo>> {
        {
            let state = self.state.lock();
            if let Some(last) = state.last_update {
                if last.elapsed() < self.freshness && !state.cache.is_empty() {
                    return Ok(Self::cached_ports(&state));
                }
            }
        }

        match self.adapter.detect_ports().await {
            Ok(raw) => {
                let ports = deduplicate(raw);
                let mut state = self.state.lock();

                if ports.len() != state.last_count {
                    debug!(
                        previous = state.last_count,
                        current = ports.len(),
                        "Listener count changed, dropping cached snapshot"
                    );
                    state.cache.clear();
                    state.last_count = ports.len();
                }
                for port in &ports {
                    state.cache.insert(port.key(), port.clone());
                }
                state.last_update = Some(Instant::now());

                Ok(ports)
            }
            Err(e) => {
                let state = self.state.lock();
                if state.cache.is_empty() {
                    return Err(e);
                }
                warn!(error = %e, "Failed to detect ports, using cached data");
                Ok(Self::cached_ports(&state))
            }
        }
    }

    /// Drop the cache and the freshness timestamp so the next call hits the adapter.
    pub fn clear_cache(&self) {
        let mut state = self.state.lock();
        state.cache.clear();
        state.last_update = None;
    }
}

/// Collapse raw observations sharing a port and pid into one entry.
///
/// Single pass. The first observation for a key is kept, except that a TCP
/// observation replaces a previously kept UDP one. Output follows the order
/// in which keys were first seen.
pub fn deduplicate(ports: Vec<PortInfo>) -> Vec<PortInfo> {
    let mut slots: BTreeMap<ListenerKey, usize> = BTreeMap::new();
    let mut kept: Vec<PortInfo> = Vec::with_capacity(ports.len());

    for port in ports {
        match slots.entry(port.key()) {
            Entry::Vacant(slot) => {
                slot.insert(kept.len());
                kept.push(port);
            }
            Entry::Occupied(slot) => {
                let existing = &mut kept[*slot.get()];
                if port.protocol == Protocol::Tcp && existing.protocol == Protocol::Udp {
                    *existing = port;
                }
            }
        }
    }

    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::ports::ProcessInfo;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::time::advance;
    use tokio_test::{assert_err, assert_ok};

    /// Mock adapter for testing.
    struct MockAdapter {
        responses: Mutex<Vec<Result<Vec<PortInfo>>>>,
        calls: AtomicUsize,
    }

    impl MockAdapter {
        /// Responses are served in order; the last one repeats.
        fn new(responses: Vec<Result<Vec<PortInfo>>>) -> Self {
            Self {
                responses: Mutex::new(responses),
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl PlatformAdapter for MockAdapter {
        async fn detect_ports(&self) -> Result<Vec<PortInfo>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut responses = self.responses.lock();
            if responses.len() > 1 {
                return responses.remove(0);
            }
            match responses.first() {
                Some(Ok(ports)) => Ok(ports.clone()),
                _ => failure(),
            }
        }

        async fn get_process_info(&self, pid: u32) -> Result<ProcessInfo> {
            Err(Error::ProcessNotFound(pid))
        }

        async fn get_process_lifetime(&self, _pid: u32) -> Result<Option<u64>> {
            Ok(None)
        }

        async fn kill_process(&self, _pid: u32, _force: bool) -> bool {
            false
        }

        async fn get_process_command(&self, pid: u32) -> Result<String> {
            Err(Error::ProcessNotFound(pid))
        }
    }

    fn tcp(port: u16, pid: u32) -> PortInfo {
        PortInfo::new(port, Protocol::Tcp, pid, "node")
    }

    fn udp(port: u16, pid: u32) -> PortInfo {
        PortInfo::new(port, Protocol::Udp, pid, "node")
    }

    fn failure() -> Result<Vec<PortInfo>> {
        Err(Error::CommandFailed("lsof failed".into()))
    }

    #[test]
    fn test_dedup_prefers_tcp_regardless_of_order() {
        let result = deduplicate(vec![udp(5353, 1), tcp(5353, 1)]);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].protocol, Protocol::Tcp);

        let result = deduplicate(vec![tcp(5353, 1), udp(5353, 1)]);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].protocol, Protocol::Tcp);
    }

    #[test]
    fn test_dedup_same_protocol_keeps_first() {
        let first = tcp(3000, 7).with_address("127.0.0.1");
        let second = tcp(3000, 7).with_address("::1");
        let result = deduplicate(vec![first, second]);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].address, "127.0.0.1");
    }

    #[test]
    fn test_dedup_keeps_input_order() {
        let result = deduplicate(vec![tcp(8080, 2), tcp(3000, 1), tcp(8080, 2), tcp(22, 3)]);
        let ports: Vec<u16> = result.iter().map(|p| p.port).collect();
        assert_eq!(ports, vec![8080, 3000, 22]);
    }

    #[test]
    fn test_dedup_distinguishes_pids() {
        let result = deduplicate(vec![tcp(3000, 1), tcp(3000, 2)]);
        assert_eq!(result.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fresh_snapshot_skips_adapter() {
        let registry = PortRegistry::new(MockAdapter::new(vec![Ok(vec![tcp(3000, 1)])]));

        registry.detect_ports().await.unwrap();
        advance(Duration::from_secs(4)).await;
        let ports = registry.detect_ports().await.unwrap();

        assert_eq!(ports.len(), 1);
        assert_eq!(registry.adapter().calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_snapshot_hits_adapter() {
        let registry = PortRegistry::new(MockAdapter::new(vec![Ok(vec![tcp(3000, 1)])]));

        registry.detect_ports().await.unwrap();
        advance(Duration::from_secs(5)).await;
        registry.detect_ports().await.unwrap();

        assert_eq!(registry.adapter().calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_detection_deduplicates() {
        let registry = PortRegistry::new(MockAdapter::new(vec![Ok(vec![
            udp(5353, 1),
            tcp(5353, 1),
            tcp(3000, 2),
        ])]));

        let ports = registry.detect_ports().await.unwrap();
        assert_eq!(ports.len(), 2);
        assert_eq!(ports[0].protocol, Protocol::Tcp);
    }

    #[tokio::test(start_paused = true)]
    async fn test_count_change_clears_cache() {
        let registry = PortRegistry::new(MockAdapter::new(vec![
            Ok(vec![tcp(3000, 1), tcp(4000, 2)]),
            Ok(vec![tcp(5000, 3)]),
        ]));

        registry.detect_ports().await.unwrap();
        advance(Duration::from_secs(6)).await;
        registry.detect_ports().await.unwrap();

        // served from cache: only the second pass survives
        let ports = registry.detect_ports().await.unwrap();
        assert_eq!(registry.adapter().calls(), 2);
        assert_eq!(ports.len(), 1);
        assert_eq!(ports[0].port, 5000);
    }

    #[tokio::test(start_paused = true)]
    async fn test_same_count_restocks_without_clearing() {
        let registry = PortRegistry::new(MockAdapter::new(vec![
            Ok(vec![tcp(3000, 1), tcp(4000, 2)]),
            Ok(vec![tcp(3000, 1), tcp(5000, 3)]),
        ]));

        registry.detect_ports().await.unwrap();
        advance(Duration::from_secs(6)).await;

        // the adapter pass itself returns only what it saw
        let detected = registry.detect_ports().await.unwrap();
        let mut ports: Vec<u16> = detected.iter().map(|p| p.port).collect();
        ports.sort_unstable();
        assert_eq!(ports, vec![3000, 5000]);

        // :4000 from the first pass is still cached
        let cached = registry.detect_ports().await.unwrap();
        assert_eq!(registry.adapter().calls(), 2);
        let mut ports: Vec<u16> = cached.iter().map(|p| p.port).collect();
        ports.sort_unstable();
        assert_eq!(ports, vec![3000, 4000, 5000]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_falls_back_to_stale_cache() {
        let registry = PortRegistry::new(MockAdapter::new(vec![
            Ok(vec![tcp(3000, 1)]),
            failure(),
        ]));

        registry.detect_ports().await.unwrap();
        advance(Duration::from_secs(60)).await;
        let ports = assert_ok!(registry.detect_ports().await);

        assert_eq!(ports.len(), 1);
        assert_eq!(ports[0].port, 3000);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_with_empty_cache_propagates() {
        let registry = PortRegistry::new(MockAdapter::new(vec![failure()]));
        let result = registry.detect_ports().await;
        assert!(matches!(result, Err(Error::CommandFailed(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_clear_cache_forces_adapter_call() {
        let registry = PortRegistry::new(MockAdapter::new(vec![Ok(vec![tcp(3000, 1)])]));

        registry.detect_ports().await.unwrap();
        registry.clear_cache();
        registry.detect_ports().await.unwrap();

        assert_eq!(registry.adapter().calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_clear_cache_removes_fallback() {
        let registry = PortRegistry::new(MockAdapter::new(vec![
            Ok(vec![tcp(3000, 1)]),
            failure(),
        ]));

        assert_ok!(registry.detect_ports().await);
        registry.clear_cache();
        assert_err!(registry.detect_ports().await);
    }
}
