// Connectivity oracles

use async_trait::async_trait;
use offline_queue_core::application::ShutdownToken;
use offline_queue_core::port::ConnectivityOracle;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::watch;
use tokio::time::{interval, timeout, MissedTickBehavior};
use tracing::{debug, info};

/// Online when a TCP connection to `host:port` opens within `timeout`
pub struct TcpConnectivityProbe {
    host: String,
    port: u16,
    timeout: Duration,
}

impl TcpConnectivityProbe {
    pub fn new(host: impl Into<String>, port: u16, timeout: Duration) -> Self {
        Self {
            host: host.into(),
            port,
            timeout,
        }
    }
}

#[async_trait]
impl ConnectivityOracle for TcpConnectivityProbe {
    async fn should_attempt_network_operation(&self) -> bool {
        let target = (self.host.as_str(), self.port);
        match timeout(self.timeout, TcpStream::connect(target)).await {
            Ok(Ok(_stream)) => true,
            Ok(Err(e)) => {
                debug!(host = %self.host, port = self.port, error = %e, "Connectivity probe failed");
                false
            }
            Err(_) => {
                debug!(
                    host = %self.host,
                    port = self.port,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "Connectivity probe timed out"
                );
                false
            }
        }
    }
}

/// Oracle fed by a platform reachability callback
///
/// Every transition is published on a watch channel so a worker can start a
/// pass as soon as the device comes back online.
pub struct ConnectivitySwitch {
    tx: watch::Sender<bool>,
}

impl ConnectivitySwitch {
    pub fn new(online: bool) -> Self {
        let (tx, _rx) = watch::channel(online);
        Self { tx }
    }

    /// Record the current reachability; subscribers are only woken on change
    pub fn set_online(&self, online: bool) {
        let changed = self.tx.send_if_modified(|current| {
            if *current == online {
                return false;
            }
            *current = online;
            true
        });
        if changed {
            info!(online = online, "Connectivity changed");
        }
    }

    pub fn is_online(&self) -> bool {
        *self.tx.borrow()
    }

    /// Receiver of connectivity transitions
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }

    /// Poll `source` every `every` and mirror its answer until shutdown
    ///
    /// Turns a polling oracle (e.g. [`TcpConnectivityProbe`]) into change events.
    pub async fn follow(
        self: Arc<Self>,
        source: Arc<dyn ConnectivityOracle>,
        every: Duration,
        mut shutdown: ShutdownToken,
    ) {
        let mut tick = interval(every);
        tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = shutdown.triggered() => break,
                _ = tick.tick() => {
                    let online = source.should_attempt_network_operation().await;
                    self.set_online(online);
                }
            }
        }
        debug!("Connectivity follower stopped");
    }
}

#[async_trait]
impl ConnectivityOracle for ConnectivitySwitch {
    async fn should_attempt_network_operation(&self) -> bool {
        self.is_online()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn test_probe_online_when_listener_accepts() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let probe = TcpConnectivityProbe::new("127.0.0.1", port, Duration::from_millis(500));
        assert!(probe.should_attempt_network_operation().await);
    }

    #[tokio::test]
    async fn test_probe_offline_when_nothing_listens() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let probe = TcpConnectivityProbe::new("127.0.0.1", port, Duration::from_millis(500));
        assert!(!probe.should_attempt_network_operation().await);
    }

    #[tokio::test]
    async fn test_follow_mirrors_source() {
        use offline_queue_core::application::shutdown_channel;
        use offline_queue_core::port::connectivity::mocks::StaticConnectivity;

        let source = Arc::new(StaticConnectivity::offline());
        let switch = Arc::new(ConnectivitySwitch::new(false));
        let mut rx = switch.subscribe();

        let (tx, token) = shutdown_channel();
        let handle = tokio::spawn(switch.clone().follow(
            source.clone(),
            Duration::from_millis(10),
            token,
        ));

        source.set_online(true);
        tokio::time::timeout(Duration::from_millis(500), rx.wait_for(|online| *online))
            .await
            .expect("switch follows source")
            .unwrap();
        assert!(switch.is_online());

        tx.shutdown();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_switch_publishes_transitions_only() {
        let switch = ConnectivitySwitch::new(false);
        let mut rx = switch.subscribe();
        assert!(!switch.should_attempt_network_operation().await);

        switch.set_online(false);
        assert!(!rx.has_changed().unwrap());

        switch.set_online(true);
        assert!(rx.has_changed().unwrap());
        assert!(*rx.borrow_and_update());
        assert!(switch.should_attempt_network_operation().await);
    }
}
