use std::sync::atomic::{AtomicU64, Ordering};

use jiff::{SignedDuration, Timestamp};
use reqwest::Client;
use tracing::{error, info, warn};

use crate::clock::VirtualClock;
use crate::config::Config;
use crate::errors::Error;
use crate::store::{OffsetStore, StoredOffset};
use crate::types::{ServerTimeResponse, SetClockRequest};

/// Drift tolerated by `resync` before the local clock is corrected.
const RESYNC_TOLERANCE: SignedDuration = SignedDuration::from_secs(2);

/// Client for the `/timeMachine` endpoints, keeping the local virtual clock
/// in lockstep with the server's authoritative one.
///
/// The server decides "now" for business logic such as deadline lateness, so
/// the local clock and the persisted offset are only mutated after the
/// server confirms a change. A failed request leaves both untouched.
pub struct TimeMachineClient {
    base_url: String,
    session_cookie: String,
    http: Client,
    clock: VirtualClock,
    store: OffsetStore,
    generation: AtomicU64,
}

impl TimeMachineClient {
    /// Create a client from explicit configuration, typically loaded via
    /// `Config::from_file` or `Config::from_env`.
    ///
    /// Loads the offset store and re-applies a persisted active override
    /// before returning, so consumers never observe wall-clock time after a
    /// restart mid-simulation.
    pub fn new(config: Config) -> Result<Self, Error> {
        let base_url = if config.base_url.starts_with("http") {
            config.base_url.clone()
        } else {
            format!("https://{}", config.base_url)
        };
        let _ = reqwest::Url::parse(&base_url)
            .map_err(|e| Error::Config(format!("Invalid base URL '{}': {}", base_url, e)))?;

        let clock = VirtualClock::new();
        let store = OffsetStore::new(&config.state_path);
        let persisted = store.load();
        if persisted.active {
            clock.install_offset(persisted.real_time_diff());
            info!(
                "re-applied persisted clock offset of {}",
                persisted.real_time_diff()
            );
        }

        Ok(TimeMachineClient {
            base_url,
            session_cookie: config.session_cookie,
            http: Client::new(),
            clock,
            store,
            generation: AtomicU64::new(0),
        })
    }

    /// The clock provider all time-sensitive consumers must read through.
    pub fn clock(&self) -> &VirtualClock {
        &self.clock
    }

    /// Current virtual time.
    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    /// Set the shared clock to `target`.
    ///
    /// Posts to the server first; only a confirmed change installs the
    /// override locally and persists the offset. If another set/restore was
    /// issued while this one was in flight, the stale confirmation is
    /// discarded and the later request governs local state.
    pub async fn set_global_clock(&self, target: Timestamp) -> Result<(), Error> {
        let generation = self.next_generation();
        let url = format!("{}/timeMachine/setGlobalClock", self.base_url);
        let resp = self
            .http
            .post(&url)
            .header("Cookie", self.session_cookie.as_str())
            .json(&SetClockRequest { date: target })
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            error!("set global clock failed: status={} body='{}'", status, body);
            return Err(Error::ServerRejection(status, body));
        }
        if self.superseded(generation) {
            info!("set global clock confirmation superseded; local state unchanged");
            return Ok(());
        }

        self.clock.install(target);
        self.store
            .save(&StoredOffset::active_at(target, self.clock.current_offset()))?;
        info!("global clock set to {}", target);
        Ok(())
    }

    /// Clear the shared clock override.
    ///
    /// On server confirmation the local override is uninstalled and the
    /// stored offset reset to zero; on failure local state is unchanged.
    pub async fn restore_global_clock(&self) -> Result<(), Error> {
        let generation = self.next_generation();
        let url = format!("{}/timeMachine/restoreGlobalClock", self.base_url);
        let resp = self
            .http
            .post(&url)
            .header("Cookie", self.session_cookie.as_str())
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            error!("restore global clock failed: status={} body='{}'", status, body);
            return Err(Error::ServerRejection(status, body));
        }
        if self.superseded(generation) {
            info!("restore confirmation superseded; local state unchanged");
            return Ok(());
        }

        self.clock.uninstall();
        self.store.save(&StoredOffset::zero())?;
        info!("global clock restored to wall-clock time");
        Ok(())
    }

    /// Best-effort query of the server's current time.
    ///
    /// Falls back to the local virtual clock when the server is unreachable
    /// or returns an unusable response; never fails.
    pub async fn server_time(&self) -> Timestamp {
        match self.fetch_server_time().await {
            Ok(time) => time,
            Err(err) => {
                warn!("server time unavailable, using local clock: {:?}", err);
                self.clock.now()
            }
        }
    }

    /// Reconcile the local clock with the server's.
    ///
    /// Another tab or device may have moved the shared clock since this
    /// process last heard from the server. Fetches the server time and, when
    /// it disagrees with the local virtual clock beyond a small tolerance,
    /// re-installs the server's notion and persists it. Returns whether a
    /// correction was applied. Intended to be called on events like window
    /// focus; there is no background polling.
    pub async fn resync(&self) -> Result<bool, Error> {
        let generation = self.next_generation();
        let server_now = self.fetch_server_time().await?;
        if self.superseded(generation) {
            info!("resync response superseded; local state unchanged");
            return Ok(false);
        }
        let drift_ms = server_now.as_millisecond() - self.clock.now().as_millisecond();
        if drift_ms.abs() <= RESYNC_TOLERANCE.as_millis() as i64 {
            return Ok(false);
        }
        self.clock.install(server_now);
        self.store
            .save(&StoredOffset::active_at(server_now, self.clock.current_offset()))?;
        info!(
            "local clock resynced to server time {} (drift {}ms)",
            server_now, drift_ms
        );
        Ok(true)
    }

    async fn fetch_server_time(&self) -> Result<Timestamp, Error> {
        let url = format!("{}/timeMachine", self.base_url);
        let resp = self
            .http
            .get(&url)
            .header("Cookie", self.session_cookie.as_str())
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::ServerRejection(status, body));
        }
        let body: ServerTimeResponse = resp.json().await?;
        Ok(body.time)
    }

    fn next_generation(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    // Overlapping set/restore requests resolve to the last one issued;
    // confirmations of earlier requests must not clobber local state.
    fn superseded(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) != generation
    }
}
