//! In-memory session cache with inactivity auto-lock.
//!
//! A [`SessionCache`] holds the vault password between unlocks so that
//! callers can re-obtain it without prompting. Every read or explicit
//! activity pushes the deadline back; once the configured timeout elapses
//! with no activity the password is dropped and every subscriber receives
//! a [`LockEvent`].
//!
//! # State machine
//!
//! ```text
//!            set_password
//!   Locked ───────────────▶ Unlocked ──┐ get_password / touch_activity
//!     ▲                        │  ▲     │ (re-arm timer)
//!     │  timer / clear_password│  └─────┘
//!     └────────────────────────┘
//! ```
//!
//! At most one expiry timer is pending. Each re-arm bumps a generation
//! counter and aborts the previous task; a timer that wakes with a stale
//! generation does nothing.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use forest_types::config::{VaultConfig, MAX_LOCK_TIMEOUT_SECS};
use forest_types::{ForestError, LockEvent, LockReason, Result, SessionStatus};
use tokio::runtime::Handle;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use zeroize::Zeroizing;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Default inactivity timeout (10 minutes).
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(10 * 60);

/// Buffered lock events per subscriber before the oldest are dropped.
const EVENT_CHANNEL_CAPACITY: usize = 16;

// ---------------------------------------------------------------------------
// SessionConfig
// ---------------------------------------------------------------------------

/// Tunables for a [`SessionCache`].
#[derive(Clone, Debug)]
pub struct SessionConfig {
    /// Inactivity period after which the session locks.
    pub lock_timeout: Duration,
    /// Whether `clear_password` also notifies subscribers.
    pub notify_on_manual_lock: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
            notify_on_manual_lock: false,
        }
    }
}

impl SessionConfig {
    /// Extracts the session settings from the vault configuration.
    pub fn from_vault_config(config: &VaultConfig) -> Self {
        Self {
            lock_timeout: config.lock_timeout(),
            notify_on_manual_lock: config.notify_on_manual_lock,
        }
    }
}

// ---------------------------------------------------------------------------
// Internal state
// ---------------------------------------------------------------------------

struct SessionState {
    password: Option<Zeroizing<String>>,
    last_activity: Instant,
    generation: u64,
    timer: Option<JoinHandle<()>>,
}

impl SessionState {
    /// Drops the password and invalidates any pending timer.
    ///
    /// Returns `true` if the session was unlocked.
    fn lock(&mut self) -> bool {
        let was_unlocked = self.password.take().is_some();
        self.generation = self.generation.wrapping_add(1);
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
        was_unlocked
    }

    /// An overflowing deadline collapses to `last_activity`, which locks
    /// at once rather than never.
    fn deadline(&self, timeout: Duration) -> Instant {
        self.last_activity
            .checked_add(timeout)
            .unwrap_or(self.last_activity)
    }
}

struct Inner {
    state: Mutex<SessionState>,
    config: SessionConfig,
    events: broadcast::Sender<LockEvent>,
    runtime: Handle,
}

impl Inner {
    /// Critical sections only assign fields, so state behind a poisoned
    /// lock is still consistent.
    fn state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Called by the timer task when its deadline passes.
    fn expire(&self, generation: u64) {
        {
            let mut state = self.state();
            if state.generation != generation || state.password.is_none() {
                return;
            }
            // This task is the pending timer; drop its handle rather than
            // aborting itself.
            state.timer = None;
            state.lock();
        }
        tracing::info!("session auto-locked after inactivity");
        self.notify(LockReason::Expired);
    }

    fn notify(&self, reason: LockReason) {
        if self.events.send(LockEvent::now(reason)).is_err() {
            tracing::debug!(%reason, "session locked with no subscribers");
        }
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        let state = self.state.get_mut().unwrap_or_else(PoisonError::into_inner);
        state.lock();
    }
}

// ---------------------------------------------------------------------------
// SessionCache
// ---------------------------------------------------------------------------

/// Shared handle to the session state.
///
/// Cloning yields another handle to the same session. The timer is
/// aborted and the password zeroized when [`shutdown`](Self::shutdown)
/// is called or the last handle is dropped.
#[derive(Clone)]
pub struct SessionCache {
    inner: Arc<Inner>,
}

impl SessionCache {
    /// Creates a locked session bound to the current Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`ForestError::ConfigError`] if `lock_timeout` is zero or
    /// above [`MAX_LOCK_TIMEOUT_SECS`], or no Tokio runtime is running on
    /// this thread.
    pub fn new(config: SessionConfig) -> Result<Self> {
        if config.lock_timeout.is_zero() {
            return Err(ForestError::ConfigError {
                reason: "session lock timeout must be greater than 0".into(),
            });
        }
        if config.lock_timeout > Duration::from_secs(MAX_LOCK_TIMEOUT_SECS) {
            return Err(ForestError::ConfigError {
                reason: format!("session lock timeout must be at most {MAX_LOCK_TIMEOUT_SECS}s"),
            });
        }

        let runtime = Handle::try_current().map_err(|e| ForestError::ConfigError {
            reason: format!("session cache requires a Tokio runtime: {e}"),
        })?;

        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        Ok(Self {
            inner: Arc::new(Inner {
                state: Mutex::new(SessionState {
                    password: None,
                    last_activity: Instant::now(),
                    generation: 0,
                    timer: None,
                }),
                config,
                events,
                runtime,
            }),
        })
    }

    /// Returns the configured inactivity timeout.
    pub fn lock_timeout(&self) -> Duration {
        self.inner.config.lock_timeout
    }

    /// Caches `password` and arms the inactivity timer.
    ///
    /// Replaces any previously cached password.
    pub fn set_password(&self, password: &str) {
        let mut state = self.inner.state();
        state.password = Some(Zeroizing::new(password.to_string()));
        self.rearm(&mut state);
        tracing::debug!(timeout_secs = self.lock_timeout().as_secs(), "session unlocked");
    }

    /// Returns the cached password and counts the read as activity.
    ///
    /// Returns `None` while locked. If the deadline has passed but the
    /// timer has not run yet, the session locks here and `None` is
    /// returned.
    pub fn get_password(&self) -> Option<Zeroizing<String>> {
        let password = {
            let mut state = self.inner.state();
            if state.password.is_none() {
                return None;
            }
            if Instant::now() >= state.deadline(self.inner.config.lock_timeout) {
                state.lock();
                None
            } else {
                self.rearm(&mut state);
                state.password.clone()
            }
        };

        if password.is_none() {
            tracing::info!("session expired on access");
            self.inner.notify(LockReason::Expired);
        }
        password
    }

    /// Records activity and re-arms the timer. No-op while locked.
    pub fn touch_activity(&self) {
        let mut state = self.inner.state();
        if state.password.is_some() {
            self.rearm(&mut state);
        }
    }

    /// Drops the cached password and cancels the timer.
    ///
    /// Subscribers hear about it only when
    /// [`SessionConfig::notify_on_manual_lock`] is set.
    pub fn clear_password(&self) {
        let was_unlocked = self.inner.state().lock();
        if was_unlocked {
            tracing::info!("session locked manually");
            if self.inner.config.notify_on_manual_lock {
                self.inner.notify(LockReason::Manual);
            }
        }
    }

    /// Returns the time left before auto-lock, or zero while locked.
    ///
    /// Advisory: the timer, not this value, decides when the lock
    /// happens.
    pub fn time_until_lock(&self) -> Duration {
        let state = self.inner.state();
        if state.password.is_none() {
            return Duration::ZERO;
        }
        state
            .deadline(self.inner.config.lock_timeout)
            .saturating_duration_since(Instant::now())
    }

    /// Returns the current lock state.
    pub fn status(&self) -> SessionStatus {
        if self.inner.state().password.is_some() {
            SessionStatus::Unlocked
        } else {
            SessionStatus::Locked
        }
    }

    /// Returns a new receiver of lock events.
    ///
    /// Every subscriber gets its own copy of each event.
    pub fn subscribe(&self) -> broadcast::Receiver<LockEvent> {
        self.inner.events.subscribe()
    }

    /// Locks the session without notifying and cancels the timer.
    pub fn shutdown(&self) {
        if self.inner.state().lock() {
            tracing::debug!("session shut down");
        }
    }

    /// Stamps activity and replaces the pending timer with a fresh one.
    fn rearm(&self, state: &mut SessionState) {
        state.last_activity = Instant::now();
        state.generation = state.generation.wrapping_add(1);
        if let Some(timer) = state.timer.take() {
            timer.abort();
        }

        let generation = state.generation;
        let deadline = state.deadline(self.inner.config.lock_timeout);
        let weak: Weak<Inner> = Arc::downgrade(&self.inner);

        state.timer = Some(self.inner.runtime.spawn(async move {
            tokio::time::sleep_until(deadline).await;
            if let Some(inner) = weak.upgrade() {
                inner.expire(generation);
            }
        }));
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
