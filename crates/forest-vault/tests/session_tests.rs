//! Integration tests for the session cache state machine.
//!
//! All tests run on a paused Tokio clock: `advance` moves virtual time
//! and then yields so that any due expiry task gets to run. Nothing
//! sleeps in real time.

use std::time::Duration;

use forest_types::{ForestError, LockReason, SessionStatus};
use forest_vault::{SessionCache, SessionConfig};
use tokio::sync::broadcast::error::TryRecvError;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const TEN_MINUTES: Duration = Duration::from_secs(10 * 60);

fn session() -> std::result::Result<SessionCache, ForestError> {
    SessionCache::new(SessionConfig::default())
}

async fn advance(by: Duration) {
    tokio::time::advance(by).await;
    for _ in 0..8 {
        tokio::task::yield_now().await;
    }
}

fn mins_secs(mins: u64, secs: u64) -> Duration {
    Duration::from_secs(mins * 60 + secs)
}

// ---------------------------------------------------------------------------
// 1. Timer reset
// ---------------------------------------------------------------------------

/// Activity just before the deadline keeps the session alive for a
/// further full timeout.
#[tokio::test(start_paused = true)]
async fn touch_before_deadline_keeps_session_unlocked() -> std::result::Result<(), ForestError> {
    let session = session()?;
    let mut events = session.subscribe();

    session.set_password("pw");
    advance(mins_secs(9, 59)).await;
    session.touch_activity();
    advance(mins_secs(9, 59)).await;

    assert_eq!(session.status(), SessionStatus::Unlocked);
    assert!(matches!(events.try_recv(), Err(TryRecvError::Empty)));
    assert_eq!(session.get_password().as_deref().map(String::as_str), Some("pw"));
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn read_counts_as_activity() -> std::result::Result<(), ForestError> {
    let session = session()?;
    session.set_password("pw");

    advance(mins_secs(9, 0)).await;
    assert!(session.get_password().is_some());
    advance(mins_secs(9, 0)).await;
    assert_eq!(session.status(), SessionStatus::Unlocked);

    advance(mins_secs(1, 1)).await;
    assert_eq!(session.status(), SessionStatus::Locked);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn touch_restores_full_timeout() -> std::result::Result<(), ForestError> {
    let session = session()?;
    session.set_password("pw");
    advance(mins_secs(4, 0)).await;
    assert_eq!(session.time_until_lock(), mins_secs(6, 0));

    session.touch_activity();
    assert_eq!(session.time_until_lock(), TEN_MINUTES);
    Ok(())
}

// ---------------------------------------------------------------------------
// 2. Auto-lock
// ---------------------------------------------------------------------------

/// No activity for just over the timeout: locked, one notification.
#[tokio::test(start_paused = true)]
async fn idle_session_auto_locks_and_notifies_once() -> std::result::Result<(), ForestError> {
    let session = session()?;
    let mut events = session.subscribe();

    session.set_password("pw");
    advance(mins_secs(10, 1)).await;

    assert!(session.get_password().is_none());
    assert_eq!(session.status(), SessionStatus::Locked);
    assert_eq!(session.time_until_lock(), Duration::ZERO);

    let event = events.try_recv().map_err(|e| ForestError::ConfigError {
        reason: format!("expected a lock event: {e}"),
    })?;
    assert_eq!(event.reason, LockReason::Expired);
    assert!(matches!(events.try_recv(), Err(TryRecvError::Empty)));
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn every_subscriber_is_notified() -> std::result::Result<(), ForestError> {
    let session = session()?;
    let mut receivers: Vec<_> = (0..3).map(|_| session.subscribe()).collect();

    session.set_password("pw");
    advance(mins_secs(10, 1)).await;

    for rx in &mut receivers {
        assert!(matches!(rx.try_recv(), Ok(event) if event.reason == LockReason::Expired));
        assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
    }
    Ok(())
}

/// A timer armed before a re-arm must not lock the re-armed session.
#[tokio::test(start_paused = true)]
async fn stale_timer_cannot_lock_rearmed_session() -> std::result::Result<(), ForestError> {
    let session = session()?;
    let mut events = session.subscribe();

    session.set_password("first");
    advance(mins_secs(5, 0)).await;
    session.set_password("second");

    // Past the first deadline, before the second.
    advance(mins_secs(5, 30)).await;
    assert_eq!(session.status(), SessionStatus::Unlocked);
    assert!(matches!(events.try_recv(), Err(TryRecvError::Empty)));
    assert_eq!(session.get_password().as_deref().map(String::as_str), Some("second"));
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn relock_after_expiry_needs_new_password() -> std::result::Result<(), ForestError> {
    let session = session()?;
    session.set_password("pw");
    advance(mins_secs(10, 1)).await;
    assert_eq!(session.status(), SessionStatus::Locked);

    session.touch_activity();
    assert_eq!(session.status(), SessionStatus::Locked);

    session.set_password("pw2");
    assert_eq!(session.status(), SessionStatus::Unlocked);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn custom_timeout_is_honoured() -> std::result::Result<(), ForestError> {
    let session = SessionCache::new(SessionConfig {
        lock_timeout: Duration::from_secs(30),
        notify_on_manual_lock: false,
    })?;
    session.set_password("pw");
    advance(Duration::from_secs(29)).await;
    assert_eq!(session.status(), SessionStatus::Unlocked);
    advance(Duration::from_secs(2)).await;
    assert_eq!(session.status(), SessionStatus::Locked);
    Ok(())
}

// ---------------------------------------------------------------------------
// 3. Manual clear
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn manual_clear_is_silent_by_default() -> std::result::Result<(), ForestError> {
    let session = session()?;
    let mut events = session.subscribe();

    session.set_password("pw");
    session.clear_password();
    assert_eq!(session.status(), SessionStatus::Locked);

    // The cancelled timer must not fire later either.
    advance(mins_secs(11, 0)).await;
    assert!(matches!(events.try_recv(), Err(TryRecvError::Empty)));
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn manual_clear_notifies_when_enabled() -> std::result::Result<(), ForestError> {
    let session = SessionCache::new(SessionConfig {
        notify_on_manual_lock: true,
        ..SessionConfig::default()
    })?;
    let mut events = session.subscribe();

    session.set_password("pw");
    session.clear_password();
    assert!(matches!(events.try_recv(), Ok(event) if event.reason == LockReason::Manual));

    // Clearing an already locked session is not a transition.
    session.clear_password();
    assert!(matches!(events.try_recv(), Err(TryRecvError::Empty)));
    Ok(())
}
