//! Throttled sweep of expired session rows.
//!
//! The sweep state is one explicit process-wide gate over the last sweep
//! instant, with the interval taken from `session_cleanup_ttl_secs`
//! (default 600 seconds). Requests that lose the race, or arrive inside the
//! interval, pass through untouched; the winning request spawns the sweep and
//! never waits for it.

use axum::{extract::Request, extract::State, middleware::Next, response::Response};
use chrono::Utc;
use once_cell::sync::Lazy;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::entities::sesion;
use crate::AppState;

/// Process-wide throttle over a recurring maintenance action.
pub struct CleanupGate {
    last_sweep: Mutex<Option<Instant>>,
}

impl CleanupGate {
    pub fn new() -> Self {
        Self {
            last_sweep: Mutex::new(None),
        }
    }

    /// Returns true at most once per `interval`, for the caller that gets to
    /// run the maintenance action now.
    pub async fn try_acquire(&self, interval: Duration) -> bool {
        let mut last = self.last_sweep.lock().await;
        let due = match *last {
            None => true,
            Some(at) => at.elapsed() >= interval,
        };
        if due {
            *last = Some(Instant::now());
        }
        due
    }
}

impl Default for CleanupGate {
    fn default() -> Self {
        Self::new()
    }
}

static GATE: Lazy<CleanupGate> = Lazy::new(CleanupGate::new);

/// Middleware that opportunistically prunes expired sessions.
pub async fn session_cleanup_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let interval = Duration::from_secs(state.config.session_cleanup_ttl_secs);
    if GATE.try_acquire(interval).await {
        let db = state.db.clone();
        tokio::spawn(async move {
            match sesion::Entity::delete_many()
                .filter(sesion::Column::ExpiresAt.lt(Utc::now()))
                .exec(&*db)
                .await
            {
                Ok(result) if result.rows_affected > 0 => {
                    info!("Pruned {} expired sessions", result.rows_affected);
                }
                Ok(_) => {}
                Err(e) => warn!("Expired-session sweep failed: {}", e),
            }
        });
    }

    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn gate_opens_once_per_interval() {
        let gate = CleanupGate::new();
        let interval = Duration::from_secs(60);

        assert!(gate.try_acquire(interval).await);
        assert!(!gate.try_acquire(interval).await);
        assert!(!gate.try_acquire(interval).await);
    }

    #[tokio::test]
    async fn gate_reopens_after_the_interval_elapses() {
        let gate = CleanupGate::new();
        let interval = Duration::from_millis(20);

        assert!(gate.try_acquire(interval).await);
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(gate.try_acquire(interval).await);
    }
}
