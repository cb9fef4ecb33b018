//! Structures to keep the process alive until some event occurs

use futures::{pin_mut, prelude::*, select};
use std::fmt::{self, Formatter};
use tokio::signal::{
    ctrl_c,
    unix::{signal, SignalKind},
};
use tracing::{debug, warn};

/// Reason why the heart stopped beating
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeathReason {
    /// SIGINT, SIGTERM or other process-external cause
    Terminated,
}

impl fmt::Display for DeathReason {
    fn fmt(&self, w: &mut Formatter<'_>) -> fmt::Result {
        match self {
            DeathReason::Terminated => write!(w, "Terminated due to external signal"),
        }
    }
}

/// Lifecycle management struct that keeps the application alive until it is told to terminate
#[derive(Debug, Default)]
pub struct Heart {
    _private: (),
}

impl Heart {
    /// Creates a new heart which dies from external signals
    pub fn new() -> Self {
        Self::default()
    }

    /// Future that waits until the heart dies for the returned reason
    pub async fn death(&mut self) -> DeathReason {
        debug!("Heart starts beating");
        termination_signal().await;
        DeathReason::Terminated
    }
}

async fn termination_signal() {
    match signal(SignalKind::terminate()) {
        Ok(mut sigterm) => {
            let sigterm = sigterm.recv().fuse();
            let interrupt = ctrl_c().fuse();

            pin_mut!(sigterm, interrupt);

            select! {
                _ = sigterm => {},
                _ = interrupt => {},
            };
        }
        Err(e) => {
            warn!("Unable to listen for SIGTERM, falling back to SIGINT only: {}", e);
            ctrl_c().await.ok();
        }
    }
}

#[cfg(test)]
mod does {
    use super::*;
    use futures::poll;
    use std::time::Duration;
    use tokio::task::{spawn, yield_now};
    use tokio::time::sleep;

    #[tokio::test]
    async fn live_until_terminated() {
        let mut heart = Heart::new();

        let handle = spawn(async move { heart.death().await });
        sleep(Duration::from_millis(50)).await;
        yield_now().await;

        assert!(!poll!(handle).is_ready());
    }

    #[test]
    fn describe_death_reason() {
        assert_eq!(
            DeathReason::Terminated.to_string(),
            "Terminated due to external signal"
        );
    }
}
