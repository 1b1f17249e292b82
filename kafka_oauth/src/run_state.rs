use tokio_util::sync::CancellationToken;

/// The process-wide run flag.
///
/// Cleared once by the termination signal handler and read by the message loops at
/// the top of every iteration. Clones share the same flag.
#[derive(Debug, Clone, Default)]
pub struct RunState {
    cancellation_token: CancellationToken,
}

impl RunState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_running(&self) -> bool {
        !self.cancellation_token.is_cancelled()
    }

    pub fn stop(&self) {
        self.cancellation_token.cancel()
    }

    pub async fn stopped(&self) {
        self.cancellation_token.cancelled().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_the_flag() {
        let run_state = RunState::new();
        let signal_side = run_state.clone();

        assert!(run_state.is_running());
        signal_side.stop();
        assert!(!run_state.is_running());
    }

    #[tokio::test]
    async fn stopped_resolves_after_stop() {
        let run_state = RunState::new();
        let waiter = tokio::spawn({
            let run_state = run_state.clone();
            async move { run_state.stopped().await }
        });

        run_state.stop();

        waiter.await.unwrap();
    }
}
