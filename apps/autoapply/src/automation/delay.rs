use std::time::Duration;

use async_trait::async_trait;

/// Pause strategy for retry gaps, navigation waits and cooldowns.
#[async_trait]
pub trait Delay: Send + Sync {
    async fn pause(&self, duration: Duration);
}

/// Real sleeps on the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioDelay;

#[async_trait]
impl Delay for TokioDelay {
    async fn pause(&self, duration: Duration) {
        if !duration.is_zero() {
            tokio::time::sleep(duration).await;
        }
    }
}

#[cfg(test)]
pub(crate) mod fakes {
    use std::sync::{Arc, Mutex};

    use super::*;

    /// Records requested pauses instead of sleeping.
    #[derive(Debug, Clone, Default)]
    pub struct RecordingDelay {
        pub pauses: Arc<Mutex<Vec<Duration>>>,
    }

    impl RecordingDelay {
        pub fn recorded(&self) -> Vec<Duration> {
            self.pauses.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Delay for RecordingDelay {
        async fn pause(&self, duration: Duration) {
            self.pauses.lock().unwrap().push(duration);
        }
    }
}
