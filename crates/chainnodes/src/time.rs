use async_trait::async_trait;
use chaincore::{NodeError, Transform, Value};
use tokio::time::{sleep, Duration};

/// Delay the chain, then pass the input through
pub struct DelayNode {
    delay: Duration,
}

impl DelayNode {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    pub fn from_millis(delay_ms: u64) -> Self {
        Self::new(Duration::from_millis(delay_ms))
    }
}

#[async_trait]
impl Transform for DelayNode {
    async fn apply(&self, input: Value) -> Result<Value, NodeError> {
        tracing::debug!("Delaying for {}ms", self.delay.as_millis());
        sleep(self.delay).await;
        Ok(input)
    }
}
