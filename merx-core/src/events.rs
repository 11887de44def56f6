use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::BoxError;

/// Fire-and-forget publication toward the event bus.
///
/// Publishers attempt delivery once; the caller decides whether a failure
/// is worth more than a log line. No acknowledgment is surfaced beyond
/// the returned `Result`.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, topic: &str, key: &str, payload: &str) -> Result<(), BoxError>;
}

/// Interaction event consumed by the recommender.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InteractionEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: InteractionData,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InteractionData {
    pub user_id: i64,
    pub product_id: String,
}

impl InteractionEvent {
    pub fn purchase(account_id: i64, product_id: String) -> Self {
        Self {
            event_type: "purchase".to_string(),
            data: InteractionData {
                user_id: account_id,
                product_id,
            },
        }
    }
}
