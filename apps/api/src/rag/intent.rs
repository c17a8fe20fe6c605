//! Classifies whether a message is asking to book an interview.

use serde::{Deserialize, Deserializer, Serialize};
use tracing::{debug, warn};

use crate::llm_client::prompts::{render, JSON_ONLY_INSTRUCTION};
use crate::llm_client::{CompletionOptions, LlmClient, LlmError};
use crate::rag::prompts::INTENT_PROMPT;

const INTENT_OPTIONS: CompletionOptions = CompletionOptions::new(150, 0.3);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingIntent {
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_booking: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub confidence: f32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub reason: String,
}

/// Models sometimes answer `null` for a field they have nothing to say about.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

impl BookingIntent {
    fn not_booking(reason: impl Into<String>) -> Self {
        Self {
            is_booking: false,
            confidence: 0.0,
            reason: reason.into(),
        }
    }
}

pub fn build_intent_prompt(query: &str) -> String {
    render(
        INTENT_PROMPT,
        &[("query", query), ("json_only", JSON_ONLY_INSTRUCTION)],
    )
}

/// Never fails: any error is reported as a non-booking intent.
pub async fn detect_booking_intent(llm: &LlmClient, query: &str) -> BookingIntent {
    let prompt = build_intent_prompt(query);
    match llm.complete_json::<BookingIntent>(&prompt, INTENT_OPTIONS).await {
        Ok(intent) => {
            debug!(
                "Booking intent: is_booking={}, confidence={:.2}, reason={}",
                intent.is_booking, intent.confidence, intent.reason
            );
            intent
        }
        Err(LlmError::Parse(e)) => {
            warn!("Failed to parse booking intent JSON: {e}");
            BookingIntent::not_booking("Parse error")
        }
        Err(e) => {
            warn!("Error detecting booking intent: {e}");
            BookingIntent::not_booking(e.to_string())
        }
    }
}
