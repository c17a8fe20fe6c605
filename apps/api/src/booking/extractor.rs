//! Pulls name, email, date and time out of a conversation with the LLM.
//!
//! The model's own `complete` and `missing_fields` are ignored; completeness is
//! recomputed from the validated fields.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::booking::draft::BookingDraft;
use crate::booking::prompts::{EXTRACTION_PROMPT, NO_HISTORY};
use crate::booking::validation::BookingField;
use crate::llm_client::prompts::{render, JSON_ONLY_INSTRUCTION};
use crate::llm_client::{CompletionOptions, LlmClient};
use crate::memory::{format_history, ChatTurn};

/// Conversation turns passed to the extractor (five exchanges).
pub const EXTRACTION_HISTORY_TURNS: usize = 10;
const EXTRACTION_OPTIONS: CompletionOptions = CompletionOptions::new(300, 0.3);

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Extraction {
    pub complete: bool,
    pub data: BookingDraft,
    pub missing_fields: Vec<BookingField>,
}

impl Extraction {
    pub fn from_fields(data: BookingDraft) -> Self {
        let data = data.sanitized();
        let missing_fields = data.missing_fields();
        Self {
            complete: missing_fields.is_empty(),
            data,
            missing_fields,
        }
    }

    /// The result used whenever extraction fails.
    pub fn nothing_found() -> Self {
        Self::from_fields(BookingDraft::default())
    }
}

#[derive(Debug, Deserialize)]
struct RawExtraction {
    #[serde(default)]
    data: Option<BookingDraft>,
}

pub fn build_extraction_prompt(query: &str, history: &[ChatTurn], today: NaiveDate) -> String {
    let history_text = format_history(history, EXTRACTION_HISTORY_TURNS);
    let history_text = if history_text.is_empty() {
        NO_HISTORY.to_string()
    } else {
        history_text
    };
    let today = today.format("%Y-%m-%d (%A)").to_string();
    render(
        EXTRACTION_PROMPT,
        &[
            ("today", &today),
            ("history", &history_text),
            ("query", query),
            ("json_only", JSON_ONLY_INSTRUCTION),
        ],
    )
}

/// Interprets the model's reply. Unparseable replies yield no fields.
pub fn parse_extraction(reply: &str) -> Extraction {
    match crate::llm_client::parse_json_reply::<RawExtraction>(reply) {
        Ok(raw) => Extraction::from_fields(raw.data.unwrap_or_default()),
        Err(e) => {
            warn!("Failed to parse booking extraction JSON: {e}");
            Extraction::nothing_found()
        }
    }
}

/// Extracts booking fields from the current message and recent history.
/// Never fails: transport or parse errors produce an empty extraction.
pub async fn extract_booking_info(
    llm: &LlmClient,
    query: &str,
    history: &[ChatTurn],
    today: NaiveDate,
) -> Extraction {
    let prompt = build_extraction_prompt(query, history, today);
    match llm.complete(&prompt, EXTRACTION_OPTIONS).await {
        Ok(reply) => {
            let extraction = parse_extraction(&reply);
            info!(
                "Booking extraction: complete={}, missing={:?}",
                extraction.complete, extraction.missing_fields
            );
            extraction
        }
        Err(e) => {
            warn!("Error extracting booking info: {e}");
            Extraction::nothing_found()
        }
    }
}
