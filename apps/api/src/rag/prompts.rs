// Prompt templates for question answering and booking intent detection.

pub const ANSWER_PROMPT: &str = r#"You are a helpful AI assistant. Use the provided context and conversation history to answer the user's question.

CONTEXT:
{context}

CONVERSATION HISTORY:
{history}

QUESTION:
{query}

Instructions:
- Answer concisely and accurately
- Reference which context you used (e.g., "Based on Context 1...")
- If the context doesn't contain relevant information, say so
- Maintain conversation continuity using the history"#;

pub const NO_CONTEXT: &str = "No relevant context found.";
pub const NO_HISTORY: &str = "No previous conversation.";

pub const INTENT_PROMPT: &str = r#"Analyze if this query is about scheduling/booking an interview or appointment.

Query: "{query}"

Return exactly this structure:
{
  "is_booking": true/false,
  "confidence": 0.0-1.0,
  "reason": "brief explanation"
}

Examples of booking queries:
- "I want to schedule an interview"
- "Can I book a meeting for tomorrow at 2pm?"
- "Schedule interview for John at john@email.com"
- "Book me for 25th December 3pm"

Examples of NON-booking queries:
- "What is the interview process?"
- "Tell me about your company"
- "How do I prepare for interviews?"

{json_only}"#;
