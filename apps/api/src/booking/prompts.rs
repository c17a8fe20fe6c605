// Booking extraction prompt templates.

pub const EXTRACTION_PROMPT: &str = r#"Extract booking information from the conversation. Look for:
- name: Full name of the person
- email: Email address
- date: Date in YYYY-MM-DD format
- time: Time in HH:MM format (24-hour)

TODAY'S DATE: {today}

CONVERSATION HISTORY:
{history}

CURRENT MESSAGE:
{query}

Return exactly this structure:
{
  "complete": true/false,
  "data": {
    "name": "extracted name or null",
    "email": "extracted email or null",
    "date": "YYYY-MM-DD or null",
    "time": "HH:MM or null"
  },
  "missing_fields": ["list", "of", "missing", "fields"]
}

Important:
- Mark complete=true ONLY if ALL four fields are present
- Convert dates to YYYY-MM-DD relative to today's date (e.g., "tomorrow" → the next day, "25th Dec" → the next 25 December)
- Convert times to 24-hour HH:MM (e.g., "2pm" → "14:00", "3:30pm" → "15:30")
- Be lenient with name formats
- Use null for anything not stated; never invent values

{json_only}"#;

pub const NO_HISTORY: &str = "No previous conversation";
