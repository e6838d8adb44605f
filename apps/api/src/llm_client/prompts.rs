// Shared prompt fragments used by more than one caller.
// Stage-specific templates live in analysis/prompts.rs.

/// System prompt fragment that enforces JSON-only output. Appended to the system
/// instruction for providers without a native JSON output mode.
pub const JSON_ONLY_SYSTEM: &str = "You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";
