//! Prompt rendering for the narrative generator

use super::NarrativeRequest;

const TEMPLATE: &str = "\
You are an analyst for a small service business. Using only the indicators \
below, write a short plain-language summary (at most five sentences) of how \
the business performed in the current period compared to the previous one. \
Do not invent numbers. Percentages are already multiplied by 100.

Indicators:
{{indicators}}
";

/// Render the generation prompt for a request
///
/// Indicators are listed one per line in key order, so identical requests
/// produce identical prompts.
pub fn render_prompt(request: &NarrativeRequest) -> String {
    let indicators = if request.is_empty() {
        "(no data)".to_string()
    } else {
        request
            .iter()
            .map(|(key, value)| format!("- {}: {}", key, value))
            .collect::<Vec<_>>()
            .join("\n")
    };

    TEMPLATE.replace("{{indicators}}", &indicators)
}
