use crate::cli::OutputFormat;
use verifier::Verdict;

/// Render a verdict for the terminal
pub fn render(verdict: &Verdict, format: OutputFormat) -> Result<String, String> {
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(verdict)
            .map_err(|e| format!("Unable to serialize verdict: {e}")),
        OutputFormat::Text => Ok(render_text(verdict)),
    }
}

fn render_text(verdict: &Verdict) -> String {
    let mut out = String::new();
    for entry in verdict.entries() {
        match &entry.reason {
            None => out.push_str(&format!("{}  valid\n", entry.public_key)),
            Some(reason) => out.push_str(&format!(
                "{}  invalid ({}: {})\n",
                entry.public_key,
                reason.kind(),
                reason
            )),
        }
    }
    out.push_str(&format!(
        "{} of {} keyshares valid",
        verdict.len() - verdict.invalid_count(),
        verdict.len()
    ));
    out
}
