//! Outbound message templating.

/// Placeholder value used for `{speed}` when no speed was measured.
pub const NO_SPEED: &str = "N/A";

/// Substitute `{payload}`, `{topic}` and `{speed}` into `template`.
///
/// Substitution happens in that order on the running result, so a payload
/// that itself contains `{topic}` is expanded as well.
pub fn render(template: &str, topic: &str, payload: &str, speed: Option<&str>) -> String {
    let message = template.replace("{payload}", payload).replace("{topic}", topic);
    if message.contains("{speed}") {
        message.replace("{speed}", speed.unwrap_or(NO_SPEED))
    } else {
        message
    }
}
