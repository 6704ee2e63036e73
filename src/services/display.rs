/// Token replaced by the value in a display template
pub const PLACEHOLDER: &str = "{value}";

/// Label used when the template has no placeholder
pub const DEFAULT_LABEL: &str = "SR: ";

/// Shown until the first value is known
pub const PENDING_VALUE: &str = "---";

/// Render `value` into `template`.
///
/// Only the first `{value}` is substituted. A template without the token
/// yields `"SR: <value>"`.
pub fn format_display(template: &str, value: u32) -> String {
    render(template, &value.to_string())
}

/// Label shown before any value has been recognized
pub fn format_pending(template: &str) -> String {
    render(template, PENDING_VALUE)
}

fn render(template: &str, value: &str) -> String {
    if template.contains(PLACEHOLDER) {
        template.replacen(PLACEHOLDER, value, 1)
    } else {
        format!("{}{}", DEFAULT_LABEL, value)
    }
}
