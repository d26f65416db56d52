use crate::models::Theme;

/// Lowercases, trims, turns whitespace runs into `-`, and drops anything
/// outside `[a-z0-9-]`.
pub fn sanitize_repo_name(name: &str) -> String {
    let lowered = name.trim().to_lowercase();

    let mut out = String::with_capacity(lowered.len());
    let mut in_whitespace = false;
    for c in lowered.chars() {
        if c.is_whitespace() {
            if !in_whitespace {
                out.push('-');
            }
            in_whitespace = true;
            continue;
        }
        in_whitespace = false;
        if c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' {
            out.push(c);
        }
    }
    out
}

/// Default repository name offered for a person and theme:
/// `{sanitized-name}-{theme}-portfolio`.
pub fn format_repo_name(name: &str, theme: Theme) -> String {
    format!(
        "{}-{}-portfolio",
        sanitize_repo_name(name),
        theme.name().to_lowercase()
    )
}
