/// Substitute variable references in `input` before parsing.
///
/// Rules:
/// - `$?`        → the status of the previous foreground command
/// - `$VAR`      → the environment value of `VAR`
///                 (identifier: ASCII letter or `_`, then alphanumerics/`_`)
/// - `${VAR}`    → same, with brace delimiters
/// - unset names → empty string
/// - any other `$` is kept as-is
pub fn expand_variables(input: &str, last_status: i32) -> String {
    expand_with(input, last_status, |name| std::env::var(name).ok())
}

pub fn expand_with<F>(input: &str, last_status: i32, lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    let mut result = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch != '$' {
            result.push(ch);
            continue;
        }

        match chars.peek() {
            Some('?') => {
                chars.next();
                result.push_str(&last_status.to_string());
            }
            Some('{') => {
                chars.next(); // consume '{'
                let name: String = chars.by_ref().take_while(|&c| c != '}').collect();
                result.push_str(&lookup(&name).unwrap_or_default());
            }
            Some(&c) if c.is_ascii_alphabetic() || c == '_' => {
                let mut name = String::new();
                while let Some(c) = chars.next_if(|c| c.is_ascii_alphanumeric() || *c == '_') {
                    name.push(c);
                }
                result.push_str(&lookup(&name).unwrap_or_default());
            }
            _ => result.push('$'),
        }
    }

    result
}

// ── Tests ──────────────────────────────────────────────────────────────────
