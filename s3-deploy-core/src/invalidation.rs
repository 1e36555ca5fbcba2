use regex::Regex;
use std::sync::OnceLock;

/// Matches `"Invalidation": { ... "Id": "<id>"` in the CLI's JSON response,
/// compact or pretty-printed. Objects nested one level deep may come before `Id`.
fn invalidation_id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#""Invalidation"\s*:\s*\{(?:[^{}]|\{[^{}]*\})*?"Id"\s*:\s*"([^"]*)""#)
            .expect("invalidation id pattern is valid")
    })
}

/// Pulls the invalidation id out of `create-invalidation` output.
///
/// Returns an empty string when the response has no `Invalidation.Id`.
pub fn parse_invalidation_id(output: &str) -> String {
    invalidation_id_pattern()
        .captures(output)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_default()
}
