//! Component inference for fix commits without an explicit scope.
//!
//! Heuristic: strip the leading `fix:`/`fix` prefix, lowercase, split on
//! whitespace, return the first token that is not a stop word. Single-keyword
//! extraction is fragile on free-form messages; callers treat the result as a
//! hint, not a contract.

/// Tokens that never name a component.
const STOP_WORDS: &[&str] = &[
    "the", "a", "an", "in", "on", "for", "of", "to", "with", "and", "when",
    "bug", "issue", "error", "broken", "failing", "fixed", "fixes", "again",
    "still", "minor", "small", "typo", "wip", "more", "some",
];

/// Infer a component name from a commit message. Returns `None` when no
/// usable token remains after stripping the prefix and stop words.
pub fn infer_component(message: &str) -> Option<String> {
    let lower = message.trim().to_ascii_lowercase();
    let rest = strip_fix_prefix(&lower);
    for raw in rest.split_whitespace() {
        let token: String = raw
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
            .collect();
        let token = token.trim_matches('.').to_string();
        if token.is_empty() || STOP_WORDS.contains(&token.as_str()) {
            continue;
        }
        return Some(token);
    }
    None
}

/// Strip a leading `fix` token: `fix:`, `fix(scope):`, or bare `fix `,
/// but not words that merely start with "fix".
fn strip_fix_prefix(lower: &str) -> &str {
    if let Some(rest) = lower.strip_prefix("fix") {
        match rest.chars().next() {
            None => return "",
            Some(c) if !c.is_ascii_alphanumeric() => return rest,
            _ => {}
        }
    }
    lower
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_fix_colon_prefix() {
        assert_eq!(
            infer_component("fix: database connection timeout").as_deref(),
            Some("database")
        );
    }

    #[test]
    fn strips_bare_fix_prefix() {
        assert_eq!(
            infer_component("fix login redirect loop").as_deref(),
            Some("login")
        );
    }

    #[test]
    fn strips_scoped_fix_prefix() {
        // "(auth):" survives the prefix strip; punctuation is filtered per token
        assert_eq!(infer_component("fix(auth): retry").as_deref(), Some("auth"));
    }

    #[test]
    fn skips_stop_words() {
        assert_eq!(
            infer_component("fix: the broken ingress route").as_deref(),
            Some("ingress")
        );
    }

    #[test]
    fn all_stop_words_yields_none() {
        assert_eq!(infer_component("fix: the bug again"), None);
        assert_eq!(infer_component("fix:"), None);
        assert_eq!(infer_component(""), None);
    }

    #[test]
    fn fixture_is_not_a_fix_prefix() {
        assert_eq!(infer_component("fixture cleanup").as_deref(), Some("fixture"));
    }

    #[test]
    fn lowercases_tokens() {
        assert_eq!(infer_component("fix: TLS handshake").as_deref(), Some("tls"));
    }

    #[test]
    fn keeps_path_like_tokens() {
        assert_eq!(
            infer_component("fix: api.v2 pagination").as_deref(),
            Some("api.v2")
        );
    }
}
