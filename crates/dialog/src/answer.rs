//! Yes/no answer parsing for confirm prompts
//!
//! Transcribed speech, so a little more generous than a literal
//! yes/no match. Anything unrecognized makes the prompt re-ask.

/// Parse a confirm answer. `None` means the prompt must re-ask.
pub fn parse_yes_no(answer: &str) -> Option<bool> {
    let normalized: String = answer
        .trim()
        .to_lowercase()
        .chars()
        .filter(|c| !c.is_ascii_punctuation())
        .collect();
    match normalized.as_str() {
        "yes" | "y" | "yeah" | "yep" | "sure" | "ok" | "okay" | "please do" => Some(true),
        "no" | "n" | "nope" | "no thanks" | "no thank you" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_common_forms() {
        assert_eq!(parse_yes_no("Yes."), Some(true));
        assert_eq!(parse_yes_no(" okay "), Some(true));
        assert_eq!(parse_yes_no("No, thanks!"), Some(false));
        assert_eq!(parse_yes_no("Nope"), Some(false));
    }

    #[test]
    fn anything_else_reprompts() {
        assert_eq!(parse_yes_no("maybe"), None);
        assert_eq!(parse_yes_no(""), None);
    }
}
