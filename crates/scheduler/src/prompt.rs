//! Translation prompt construction.

/// Build the single-turn translation prompt for one request.
pub(crate) fn build_prompt(text: &str, target_language: &str) -> String {
    format!(
        "Translate the following text into {target_language}. \
         Reply with only the translation, nothing else.\n\n{text}"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_names_language_and_carries_text() {
        let p = build_prompt("hello world", "arabic");
        assert!(p.contains("into arabic"));
        assert!(p.ends_with("hello world"));
    }
}
