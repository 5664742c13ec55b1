/// Resolves the positional placeholders of a requirement template against
/// the running question-number range, e.g.
/// "Questions {start}-{end}: choose the correct heading" → "Questions 5-8: ...".
pub fn resolve_requirement(template: &str, start: usize, end: usize) -> String {
    template
        .replace("{start}", &start.to_string())
        .replace("{end}", &end.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_range_placeholders() {
        assert_eq!(
            resolve_requirement("Questions {start}-{end}: complete the summary.", 5, 7),
            "Questions 5-7: complete the summary."
        );
    }

    #[test]
    fn leaves_plain_templates_alone() {
        assert_eq!(
            resolve_requirement("Choose the correct letter.", 1, 4),
            "Choose the correct letter."
        );
    }
}
