// src/board/requirements.rs

/// Splits the "one per line" requirements box into a list, trimming each
/// line and dropping blank ones.
pub fn parse_requirements(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_requirements() {
        let text = "Bachelor's degree\n  2+ years experience  \n\n\r\nStrong communication skills\n";
        assert_eq!(
            parse_requirements(text),
            vec![
                "Bachelor's degree",
                "2+ years experience",
                "Strong communication skills"
            ]
        );
    }

    #[test]
    fn test_parse_requirements_empty() {
        assert!(parse_requirements("").is_empty());
        assert!(parse_requirements(" \n \n").is_empty());
    }
}
