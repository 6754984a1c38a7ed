//! Parsing of free-form judge and critique responses.
//!
//! These functions extract structured values from model output. They are
//! pure text matching: no I/O.
//!
//! | Function | Use | Looks for |
//! |----------|-----|-----------|
//! | [`parse_score`] | Debate evaluation, prompt judging | JSON `score`, `N/10`, `N%`, bare number |
//! | [`parse_findings`] | Critique text | error and gap lines |

/// Parse a judge's score into `0.0..=1.0`.
///
/// # Supported Formats
///
/// 1. **JSON** (preferred): `{"score": 8, "reasoning": "..."}`; values above
///    1 are read on a 0-10 scale
/// 2. **Fraction**: `8/10`
/// 3. **Percentage**: `80%`
/// 4. **Bare number**: decimals up to 1 are taken as-is, anything else up
///    to 10 is read on a 0-10 scale
///
/// Returns `None` when nothing score-like is found.
///
/// # Examples
///
/// ```
/// use conclave_domain::parsing::parse_score;
///
/// assert_eq!(parse_score(r#"{"score": 8, "reasoning": "Good"}"#), Some(0.8));
/// assert_eq!(parse_score("I rate this 7/10"), Some(0.7));
/// assert_eq!(parse_score("Score: 0.25"), Some(0.25));
/// assert_eq!(parse_score("No numbers here"), None);
/// ```
pub fn parse_score(response: &str) -> Option<f64> {
    if let Some(start) = response.find('{')
        && let Some(end) = response[start..].rfind('}')
    {
        let json_str = &response[start..start + end + 1];
        if let Ok(parsed) = serde_json::from_str::<serde_json::Value>(json_str)
            && let Some(score) = parsed.get("score").and_then(|v| v.as_f64())
        {
            return Some(normalize(score, score.fract() != 0.0));
        }
    }

    for word in response.split_whitespace() {
        let word = word.trim_end_matches(['.', ',', ';', ')']);

        if let Some(num_str) = word.strip_suffix("/10")
            && let Ok(num) = num_str.trim_start_matches('(').parse::<f64>()
        {
            return Some((num / 10.0).clamp(0.0, 1.0));
        }

        if let Some(num_str) = word.strip_suffix('%')
            && let Ok(num) = num_str.parse::<f64>()
        {
            return Some((num / 100.0).clamp(0.0, 1.0));
        }

        let bare = word.trim_matches(|c: char| !c.is_ascii_digit() && c != '.');
        let bare = bare.trim_matches('.');
        if let Ok(num) = bare.parse::<f64>()
            && (0.0..=10.0).contains(&num)
        {
            return Some(normalize(num, bare.contains('.')));
        }
    }

    None
}

/// Decimals in `0..=1` are already unit scores; everything else is 0-10.
fn normalize(value: f64, is_decimal: bool) -> f64 {
    if is_decimal && (0.0..=1.0).contains(&value) {
        value
    } else {
        (value / 10.0).clamp(0.0, 1.0)
    }
}

const ERROR_MARKERS: &[&str] = &[
    "error",
    "incorrect",
    "wrong",
    "inaccurate",
    "false",
    "mistake",
    "contradict",
];

const GAP_MARKERS: &[&str] = &[
    "missing",
    "omits",
    "omitted",
    "gap",
    "does not mention",
    "doesn't mention",
    "should also",
    "lacks",
    "incomplete",
];

/// Pull error and gap lines out of a critique.
///
/// # Returns
///
/// `(errors, gaps)`, each a list of trimmed lines with list markers removed
pub fn parse_findings(critique: &str) -> (Vec<String>, Vec<String>) {
    let mut errors = Vec::new();
    let mut gaps = Vec::new();

    for line in critique.lines() {
        let cleaned = line
            .trim()
            .trim_start_matches(|c: char| c == '-' || c == '*' || c == '•' || c.is_ascii_digit())
            .trim_start_matches(['.', ')'])
            .trim();
        if cleaned.is_empty() {
            continue;
        }
        let lowered = cleaned.to_lowercase();
        if ERROR_MARKERS.iter().any(|m| lowered.contains(m)) {
            errors.push(cleaned.to_string());
        } else if GAP_MARKERS.iter().any(|m| lowered.contains(m)) {
            gaps.push(cleaned.to_string());
        }
    }

    (errors, gaps)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_score_json() {
        let response = r#"{"score": 8, "reasoning": "Good plan"}"#;
        assert_eq!(parse_score(response), Some(0.8));

        let response = r#"
Here is my evaluation:
```json
{"score": 0.65, "reasoning": "Solid but could improve"}
```
"#;
        assert_eq!(parse_score(response), Some(0.65));
    }

    #[test]
    fn test_parse_score_patterns() {
        assert_eq!(parse_score("I rate this 8/10"), Some(0.8));
        assert_eq!(parse_score("Score: 6/10."), Some(0.6));
        assert_eq!(parse_score("Roughly 90% convincing"), Some(0.9));
        assert_eq!(parse_score("My score is 9"), Some(0.9));
        assert_eq!(parse_score("Score: 0.4"), Some(0.4));
    }

    #[test]
    fn test_parse_score_clamps() {
        assert_eq!(parse_score(r#"{"score": 15}"#), Some(1.0));
        assert_eq!(parse_score(r#"{"score": -5}"#), Some(0.0));
    }

    #[test]
    fn test_parse_score_none() {
        assert_eq!(parse_score("No numbers here"), None);
        assert_eq!(parse_score(""), None);
        assert_eq!(parse_score("In 1999 things changed"), None);
    }

    #[test]
    fn test_parse_findings() {
        let critique = "Overall decent.\n\
            - The capital is wrong: it is Canberra, not Sydney.\n\
            - Missing the founding year.\n\
            2. Good structure.";
        let (errors, gaps) = parse_findings(critique);
        assert_eq!(errors, vec!["The capital is wrong: it is Canberra, not Sydney."]);
        assert_eq!(gaps, vec!["Missing the founding year."]);
    }
}
