//! Text helpers shared by the scoring heuristics.

use std::collections::BTreeSet;

const STOPWORDS: &[&str] = &[
    "a", "about", "all", "also", "am", "an", "and", "any", "are", "as", "at", "be", "been",
    "but", "by", "can", "could", "did", "do", "does", "for", "from", "had", "has", "have",
    "he", "her", "his", "how", "i", "if", "in", "into", "is", "it", "its", "it's", "just",
    "may", "me", "more", "most", "my", "no", "not", "of", "on", "or", "our", "out", "she",
    "so", "some", "than", "that", "the", "their", "them", "then", "there", "these", "they",
    "this", "those", "to", "too", "very", "was", "we", "were", "what", "when", "where",
    "which", "while", "who", "why", "will", "with", "would", "yes", "you", "your",
];

/// Truncate a string to a maximum length with ellipsis (UTF-8 safe)
///
/// Uses byte length for max_len but ensures truncation occurs at valid
/// UTF-8 character boundaries.
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        s.to_string()
    } else {
        let target = max_len.saturating_sub(3);
        let mut end = target.min(s.len());
        while end > 0 && !s.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &s[..end])
    }
}

pub fn is_stopword(word: &str) -> bool {
    STOPWORDS.contains(&word)
}

/// Lowercased alphanumeric words
pub fn words(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric() && c != '\'' && c != '’')
        .map(normalize)
        .filter(|w| !w.is_empty())
        .collect()
}

pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Distinct lowercased words with stopwords and possessives removed
pub fn content_words(text: &str) -> BTreeSet<String> {
    words(text)
        .into_iter()
        .filter(|w| !is_stopword(w))
        .collect()
}

/// Capitalized or numeric tokens, lowercased.
///
/// Sentence-initial words count too; stopwords such as a leading "The"
/// are dropped.
pub fn entities(text: &str) -> BTreeSet<String> {
    text.split_whitespace()
        .map(|raw| raw.trim_matches(|c: char| !c.is_alphanumeric()))
        .filter(|tok| {
            tok.chars().next().is_some_and(char::is_uppercase)
                || tok.chars().any(|c| c.is_ascii_digit())
        })
        .map(normalize)
        .filter(|w| !w.is_empty() && !is_stopword(w))
        .collect()
}

/// Jaccard index of two sets; two empty sets are identical.
pub fn jaccard<T: Ord>(a: &BTreeSet<T>, b: &BTreeSet<T>) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    let intersection = a.intersection(b).count();
    let union = a.union(b).count();
    intersection as f64 / union as f64
}

/// How many of `phrases` occur in already-lowercased `text`
pub fn count_phrases(lowered: &str, phrases: &[&str]) -> usize {
    phrases.iter().filter(|p| lowered.contains(*p)).count()
}

fn normalize(word: &str) -> String {
    let lowered = word.to_lowercase();
    let trimmed = lowered.trim_matches(|c: char| c == '\'' || c == '’');
    trimmed
        .strip_suffix("'s")
        .or_else(|| trimmed.strip_suffix("’s"))
        .unwrap_or(trimmed)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_ascii() {
        assert_eq!(truncate("hello", 10), "hello");
        assert_eq!(truncate("hello world", 8), "hello...");
    }

    #[test]
    fn test_truncate_multibyte() {
        // 'é' is two bytes; target=4 lands inside the second one
        assert_eq!(truncate("éééé", 7), "éé...");
        assert_eq!(truncate("éééé", 8), "éééé");
    }

    #[test]
    fn test_content_words_strip_possessive() {
        let words = content_words("France's capital is Paris.");
        assert!(words.contains("france"));
        assert!(words.contains("capital"));
        assert!(words.contains("paris"));
        assert!(!words.contains("is"));
    }

    #[test]
    fn test_entities() {
        let found = entities("The capital of Australia is Canberra, pop. 460000.");
        assert!(found.contains("australia"));
        assert!(found.contains("canberra"));
        assert!(found.contains("460000"));
        assert!(!found.contains("the"));
        assert!(!found.contains("capital"));
    }

    #[test]
    fn test_jaccard() {
        let a: BTreeSet<&str> = ["x", "y"].into_iter().collect();
        let b: BTreeSet<&str> = ["y", "z"].into_iter().collect();
        assert!((jaccard(&a, &b) - 1.0 / 3.0).abs() < 1e-9);
        assert_eq!(jaccard::<&str>(&BTreeSet::new(), &BTreeSet::new()), 1.0);
    }
}
