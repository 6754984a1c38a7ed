//! Coarse topic classification of queries.

use crate::core::model::Capability;
use serde::{Deserialize, Serialize};

/// Topic domain of a query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    Coding,
    Math,
    Science,
    Creative,
    Business,
    Legal,
    Medical,
    General,
}

/// Classification order doubles as the tie-break order.
const CLASSIFIED: [Domain; 7] = [
    Domain::Coding,
    Domain::Math,
    Domain::Science,
    Domain::Creative,
    Domain::Business,
    Domain::Legal,
    Domain::Medical,
];

const IMPORTANT_KEYWORDS: &[&str] = &[
    "important",
    "critical",
    "crucial",
    "production",
    "urgent",
    "accurate",
    "accuracy",
    "carefully",
    "high-stakes",
    "safety",
    "security",
    "financial",
];

const COMPLEX_KEYWORDS: &[&str] = &[
    "analyze",
    "analyse",
    "compare",
    "design",
    "architecture",
    "trade-off",
    "tradeoff",
    "tradeoffs",
    "evaluate",
    "prove",
    "comprehensive",
    "explain why",
    "step by step",
    "in depth",
    "pros and cons",
];

/// Word count above which a query is considered complex on length alone.
const COMPLEX_WORD_COUNT: usize = 60;

impl Domain {
    pub fn as_str(&self) -> &'static str {
        match self {
            Domain::Coding => "coding",
            Domain::Math => "math",
            Domain::Science => "science",
            Domain::Creative => "creative",
            Domain::Business => "business",
            Domain::Legal => "legal",
            Domain::Medical => "medical",
            Domain::General => "general",
        }
    }

    fn keywords(&self) -> &'static [&'static str] {
        match self {
            Domain::Coding => &[
                "code",
                "function",
                "bug",
                "compile",
                "compiler",
                "rust",
                "python",
                "javascript",
                "typescript",
                "api",
                "algorithm",
                "debug",
                "refactor",
                "sql",
                "programming",
                "implement",
                "unit test",
            ],
            Domain::Math => &[
                "calculate",
                "equation",
                "integral",
                "derivative",
                "proof",
                "theorem",
                "probability",
                "algebra",
                "math",
                "matrix",
                "prime",
            ],
            Domain::Science => &[
                "physics",
                "chemistry",
                "biology",
                "quantum",
                "molecule",
                "experiment",
                "scientific",
                "climate",
                "evolution",
                "energy",
            ],
            Domain::Creative => &[
                "story",
                "poem",
                "creative",
                "fiction",
                "lyrics",
                "imagine",
                "narrative",
                "character",
                "write a",
            ],
            Domain::Business => &[
                "market",
                "revenue",
                "strategy",
                "startup",
                "business",
                "sales",
                "customer",
                "pricing",
                "investment",
                "profit",
            ],
            Domain::Legal => &[
                "law",
                "legal",
                "contract",
                "court",
                "liability",
                "regulation",
                "compliance",
                "lawsuit",
                "statute",
            ],
            Domain::Medical => &[
                "medical",
                "symptom",
                "symptoms",
                "disease",
                "diagnosis",
                "treatment",
                "drug",
                "health",
                "patient",
                "clinical",
            ],
            Domain::General => &[],
        }
    }

    /// Classify a query by keyword hits; ties resolve in declaration order.
    pub fn classify(query: &str) -> Domain {
        let lowered = query.to_lowercase();
        let tokens = tokenize(&lowered);

        let mut best = Domain::General;
        let mut best_hits = 0;
        for domain in CLASSIFIED {
            let hits = count_hits(&lowered, &tokens, domain.keywords());
            if hits > best_hits {
                best = domain;
                best_hits = hits;
            }
        }
        best
    }
}

impl std::fmt::Display for Domain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Domain {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "coding" => Ok(Domain::Coding),
            "math" => Ok(Domain::Math),
            "science" => Ok(Domain::Science),
            "creative" => Ok(Domain::Creative),
            "business" => Ok(Domain::Business),
            "legal" => Ok(Domain::Legal),
            "medical" => Ok(Domain::Medical),
            "general" => Ok(Domain::General),
            other => Err(format!("unknown domain: {other}")),
        }
    }
}

impl Domain {
    /// Capabilities a model should have to answer well in this domain
    pub fn preferred_capabilities(&self) -> Vec<Capability> {
        use Capability as C;
        match self {
            Domain::Coding => vec![C::Coding, C::Reasoning],
            Domain::Math => vec![C::Math, C::Reasoning],
            Domain::Science => vec![C::Reasoning, C::Research],
            Domain::Creative => vec![C::Creative],
            Domain::Business => vec![C::Analysis, C::Summarization],
            Domain::Legal => vec![C::Analysis, C::Reasoning, C::LongContext],
            Domain::Medical => vec![C::Research, C::FactChecking],
            Domain::General => vec![C::Reasoning],
        }
    }
}

/// Query characteristics that drive the ensemble decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryTraits {
    pub domain: Domain,
    pub important: bool,
    pub complex: bool,
}

impl QueryTraits {
    pub fn analyze(query: &str) -> Self {
        let lowered = query.to_lowercase();
        let tokens = tokenize(&lowered);

        let important = count_hits(&lowered, &tokens, IMPORTANT_KEYWORDS) > 0;
        let complex = tokens.len() > COMPLEX_WORD_COUNT
            || count_hits(&lowered, &tokens, COMPLEX_KEYWORDS) > 0;

        Self {
            domain: Domain::classify(query),
            important,
            complex,
        }
    }
}

fn tokenize(lowered: &str) -> Vec<&str> {
    lowered
        .split(|c: char| !c.is_alphanumeric() && c != '-')
        .filter(|t| !t.is_empty())
        .collect()
}

/// Single words match whole tokens; phrases match as substrings.
fn count_hits(lowered: &str, tokens: &[&str], keywords: &[&str]) -> usize {
    keywords
        .iter()
        .filter(|kw| {
            if kw.contains(' ') {
                lowered.contains(*kw)
            } else {
                tokens.contains(kw)
            }
        })
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_coding() {
        assert_eq!(
            Domain::classify("Why does this Rust function fail to compile?"),
            Domain::Coding
        );
    }

    #[test]
    fn test_classify_medical() {
        assert_eq!(
            Domain::classify("What are common symptoms and treatment of flu?"),
            Domain::Medical
        );
    }

    #[test]
    fn test_classify_general_fallback() {
        assert_eq!(
            Domain::classify("What is the capital of France?"),
            Domain::General
        );
    }

    #[test]
    fn test_keyword_must_match_whole_token() {
        // "codec" must not count as "code"
        assert_eq!(Domain::classify("the codec shipped"), Domain::General);
    }

    #[test]
    fn test_domain_parse_roundtrip() {
        for d in CLASSIFIED {
            assert_eq!(d.as_str().parse::<Domain>().unwrap(), d);
        }
        assert!("astrology".parse::<Domain>().is_err());
    }

    #[test]
    fn test_traits_important_and_complex() {
        let t = QueryTraits::analyze("This is critical: compare the two designs");
        assert!(t.important);
        assert!(t.complex);

        let t = QueryTraits::analyze("What time is it?");
        assert!(!t.important);
        assert!(!t.complex);
    }

    #[test]
    fn test_traits_complex_by_length() {
        let query = "word ".repeat(COMPLEX_WORD_COUNT + 1);
        assert!(QueryTraits::analyze(&query).complex);
    }
}
