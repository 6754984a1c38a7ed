use serde::{Deserialize, Serialize};

/// Stage of an orchestrated request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Prompt rewriting before any answer is requested
    Diffusion,
    /// Domain classification and model selection
    Routing,
    /// Models answering the prompt
    Answering,
    /// Critique and debate between disagreeing answers
    Consensus,
    /// Weighted voting across ensemble members
    Voting,
    /// Merging answers into the final response
    Synthesis,
}

impl Phase {
    pub fn as_str(&self) -> &str {
        match self {
            Phase::Diffusion => "diffusion",
            Phase::Routing => "routing",
            Phase::Answering => "answering",
            Phase::Consensus => "consensus",
            Phase::Voting => "voting",
            Phase::Synthesis => "synthesis",
        }
    }

    pub fn display_name(&self) -> &str {
        match self {
            Phase::Diffusion => "Prompt Diffusion",
            Phase::Routing => "Routing",
            Phase::Answering => "Answering",
            Phase::Consensus => "Consensus",
            Phase::Voting => "Ensemble Voting",
            Phase::Synthesis => "Synthesis",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}
