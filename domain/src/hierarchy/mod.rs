//! Role hierarchy: the fixed delegation tree used by the planners.
//!
//! ```text
//! executive
//! ├── coordinator
//! │   ├── lead_researcher ── research_assistant
//! │   └── lead_analyst ───── analysis_assistant
//! └── quality_manager
//!     ├── fact_checker
//!     └── critic
//! ```
//!
//! Authority flows strictly downwards by level: a role may delegate only to
//! roles of a lower level, regardless of where they sit in the tree.

pub mod role;

pub use role::{ModelTier, Permission, Role, RoleLevel};

use crate::core::error::DomainError;
use crate::core::model::Capability;
use crate::planning::StepRole;
use std::collections::{BTreeMap, VecDeque};

pub const EXECUTIVE: &str = "executive";
pub const COORDINATOR: &str = "coordinator";
pub const QUALITY_MANAGER: &str = "quality_manager";
pub const LEAD_RESEARCHER: &str = "lead_researcher";
pub const LEAD_ANALYST: &str = "lead_analyst";
pub const FACT_CHECKER: &str = "fact_checker";
pub const CRITIC: &str = "critic";
pub const RESEARCH_ASSISTANT: &str = "research_assistant";
pub const ANALYSIS_ASSISTANT: &str = "analysis_assistant";

/// Fixed tree of orchestration roles, built once at startup
#[derive(Debug, Clone)]
pub struct RoleHierarchy {
    roles: BTreeMap<String, Role>,
    root: String,
}

impl RoleHierarchy {
    /// The standard four-level tree
    pub fn standard() -> Self {
        use Capability as C;
        use Permission as P;

        let roles = [
            Role::new(EXECUTIVE, RoleLevel::Executive, None)
                .with_children([COORDINATOR, QUALITY_MANAGER])
                .with_permissions([P::Delegate, P::Approve, P::Synthesize])
                .with_capabilities([C::Reasoning, C::Analysis])
                .with_max_delegation(2)
                .with_default_step(StepRole::Synthesize),
            Role::new(COORDINATOR, RoleLevel::Manager, Some(EXECUTIVE))
                .with_children([LEAD_RESEARCHER, LEAD_ANALYST])
                .with_permissions([P::Delegate, P::Plan])
                .with_capabilities([C::Reasoning])
                .with_max_delegation(4)
                .with_default_step(StepRole::Synthesize),
            Role::new(QUALITY_MANAGER, RoleLevel::Manager, Some(EXECUTIVE))
                .with_children([FACT_CHECKER, CRITIC])
                .with_permissions([P::Delegate, P::Review, P::Approve])
                .with_capabilities([C::Analysis, C::FactChecking])
                .with_max_delegation(4)
                .with_default_step(StepRole::Critique),
            Role::new(LEAD_RESEARCHER, RoleLevel::Specialist, Some(COORDINATOR))
                .with_children([RESEARCH_ASSISTANT])
                .with_permissions([P::Delegate, P::Research])
                .with_capabilities([C::Research])
                .with_max_delegation(2)
                .with_default_step(StepRole::Research),
            Role::new(LEAD_ANALYST, RoleLevel::Specialist, Some(COORDINATOR))
                .with_children([ANALYSIS_ASSISTANT])
                .with_permissions([P::Delegate, P::Analyze])
                .with_capabilities([C::Analysis, C::Reasoning])
                .with_max_delegation(2)
                .with_default_step(StepRole::Draft),
            Role::new(FACT_CHECKER, RoleLevel::Specialist, Some(QUALITY_MANAGER))
                .with_permissions([P::Verify])
                .with_capabilities([C::FactChecking])
                .with_default_step(StepRole::FactCheck),
            Role::new(CRITIC, RoleLevel::Specialist, Some(QUALITY_MANAGER))
                .with_permissions([P::Critique, P::Review])
                .with_capabilities([C::Reasoning, C::Analysis])
                .with_default_step(StepRole::Critique),
            Role::new(RESEARCH_ASSISTANT, RoleLevel::Assistant, Some(LEAD_RESEARCHER))
                .with_permissions([P::Retrieve])
                .with_capabilities([C::Fast, C::Research])
                .with_default_step(StepRole::Retrieval),
            Role::new(ANALYSIS_ASSISTANT, RoleLevel::Assistant, Some(LEAD_ANALYST))
                .with_permissions([P::Retrieve, P::Analyze])
                .with_capabilities([C::Fast, C::Analysis])
                .with_default_step(StepRole::Retrieval),
        ];

        Self {
            roles: roles.into_iter().map(|r| (r.name.clone(), r)).collect(),
            root: EXECUTIVE.to_string(),
        }
    }

    pub fn root(&self) -> &Role {
        &self.roles[&self.root]
    }

    pub fn get(&self, name: &str) -> Option<&Role> {
        self.roles.get(name)
    }

    pub fn require(&self, name: &str) -> Result<&Role, DomainError> {
        self.get(name)
            .ok_or_else(|| DomainError::UnknownRole(name.to_string()))
    }

    pub fn roles(&self) -> impl Iterator<Item = &Role> {
        self.roles.values()
    }

    pub fn roles_at(&self, level: RoleLevel) -> Vec<&Role> {
        self.roles.values().filter(|r| r.level == level).collect()
    }

    /// Parent chain of `name`, nearest first
    pub fn ancestors(&self, name: &str) -> Vec<&Role> {
        let mut chain = Vec::new();
        let mut current = self.get(name).and_then(|r| r.parent.as_deref());
        while let Some(parent_name) = current {
            let Some(parent) = self.get(parent_name) else {
                break;
            };
            chain.push(parent);
            current = parent.parent.as_deref();
        }
        chain
    }

    /// Every role below `name`, breadth first
    pub fn descendants(&self, name: &str) -> Vec<&Role> {
        let mut found = Vec::new();
        let mut queue: VecDeque<&str> = self
            .get(name)
            .map(|r| r.children.iter().map(String::as_str).collect())
            .unwrap_or_default();

        while let Some(child_name) = queue.pop_front() {
            if let Some(child) = self.get(child_name) {
                queue.extend(child.children.iter().map(String::as_str));
                found.push(child);
            }
        }
        found
    }

    /// Whether `from` may delegate to `to`: true only when `from` has
    /// strictly higher authority. Unknown roles never delegate.
    pub fn can_delegate(&self, from: &str, to: &str) -> bool {
        match (self.get(from), self.get(to)) {
            (Some(parent), Some(child)) => parent.level.can_delegate_to(child.level),
            _ => false,
        }
    }

    /// Stable sort of `role_names` by authority, highest first.
    ///
    /// Unknown names keep their relative order after all known roles.
    pub fn execution_order(&self, role_names: &[&str]) -> Vec<String> {
        let mut ordered: Vec<(usize, &str)> = role_names
            .iter()
            .map(|name| {
                let rank = self
                    .get(name)
                    .map(|r| 3 - r.level.authority() as usize)
                    .unwrap_or(usize::MAX);
                (rank, *name)
            })
            .collect();
        ordered.sort_by_key(|(rank, _)| *rank);
        ordered.into_iter().map(|(_, n)| n.to_string()).collect()
    }

    /// Model tier for the role named `name` (standard when unknown)
    pub fn model_tier(&self, name: &str) -> ModelTier {
        self.get(name)
            .map(|r| r.level.model_tier())
            .unwrap_or(ModelTier::Standard)
    }
}

impl Default for RoleHierarchy {
    fn default() -> Self {
        Self::standard()
    }
}
