//! Role value objects

use crate::core::model::Capability;
use crate::planning::StepRole;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Authority level of a role (executive > manager > specialist > assistant)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleLevel {
    Executive,
    Manager,
    Specialist,
    Assistant,
}

impl RoleLevel {
    /// Numeric authority; higher delegates to lower
    pub fn authority(&self) -> u8 {
        match self {
            RoleLevel::Executive => 3,
            RoleLevel::Manager => 2,
            RoleLevel::Specialist => 1,
            RoleLevel::Assistant => 0,
        }
    }

    pub fn can_delegate_to(&self, other: RoleLevel) -> bool {
        self.authority() > other.authority()
    }

    /// Default model tier for steps owned by a role at this level
    pub fn model_tier(&self) -> ModelTier {
        match self {
            RoleLevel::Executive => ModelTier::Premium,
            RoleLevel::Manager | RoleLevel::Specialist => ModelTier::Standard,
            RoleLevel::Assistant => ModelTier::Economy,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RoleLevel::Executive => "executive",
            RoleLevel::Manager => "manager",
            RoleLevel::Specialist => "specialist",
            RoleLevel::Assistant => "assistant",
        }
    }
}

impl std::fmt::Display for RoleLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Cost/quality band of models a role should be given
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelTier {
    Premium,
    Standard,
    Economy,
}

impl ModelTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelTier::Premium => "premium",
            ModelTier::Standard => "standard",
            ModelTier::Economy => "economy",
        }
    }
}

impl std::fmt::Display for ModelTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Action a role is allowed to take
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    Delegate,
    Approve,
    Synthesize,
    Plan,
    Review,
    Research,
    Analyze,
    Verify,
    Critique,
    Retrieve,
}

/// One node of the role hierarchy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Role {
    pub name: String,
    pub level: RoleLevel,
    pub parent: Option<String>,
    pub children: Vec<String>,
    pub permissions: BTreeSet<Permission>,
    pub required_capabilities: Vec<Capability>,
    /// Maximum number of sub-tasks this role may hand out at once
    pub max_delegation: usize,
    /// Plan step role used when this role owns a step
    pub default_step: StepRole,
}

impl Role {
    pub fn new(name: impl Into<String>, level: RoleLevel, parent: Option<&str>) -> Self {
        Self {
            name: name.into(),
            level,
            parent: parent.map(str::to_string),
            children: Vec::new(),
            permissions: BTreeSet::new(),
            required_capabilities: Vec::new(),
            max_delegation: 0,
            default_step: StepRole::Draft,
        }
    }

    pub fn with_children<'a>(mut self, children: impl IntoIterator<Item = &'a str>) -> Self {
        self.children.extend(children.into_iter().map(str::to_string));
        self
    }

    pub fn with_permissions(mut self, permissions: impl IntoIterator<Item = Permission>) -> Self {
        self.permissions.extend(permissions);
        self
    }

    pub fn with_capabilities(mut self, capabilities: impl IntoIterator<Item = Capability>) -> Self {
        self.required_capabilities.extend(capabilities);
        self
    }

    pub fn with_max_delegation(mut self, max: usize) -> Self {
        self.max_delegation = max;
        self
    }

    pub fn with_default_step(mut self, step: StepRole) -> Self {
        self.default_step = step;
        self
    }

    pub fn has_permission(&self, permission: Permission) -> bool {
        self.permissions.contains(&permission)
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_authority_order() {
        assert!(RoleLevel::Executive.can_delegate_to(RoleLevel::Assistant));
        assert!(RoleLevel::Manager.can_delegate_to(RoleLevel::Specialist));
        assert!(!RoleLevel::Manager.can_delegate_to(RoleLevel::Manager));
        assert!(!RoleLevel::Assistant.can_delegate_to(RoleLevel::Assistant));
        assert!(!RoleLevel::Specialist.can_delegate_to(RoleLevel::Executive));
    }

    #[test]
    fn test_role_builder() {
        let role = Role::new("critic", RoleLevel::Specialist, Some("quality_manager"))
            .with_permissions([Permission::Critique])
            .with_default_step(StepRole::Critique);
        assert!(role.has_permission(Permission::Critique));
        assert!(!role.has_permission(Permission::Delegate));
        assert!(role.is_leaf());
        assert_eq!(role.parent.as_deref(), Some("quality_manager"));
    }
}
