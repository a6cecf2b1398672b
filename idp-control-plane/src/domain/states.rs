//! Lifecycle state definitions for every platform resource.
//!
//! States serialize as their PascalCase variant names; that spelling is part
//! of the wire contract for command and query payloads.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! display_states {
    ($state:ty { $($variant:ident),+ $(,)? }) => {
        impl fmt::Display for $state {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                let s = match self {
                    $(Self::$variant => stringify!($variant)),+
                };
                write!(f, "{s}")
            }
        }
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TeamState {
    Draft,
    Active,
    Suspended,
    Archived,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ApplicationState {
    Proposed,
    Approved,
    Onboarding,
    Active,
    Deprecated,
    Decommissioning,
    Archived,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EnvironmentState {
    Planned,
    Active,
    Frozen,
    Retired,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ApplicationEnvironmentState {
    Declared,
    Provisioning,
    Active,
    Frozen,
    Decommissioning,
    Retired,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CodeRepositoryState {
    Declared,
    Provisioning,
    Active,
    Archived,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeploymentRepositoryState {
    Declared,
    Provisioning,
    Active,
    Archived,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SecretState {
    Declared,
    Provisioning,
    Active,
    Rotating,
    Suspended,
    Revoked,
    Archived,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SecretBindingState {
    Declared,
    Provisioning,
    Active,
    Suspended,
    Revoked,
}

display_states!(TeamState { Draft, Active, Suspended, Archived });
display_states!(ApplicationState {
    Proposed,
    Approved,
    Onboarding,
    Active,
    Deprecated,
    Decommissioning,
    Archived,
});
display_states!(EnvironmentState { Planned, Active, Frozen, Retired });
display_states!(ApplicationEnvironmentState {
    Declared,
    Provisioning,
    Active,
    Frozen,
    Decommissioning,
    Retired,
});
display_states!(CodeRepositoryState { Declared, Provisioning, Active, Archived });
display_states!(DeploymentRepositoryState { Declared, Provisioning, Active, Archived });
display_states!(SecretState {
    Declared,
    Provisioning,
    Active,
    Rotating,
    Suspended,
    Revoked,
    Archived,
});
display_states!(SecretBindingState { Declared, Provisioning, Active, Suspended, Revoked });

impl SecretState {
    /// `Revoked` is terminal: a revoked secret never becomes `Active` again.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Revoked | Self::Archived)
    }
}

// The Postgres team adapter round-trips states through TEXT columns.
impl std::str::FromStr for TeamState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Draft" => Ok(Self::Draft),
            "Active" => Ok(Self::Active),
            "Suspended" => Ok(Self::Suspended),
            "Archived" => Ok(Self::Archived),
            _ => Err(format!("invalid team state: {s}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn states_serialize_pascal_case() {
        assert_eq!(
            serde_json::to_string(&ApplicationState::Proposed).unwrap(),
            "\"Proposed\""
        );
        assert_eq!(
            serde_json::to_string(&SecretState::Rotating).unwrap(),
            "\"Rotating\""
        );
        let parsed: ApplicationEnvironmentState = serde_json::from_str("\"Declared\"").unwrap();
        assert_eq!(parsed, ApplicationEnvironmentState::Declared);
    }

    #[test]
    fn display_matches_wire_spelling() {
        assert_eq!(ApplicationState::Onboarding.to_string(), "Onboarding");
        assert_eq!(ApplicationEnvironmentState::Provisioning.to_string(), "Provisioning");
        assert_eq!(SecretBindingState::Declared.to_string(), "Declared");
    }

    #[test]
    fn team_state_round_trips_through_text() {
        for state in [
            TeamState::Draft,
            TeamState::Active,
            TeamState::Suspended,
            TeamState::Archived,
        ] {
            assert_eq!(state.to_string().parse::<TeamState>().unwrap(), state);
        }
        assert!("Bogus".parse::<TeamState>().is_err());
    }

    #[test]
    fn revoked_secret_is_terminal() {
        assert!(SecretState::Revoked.is_terminal());
        assert!(!SecretState::Active.is_terminal());
        assert!(!SecretState::Rotating.is_terminal());
    }
}
