//! State policy: backend state → continue / success / failure.
//!
//! The stock mapping treats Done as success and Failed, Cancelled and
//! Updated as failure. Any entry can be overridden from the `[policy]`
//! config table, e.g. `Updated = "success"` or `Drained = "success"`.

use std::collections::BTreeMap;

use launch_protocol::{Disposition, InvalidDisposition, JobState};
use serde_json::Value;

/// Policy errors
#[derive(Debug, thiserror::Error)]
pub enum PolicyError {
    #[error("policy.{state}: {source}")]
    InvalidDisposition {
        state: String,
        #[source]
        source: InvalidDisposition,
    },

    #[error("policy.{0} must be a string")]
    NotAString(String),

    #[error("policy must be a table")]
    NotATable,
}

/// Case-insensitive key that also matches the backend's prefixed spelling
/// of unrecognized states.
fn policy_key(state: &JobState) -> String {
    let upper = state.name().to_ascii_uppercase();
    match upper.strip_prefix("JOB_STATE_") {
        Some(bare) => bare.to_string(),
        None => upper,
    }
}

/// Mapping from job state to poll-loop disposition
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatePolicy {
    /// Overrides keyed by [`policy_key`]
    overrides: BTreeMap<String, Disposition>,
}

impl StatePolicy {
    /// Stock policy with no overrides.
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the disposition for one state.
    pub fn with_override(mut self, state: &JobState, disposition: Disposition) -> Self {
        self.overrides.insert(policy_key(state), disposition);
        self
    }

    /// Build from the `[policy]` table. `null` or a missing table yields
    /// the stock policy.
    pub fn from_value(value: Option<&Value>) -> Result<Self, PolicyError> {
        let table = match value {
            None | Some(Value::Null) => return Ok(Self::default()),
            Some(Value::Object(table)) => table,
            Some(_) => return Err(PolicyError::NotATable),
        };

        let mut policy = Self::default();
        for (key, raw) in table {
            let text = raw
                .as_str()
                .ok_or_else(|| PolicyError::NotAString(key.clone()))?;
            let disposition = text
                .parse::<Disposition>()
                .map_err(|source| PolicyError::InvalidDisposition {
                    state: key.clone(),
                    source,
                })?;
            policy = policy.with_override(&JobState::parse(key), disposition);
        }
        Ok(policy)
    }

    /// Disposition for an observed state.
    pub fn disposition(&self, state: &JobState) -> Disposition {
        self.overrides
            .get(&policy_key(state))
            .copied()
            .unwrap_or_else(|| state.default_disposition())
    }

    pub fn is_terminal(&self, state: &JobState) -> bool {
        self.disposition(state).is_terminal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use launch_protocol::KNOWN_STATES;
    use serde_json::json;

    #[test]
    fn test_stock_policy_matches_default_terminal_set() {
        let policy = StatePolicy::new();
        for state in KNOWN_STATES.iter() {
            assert_eq!(policy.is_terminal(state), state.is_terminal_by_default(), "{}", state);
        }
        assert!(!policy.is_terminal(&JobState::Unknown));
        assert!(!policy.is_terminal(&JobState::parse("Drained")));
    }

    #[test]
    fn test_override_updated_as_success() {
        let policy = StatePolicy::from_value(Some(&json!({"Updated": "success"}))).unwrap();
        assert_eq!(policy.disposition(&JobState::Updated), Disposition::Success);
        assert_eq!(policy.disposition(&JobState::Failed), Disposition::Failure);
    }

    #[test]
    fn test_override_keys_accept_backend_spelling() {
        let policy = StatePolicy::from_value(Some(&json!({
            "JOB_STATE_STOPPED": "failure",
            "drained": "success"
        })))
        .unwrap();
        assert_eq!(policy.disposition(&JobState::Stopped), Disposition::Failure);
        assert_eq!(
            policy.disposition(&JobState::parse("JOB_STATE_DRAINED")),
            Disposition::Success
        );
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = StatePolicy::from_value(Some(&json!({"Done": "maybe"}))).unwrap_err();
        assert!(err.to_string().contains("policy.Done"));

        assert!(matches!(
            StatePolicy::from_value(Some(&json!({"Done": 1}))),
            Err(PolicyError::NotAString(_))
        ));
        assert!(matches!(
            StatePolicy::from_value(Some(&json!(["Done"]))),
            Err(PolicyError::NotATable)
        ));
    }

    #[test]
    fn test_missing_table_is_stock() {
        assert_eq!(StatePolicy::from_value(None).unwrap(), StatePolicy::new());
        assert_eq!(StatePolicy::from_value(Some(&Value::Null)).unwrap(), StatePolicy::new());
    }
}
