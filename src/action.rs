use std::fmt::{self, Display};

use thiserror::Error;

use crate::config::EngineConfig;
use crate::event::Event;
use crate::value::Scalar;

/// How `SetField` treats an existing value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetMode {
    /// `add!`: assign, replacing any existing value
    Overwrite,
    /// `add`: assign only if the field is absent
    IfAbsent,
    /// `update`: assign only if the field is present
    IfPresent,
}

/// Command run when a rule's expression matches
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Keep,
    Drop,
    SetField {
        key: String,
        value: Scalar,
        mode: SetMode,
    },
    RemoveField {
        key: String,
    },
}

/// What the rule chain does after an action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Continue,
    Keep,
    Drop,
}

impl Step {
    pub fn halts(&self) -> bool {
        !matches!(self, Step::Continue)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActionError {
    #[error("field '{key}' is protected and cannot be modified")]
    ProtectedField { key: String },
}

impl Action {
    pub fn set(key: impl Into<String>, value: impl Into<Scalar>) -> Self {
        Self::SetField {
            key: key.into(),
            value: value.into(),
            mode: SetMode::Overwrite,
        }
    }

    pub fn add(key: impl Into<String>, value: impl Into<Scalar>) -> Self {
        Self::SetField {
            key: key.into(),
            value: value.into(),
            mode: SetMode::IfAbsent,
        }
    }

    pub fn update(key: impl Into<String>, value: impl Into<Scalar>) -> Self {
        Self::SetField {
            key: key.into(),
            value: value.into(),
            mode: SetMode::IfPresent,
        }
    }

    pub fn remove(key: impl Into<String>) -> Self {
        Self::RemoveField { key: key.into() }
    }

    /// Apply this action to `event` in place.
    ///
    /// A failed action leaves the event untouched.
    pub fn apply(&self, event: &mut Event, config: &EngineConfig) -> Result<Step, ActionError> {
        match self {
            Action::Keep => Ok(Step::Keep),
            Action::Drop => Ok(Step::Drop),
            Action::SetField { key, value, mode } => {
                check_writable(key, config)?;
                let present = event.contains_key(key);
                let write = match mode {
                    SetMode::Overwrite => true,
                    SetMode::IfAbsent => !present,
                    SetMode::IfPresent => present,
                };
                if write {
                    event.insert(key.clone(), value.clone());
                }
                Ok(Step::Continue)
            }
            Action::RemoveField { key } => {
                check_writable(key, config)?;
                event.remove(key);
                Ok(Step::Continue)
            }
        }
    }
}

fn check_writable(key: &str, config: &EngineConfig) -> Result<(), ActionError> {
    if config.is_protected(key) {
        return Err(ActionError::ProtectedField {
            key: key.to_string(),
        });
    }
    Ok(())
}

impl Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Keep => write!(f, "keep"),
            Action::Drop => write!(f, "drop"),
            Action::SetField { key, value, mode } => {
                let keyword = match mode {
                    SetMode::Overwrite => "add!",
                    SetMode::IfAbsent => "add",
                    SetMode::IfPresent => "update",
                };
                write!(f, "{} {} = {}", keyword, key, value)
            }
            Action::RemoveField { key } => write!(f, "remove {}", key),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event() -> Event {
        [("a", Scalar::from("1"))].into_iter().collect()
    }

    #[test]
    fn test_halting_actions() {
        let config = EngineConfig::default();
        let mut e = event();
        assert_eq!(Action::Keep.apply(&mut e, &config), Ok(Step::Keep));
        assert_eq!(Action::Drop.apply(&mut e, &config), Ok(Step::Drop));
        assert_eq!(e, event());
    }

    #[test]
    fn test_set_modes() {
        let config = EngineConfig::default();

        let mut e = event();
        assert_eq!(Action::add("a", "2").apply(&mut e, &config), Ok(Step::Continue));
        assert_eq!(e.get("a"), Some(&Scalar::from("1")));
        Action::add("b", "2").apply(&mut e, &config).unwrap();
        assert_eq!(e.get("b"), Some(&Scalar::from("2")));

        Action::set("a", 3).apply(&mut e, &config).unwrap();
        assert_eq!(e.get("a"), Some(&Scalar::from(3)));

        Action::update("c", "x").apply(&mut e, &config).unwrap();
        assert!(!e.contains_key("c"));
        Action::update("b", "x").apply(&mut e, &config).unwrap();
        assert_eq!(e.get("b"), Some(&Scalar::from("x")));
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let config = EngineConfig::default();
        let mut e = event();
        assert_eq!(Action::remove("zzz").apply(&mut e, &config), Ok(Step::Continue));
        assert_eq!(e, event());
        Action::remove("a").apply(&mut e, &config).unwrap();
        assert!(e.is_empty());
    }

    #[test]
    fn test_protected_field() {
        let config = EngineConfig::default().protect(["a"]);
        let mut e = event();
        assert_eq!(
            Action::remove("a").apply(&mut e, &config),
            Err(ActionError::ProtectedField { key: "a".to_string() })
        );
        assert!(Action::set("a", "x").apply(&mut e, &config).is_err());
        assert_eq!(e, event());
    }
}
