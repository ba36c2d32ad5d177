// src/task/handler.rs

//! The task handler trait and the runner-side registry.
//!
//! A task crosses the process boundary as a name plus JSON state; the
//! runner resolves the name against its [`TaskRegistry`] and reconstructs
//! the concrete type there. Both sides must therefore link the same
//! handler types, which in practice means the launching application is
//! its own runner binary.

use std::collections::HashMap;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

use crate::task::TaskPayload;

/// A named background task with a timeout hook.
///
/// Implementors are plain serde types; their serialized state travels
/// inside the transport string, keyed by [`TaskHandler::NAME`].
pub trait TaskHandler: Serialize + DeserializeOwned + Send + 'static {
    /// Unique registry name, e.g. `"myapp.refresh_cache"`.
    const NAME: &'static str;

    /// Executes the task inside the spawned runner process.
    ///
    /// Result checking with the task issuer, if any, must happen in here;
    /// nothing is reported back to the launcher.
    fn execute(&self) -> anyhow::Result<()>;

    /// Called when the runner shuts down because the time limit was
    /// reached. There is no need to exit the process from this hook.
    fn handle_timeout(&self) {}
}

/// A bare task function: the transportable callable without a timeout hook.
pub type TaskFn = fn(Value) -> anyhow::Result<()>;

type ErasedFn = fn(Value) -> anyhow::Result<()>;

struct HandlerEntry {
    execute: ErasedFn,
    timeout: ErasedFn,
}

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("task '{0}' is already registered")]
    AlreadyRegistered(String),

    #[error("task '{0}' is not registered with this runner")]
    Unknown(String),
}

/// Registry of everything a runner process knows how to execute.
#[derive(Default)]
pub struct TaskRegistry {
    handlers: HashMap<&'static str, HandlerEntry>,
    funcs: HashMap<&'static str, TaskFn>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler type under [`TaskHandler::NAME`].
    pub fn register<H: TaskHandler>(&mut self) -> Result<(), RegistryError> {
        if self.handlers.contains_key(H::NAME) {
            return Err(RegistryError::AlreadyRegistered(H::NAME.to_string()));
        }
        self.handlers.insert(
            H::NAME,
            HandlerEntry {
                execute: |state| {
                    let handler: H = serde_json::from_value(state)?;
                    handler.execute()
                },
                timeout: |state| {
                    let handler: H = serde_json::from_value(state)?;
                    handler.handle_timeout();
                    Ok(())
                },
            },
        );
        Ok(())
    }

    /// Register a bare function under an explicit name.
    pub fn register_fn(&mut self, name: &'static str, f: TaskFn) -> Result<(), RegistryError> {
        if self.funcs.contains_key(name) {
            return Err(RegistryError::AlreadyRegistered(name.to_string()));
        }
        self.funcs.insert(name, f);
        Ok(())
    }

    /// Names of all registered handlers and functions.
    pub fn registered_names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self
            .handlers
            .keys()
            .chain(self.funcs.keys())
            .copied()
            .collect();
        names.sort_unstable();
        names
    }

    /// Resolve a decoded payload into something the guard can run.
    ///
    /// Unknown names fail here, before any task work starts.
    pub fn resolve(&self, payload: &TaskPayload) -> Result<RunnableTask, RegistryError> {
        match payload {
            TaskPayload::Func { name, args } => {
                let f = self
                    .funcs
                    .get(name.as_str())
                    .ok_or_else(|| RegistryError::Unknown(name.clone()))?;
                Ok(RunnableTask {
                    execute: *f,
                    timeout: None,
                    state: args.clone(),
                })
            }
            TaskPayload::Handler { name, state } => {
                let entry = self
                    .handlers
                    .get(name.as_str())
                    .ok_or_else(|| RegistryError::Unknown(name.clone()))?;
                Ok(RunnableTask {
                    execute: entry.execute,
                    timeout: Some(entry.timeout),
                    state: state.clone(),
                })
            }
        }
    }
}

/// A payload resolved against a registry, ready to run.
///
/// Cheap to clone: two fn pointers plus the JSON state.
#[derive(Clone)]
pub struct RunnableTask {
    execute: ErasedFn,
    timeout: Option<ErasedFn>,
    state: Value,
}

impl RunnableTask {
    /// Run the task body to completion.
    pub fn execute(&self) -> anyhow::Result<()> {
        (self.execute)(self.state.clone())
    }

    /// Whether this task carries a timeout hook (handler variant only).
    pub fn has_timeout_hook(&self) -> bool {
        self.timeout.is_some()
    }

    /// Fire the timeout hook, if any.
    pub fn fire_timeout_hook(&self) -> anyhow::Result<()> {
        match self.timeout {
            Some(hook) => (hook)(self.state.clone()),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Serialize, Deserialize)]
    struct Probe {
        value: i32,
    }

    impl TaskHandler for Probe {
        const NAME: &'static str = "test.probe";

        fn execute(&self) -> anyhow::Result<()> {
            if self.value < 0 {
                anyhow::bail!("negative probe");
            }
            Ok(())
        }
    }

    fn noop(_args: Value) -> anyhow::Result<()> {
        Ok(())
    }

    #[test]
    fn register_and_resolve_handler() {
        let mut registry = TaskRegistry::new();
        registry.register::<Probe>().unwrap();

        let payload = TaskPayload::Handler {
            name: Probe::NAME.to_string(),
            state: json!({ "value": 7 }),
        };
        let runnable = registry.resolve(&payload).unwrap();
        assert!(runnable.has_timeout_hook());
        assert!(runnable.execute().is_ok());
    }

    #[test]
    fn double_registration_is_rejected() {
        let mut registry = TaskRegistry::new();
        registry.register::<Probe>().unwrap();
        let result = registry.register::<Probe>();
        assert!(matches!(result, Err(RegistryError::AlreadyRegistered(_))));
    }

    #[test]
    fn unknown_name_is_rejected() {
        let registry = TaskRegistry::new();
        let payload = TaskPayload::Handler {
            name: "test.missing".to_string(),
            state: json!({}),
        };
        assert!(matches!(
            registry.resolve(&payload),
            Err(RegistryError::Unknown(_))
        ));
    }

    #[test]
    fn func_variant_has_no_timeout_hook() {
        let mut registry = TaskRegistry::new();
        registry.register_fn("test.noop", noop).unwrap();

        let payload = TaskPayload::Func {
            name: "test.noop".to_string(),
            args: json!(null),
        };
        let runnable = registry.resolve(&payload).unwrap();
        assert!(!runnable.has_timeout_hook());
        assert!(runnable.fire_timeout_hook().is_ok());
    }

    #[test]
    fn body_errors_propagate() {
        let mut registry = TaskRegistry::new();
        registry.register::<Probe>().unwrap();

        let payload = TaskPayload::Handler {
            name: Probe::NAME.to_string(),
            state: json!({ "value": -1 }),
        };
        let runnable = registry.resolve(&payload).unwrap();
        assert!(runnable.execute().is_err());
    }
}
