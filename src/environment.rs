use std::collections::HashMap;
use std::ffi::{CString, NulError};

#[derive(Debug, Clone, PartialEq)]
struct Variable {
    value: String,
    exported: bool,
}

/// Shell variables. Exported ones form the environment of every
/// external stage.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Environment {
    vars: HashMap<String, Variable>,
}

impl Environment {
    pub fn new() -> Self {
        let mut env = Environment::empty();

        // Import all OS environment variables when starting the process (default value)
        for (k, v) in std::env::vars() {
            env.vars.insert(
                k,
                Variable {
                    value: v,
                    exported: true,
                },
            );
        }

        env
    }

    pub fn empty() -> Self {
        Environment {
            vars: HashMap::new(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(|v| v.value.as_str())
    }

    pub fn set(&mut self, key: &str, value: &str) {
        self.vars
            .entry(key.to_string())
            .and_modify(|var| var.value = value.to_string())
            .or_insert(Variable {
                value: value.to_string(),
                exported: false,
            });
    }

    pub fn set_exported(&mut self, key: &str, value: &str) {
        self.set(key, value);
        self.export(key);
    }

    pub fn unset(&mut self, key: &str) {
        self.vars.remove(key);
    }

    /// Marks `key` as exported. Returns false when the variable is unknown.
    pub fn export(&mut self, key: &str) -> bool {
        match self.vars.get_mut(key) {
            Some(var) => {
                var.exported = true;
                true
            }
            None => false,
        }
    }

    pub fn exported_vars(&self) -> Vec<(String, String)> {
        let mut vars: Vec<_> = self
            .vars
            .iter()
            .filter(|(_, v)| v.exported)
            .map(|(k, v)| (k.clone(), v.value.clone()))
            .collect();
        vars.sort();
        vars
    }

    /// `NAME=value` strings for `execve`-style calls.
    pub fn envp(&self) -> Result<Vec<CString>, NulError> {
        self.exported_vars()
            .into_iter()
            .map(|(k, v)| CString::new(format!("{k}={v}")))
            .collect()
    }
}
