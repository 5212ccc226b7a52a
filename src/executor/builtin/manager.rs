use std::collections::HashMap;
use std::io::{self, Write};
use log::trace;
use crate::environment::Environment;
use crate::executor::{ExecError, ExecOutcome};
use super::commands::{
    CdCommand,
    EchoCommand,
    EnvCommand,
    ExitCommand,
    ExportCommand,
    HelpCommand,
    PwdCommand,
    UnsetCommand,
};

/// A command run inside the shell process.
///
/// `argv[0]` is the command name. Output goes to `out`, which is the
/// shell's stdout after any redirection has been applied. Usage errors
/// are reported on stderr by the handler and returned as a non-zero
/// `ExecOutcome::Code`.
pub trait BuiltinCommand {
    fn name(&self) -> &'static str;
    fn run(&self, argv: &[String], env: &mut Environment, out: &mut dyn Write) -> io::Result<ExecOutcome>;
}

pub struct BuiltinManager {
    commands: HashMap<&'static str, Box<dyn BuiltinCommand>>,
}

impl BuiltinManager {
    pub fn new() -> Self {
        BuiltinManager {
            commands: HashMap::new(),
        }
    }

    /// The fixed registry the shell starts with.
    pub fn with_defaults() -> Result<Self, ExecError> {
        let mut mgr = BuiltinManager::new();
        mgr.register(Box::new(CdCommand))?;
        mgr.register(Box::new(PwdCommand))?;
        mgr.register(Box::new(EchoCommand))?;
        mgr.register(Box::new(EnvCommand))?;
        mgr.register(Box::new(ExportCommand))?;
        mgr.register(Box::new(UnsetCommand))?;
        mgr.register(Box::new(HelpCommand))?;
        mgr.register(Box::new(ExitCommand))?;
        Ok(mgr)
    }

    pub fn register(&mut self, cmd: Box<dyn BuiltinCommand>) -> Result<(), ExecError> {
        let name = cmd.name();
        if self.commands.contains_key(name) {
            return Err(ExecError::DuplicateBuiltin(name.to_string()));
        }
        trace!("registered builtin '{}'", name);
        self.commands.insert(name, cmd);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&dyn BuiltinCommand> {
        self.commands.get(name).map(|cmd| cmd.as_ref())
    }

    pub fn is_builtin(&self, name: &str) -> bool {
        self.commands.contains_key(name)
    }

    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.commands.keys().copied().collect();
        names.sort_unstable();
        names
    }
}

impl Default for BuiltinManager {
    fn default() -> Self {
        BuiltinManager::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_registry() {
        let mgr = BuiltinManager::with_defaults().unwrap();
        assert_eq!(
            mgr.names(),
            vec!["cd", "echo", "env", "exit", "export", "help", "pwd", "unset"]
        );
        assert!(mgr.is_builtin("exit"));
        assert!(!mgr.is_builtin("ls"));
        assert_eq!(mgr.get("pwd").map(|b| b.name()), Some("pwd"));
    }

    #[test]
    fn test_duplicate_registration_is_rejected() {
        let mut mgr = BuiltinManager::new();
        mgr.register(Box::new(PwdCommand)).unwrap();
        let err = mgr.register(Box::new(PwdCommand)).unwrap_err();
        assert!(matches!(err, ExecError::DuplicateBuiltin(ref n) if n == "pwd"));
    }
}
