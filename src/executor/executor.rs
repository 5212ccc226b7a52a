use thiserror::Error;
use crate::ast::CommandLine;
use crate::environment::Environment;

pub type ExecStatus = Result<ExecOutcome, ExecError>;

/// Result of dispatching one command line.
///
/// `Exit` is the single reserved value that stops the command loop;
/// `None` means "exit with the status of the previous command".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecOutcome {
    Code(i32),
    Exit(Option<i32>),
}

impl ExecOutcome {
    pub fn success() -> Self {
        ExecOutcome::Code(0)
    }

    pub fn failure() -> Self {
        ExecOutcome::Code(1)
    }
}

#[derive(Debug, Error)]
pub enum ExecError {
    #[error("fork: {0}")]
    Fork(#[source] nix::Error),
    #[error("pipe: {0}")]
    Pipe(#[source] nix::Error),
    #[error("waitpid {pid}: {source}")]
    Wait {
        pid: i32,
        #[source]
        source: nix::Error,
    },
    #[error("{0}: argument contains a NUL byte")]
    InvalidArgument(String),
    #[error("builtin '{0}' is registered twice")]
    DuplicateBuiltin(String),
}

impl ExecError {
    /// The shell cannot continue without the ability to create processes.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ExecError::Fork(_))
    }
}

pub trait Executor {
    fn exec(&mut self, line: &CommandLine, env: &mut Environment) -> ExecStatus;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Stage;
    use nix::errno::Errno;

    struct TestExecutor {
        pub log: Vec<String>,
    }

    impl Executor for TestExecutor {
        fn exec(&mut self, line: &CommandLine, _env: &mut Environment) -> ExecStatus {
            for stage in &line.stages {
                self.log.push(format!("command: {} {:?}", stage.program(), stage.args()));
            }
            Ok(ExecOutcome::success())
        }
    }

    #[test]
    fn test_executor_trait_object() {
        let line = CommandLine::new(vec![
            Stage::new("ls", vec![]),
            Stage::new("wc", vec!["-l".to_string()]),
        ]);
        let mut exec = TestExecutor { log: vec![] };
        let executor: &mut dyn Executor = &mut exec;
        let result = executor.exec(&line, &mut Environment::empty());
        assert!(matches!(result, Ok(ExecOutcome::Code(0))));
        assert_eq!(exec.log, vec!["command: ls []", "command: wc [\"-l\"]"]);
    }

    #[test]
    fn test_only_fork_failure_is_fatal() {
        assert!(ExecError::Fork(Errno::EAGAIN).is_fatal());
        assert!(!ExecError::Pipe(Errno::EMFILE).is_fatal());
        assert!(!ExecError::InvalidArgument("echo".into()).is_fatal());
        assert!(!ExecError::Wait { pid: 1, source: Errno::ECHILD }.is_fatal());
    }

    #[test]
    fn test_error_messages_name_the_operation() {
        assert!(ExecError::Fork(Errno::EAGAIN).to_string().starts_with("fork: "));
        assert!(ExecError::Pipe(Errno::EMFILE).to_string().starts_with("pipe: "));
    }
}
