use std::slice;
use crate::ast::{CommandLine, Stage};
use crate::environment::Environment;
use super::builtin::{dispatch_builtin, BuiltinCommand, BuiltinManager};
use super::executor::{ExecError, ExecOutcome, ExecStatus, Executor};
use super::pipeline::Orchestrator;
use super::spawner::{ForkSpawner, Spawner};

/// How a parsed command line will be run.
pub enum Dispatch<'a> {
    /// A lone stage naming a built-in: runs in the shell process.
    Builtin(&'a dyn BuiltinCommand, &'a Stage),
    /// A lone stage naming anything else: one child, no pipes.
    External(&'a Stage),
    /// Two or more stages. Built-in names are run as external programs here.
    Pipeline(&'a [Stage]),
}

pub fn classify<'a>(line: &'a CommandLine, builtins: &'a BuiltinManager) -> Option<Dispatch<'a>> {
    match line.stages.as_slice() {
        [] => None,
        [stage] => Some(match builtins.get(stage.program()) {
            Some(builtin) => Dispatch::Builtin(builtin, stage),
            None => Dispatch::External(stage),
        }),
        stages => Some(Dispatch::Pipeline(stages)),
    }
}

pub struct DefaultExecutor<S: Spawner = ForkSpawner> {
    orchestrator: Orchestrator<S>,
    builtins: BuiltinManager,
}

impl DefaultExecutor<ForkSpawner> {
    pub fn new() -> Result<Self, ExecError> {
        DefaultExecutor::with_spawner(ForkSpawner::new())
    }
}

impl<S: Spawner> DefaultExecutor<S> {
    pub fn with_spawner(spawner: S) -> Result<Self, ExecError> {
        Ok(DefaultExecutor::with_parts(spawner, BuiltinManager::with_defaults()?))
    }

    pub fn with_parts(spawner: S, builtins: BuiltinManager) -> Self {
        DefaultExecutor {
            orchestrator: Orchestrator::new(spawner),
            builtins,
        }
    }

    pub fn builtins(&self) -> &BuiltinManager {
        &self.builtins
    }

    pub fn orchestrator(&self) -> &Orchestrator<S> {
        &self.orchestrator
    }
}

impl<S: Spawner> Executor for DefaultExecutor<S> {
    fn exec(&mut self, line: &CommandLine, env: &mut Environment) -> ExecStatus {
        self.orchestrator.reap_stray();

        let stages = match classify(line, &self.builtins) {
            None => return Ok(ExecOutcome::success()),
            Some(Dispatch::Builtin(builtin, stage)) => return Ok(dispatch_builtin(builtin, stage, env)),
            Some(Dispatch::External(stage)) => slice::from_ref(stage),
            Some(Dispatch::Pipeline(stages)) => stages,
        };

        let outcome = self.orchestrator.run(stages, env)?;
        Ok(ExecOutcome::Code(outcome.code()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::spawner::ChildOutcome;
    use crate::executor::tests::FakeSpawner;
    use crate::lexer::Lexer;
    use crate::parser::{DefaultParser, Parser};

    fn parse(src: &str) -> CommandLine {
        let tokens = Lexer::tokenize_all(src).unwrap();
        DefaultParser::new(&tokens).parse().unwrap()
    }

    fn executor() -> DefaultExecutor<FakeSpawner> {
        DefaultExecutor::with_spawner(FakeSpawner::new()).unwrap()
    }

    #[test]
    fn test_classify() {
        let builtins = BuiltinManager::with_defaults().unwrap();
        assert!(classify(&parse(""), &builtins).is_none());
        assert!(matches!(classify(&parse("cd /tmp"), &builtins), Some(Dispatch::Builtin(b, _)) if b.name() == "cd"));
        assert!(matches!(classify(&parse("ls -l"), &builtins), Some(Dispatch::External(s)) if s.program() == "ls"));
        assert!(matches!(classify(&parse("echo hi | cd"), &builtins), Some(Dispatch::Pipeline(s)) if s.len() == 2));
    }

    #[test]
    fn test_builtin_runs_without_spawning() {
        let mut exec = executor();
        let mut env = Environment::empty();
        let outcome = exec.exec(&parse("export GREETING=hi"), &mut env).unwrap();
        assert_eq!(outcome, ExecOutcome::Code(0));
        assert_eq!(env.get("GREETING"), Some("hi"));
        assert!(exec.orchestrator().spawner().spawned.is_empty());
    }

    #[test]
    fn test_exit_builtin_returns_reserved_outcome() {
        let mut exec = executor();
        let outcome = exec.exec(&parse("exit 7"), &mut Environment::empty()).unwrap();
        assert_eq!(outcome, ExecOutcome::Exit(Some(7)));
    }

    #[test]
    fn test_single_external_spawns_once() {
        let mut spawner = FakeSpawner::new();
        spawner.script("grep", ChildOutcome::Exited(1));
        let mut exec = DefaultExecutor::with_spawner(spawner).unwrap();
        let outcome = exec.exec(&parse("grep foo < in.txt"), &mut Environment::empty()).unwrap();
        assert_eq!(outcome, ExecOutcome::Code(1));
        let spawned = &exec.orchestrator().spawner().spawned;
        assert_eq!(spawned.len(), 1);
        assert_eq!(spawned[0].argv, vec!["grep".to_string(), "foo".to_string()]);
    }

    #[test]
    fn test_builtin_name_inside_pipeline_is_spawned() {
        let mut exec = executor();
        exec.exec(&parse("echo hi | tr a-z A-Z"), &mut Environment::empty()).unwrap();
        let spawned = &exec.orchestrator().spawner().spawned;
        assert_eq!(spawned.len(), 2);
        assert_eq!(spawned[0].argv[0], "echo");
    }

    #[test]
    fn test_signaled_stage_maps_to_shell_status() {
        let mut spawner = FakeSpawner::new();
        spawner.script("yes", ChildOutcome::Signaled(13));
        let mut exec = DefaultExecutor::with_spawner(spawner).unwrap();
        let outcome = exec.exec(&parse("yes"), &mut Environment::empty()).unwrap();
        assert_eq!(outcome, ExecOutcome::Code(141));
    }

    #[test]
    fn test_fork_failure_propagates() {
        let mut spawner = FakeSpawner::new();
        spawner.fail_spawn_of = Some("ls".to_string());
        let mut exec = DefaultExecutor::with_spawner(spawner).unwrap();
        let err = exec.exec(&parse("ls"), &mut Environment::empty()).unwrap_err();
        assert!(err.is_fatal());
    }
}
