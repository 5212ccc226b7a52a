use std::io::{self, Write};
use log::debug;
use crate::ast::Stage;
use crate::environment::Environment;
use crate::executor::fd::{StageIo, StdioGuard};
use crate::executor::redirect;
use crate::executor::ExecOutcome;
use super::manager::BuiltinCommand;

/// Run `builtin` inside the shell process, honouring the stage's file
/// redirections.
///
/// The shell's stdin and stdout are saved first and put back afterwards
/// whatever the handler returned.
pub fn dispatch_builtin(builtin: &dyn BuiltinCommand, stage: &Stage, env: &mut Environment) -> ExecOutcome {
    let guard = match StdioGuard::save() {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("pipesh: dup: {}", e);
            return ExecOutcome::failure();
        }
    };

    debug!("running builtin '{}'", builtin.name());
    let outcome = run_redirected(builtin, stage, env);

    if let Err(e) = guard.restore() {
        eprintln!("pipesh: dup2: {}", e);
    }
    outcome
}

fn run_redirected(builtin: &dyn BuiltinCommand, stage: &Stage, env: &mut Environment) -> ExecOutcome {
    if let Err(e) = redirect::apply(StageIo::resolve(stage, None, None)) {
        eprintln!("pipesh: {}", e);
        return ExecOutcome::failure();
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let result = builtin
        .run(stage.argv(), env, &mut out)
        .and_then(|outcome| out.flush().map(|()| outcome));

    match result {
        Ok(outcome) => outcome,
        Err(e) => {
            eprintln!("pipesh: {}: {}", builtin.name(), e);
            ExecOutcome::failure()
        }
    }
}
