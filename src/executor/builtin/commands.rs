use std::io::{self, Write};
use std::path::PathBuf;
use crate::environment::Environment;
use crate::executor::ExecOutcome;
use super::manager::BuiltinCommand;

const USAGE: &[(&str, &str)] = &[
    ("cd [DIR]", "Change directory"),
    ("pwd", "Print the working directory"),
    ("echo [-n] [ARG...]", "Print arguments"),
    ("env", "List exported variables"),
    ("export NAME[=VALUE]...", "Export variables"),
    ("unset NAME...", "Remove variables"),
    ("help", "Show this help"),
    ("exit [N]", "Exit shell"),
];

fn args(argv: &[String]) -> &[String] {
    argv.get(1..).unwrap_or_default()
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

pub struct HelpCommand;

impl BuiltinCommand for HelpCommand {
    fn name(&self) -> &'static str {
        "help"
    }
    fn run(&self, _argv: &[String], _env: &mut Environment, out: &mut dyn Write) -> io::Result<ExecOutcome> {
        writeln!(out, "Available built-in commands:")?;
        for (usage, summary) in USAGE {
            writeln!(out, "  {:<24}: {}", usage, summary)?;
        }
        Ok(ExecOutcome::success())
    }
}

pub struct CdCommand;

impl BuiltinCommand for CdCommand {
    fn name(&self) -> &'static str {
        "cd"
    }
    fn run(&self, argv: &[String], env: &mut Environment, _out: &mut dyn Write) -> io::Result<ExecOutcome> {
        let target = match args(argv) {
            [] => PathBuf::from(env.get("HOME").unwrap_or("/")),
            [dir] => PathBuf::from(dir),
            _ => {
                eprintln!("cd: too many arguments");
                return Ok(ExecOutcome::failure());
            }
        };
        if let Err(e) = std::env::set_current_dir(&target) {
            eprintln!("cd: {}: {}", target.display(), e);
            return Ok(ExecOutcome::failure());
        }
        if let Ok(cwd) = std::env::current_dir() {
            env.set_exported("PWD", &cwd.to_string_lossy());
        }
        Ok(ExecOutcome::success())
    }
}

pub struct PwdCommand;

impl BuiltinCommand for PwdCommand {
    fn name(&self) -> &'static str {
        "pwd"
    }
    fn run(&self, _argv: &[String], _env: &mut Environment, out: &mut dyn Write) -> io::Result<ExecOutcome> {
        match std::env::current_dir() {
            Ok(dir) => {
                writeln!(out, "{}", dir.display())?;
                Ok(ExecOutcome::success())
            }
            Err(e) => {
                eprintln!("pwd: {}", e);
                Ok(ExecOutcome::failure())
            }
        }
    }
}

pub struct EchoCommand;

impl BuiltinCommand for EchoCommand {
    fn name(&self) -> &'static str {
        "echo"
    }
    fn run(&self, argv: &[String], _env: &mut Environment, out: &mut dyn Write) -> io::Result<ExecOutcome> {
        let (newline, words) = match args(argv) {
            [flag, rest @ ..] if flag == "-n" => (false, rest),
            all => (true, all),
        };
        write!(out, "{}", words.join(" "))?;
        if newline {
            writeln!(out)?;
        }
        Ok(ExecOutcome::success())
    }
}

pub struct EnvCommand;

impl BuiltinCommand for EnvCommand {
    fn name(&self) -> &'static str {
        "env"
    }
    fn run(&self, _argv: &[String], env: &mut Environment, out: &mut dyn Write) -> io::Result<ExecOutcome> {
        for (k, v) in env.exported_vars() {
            writeln!(out, "{}={}", k, v)?;
        }
        Ok(ExecOutcome::success())
    }
}

pub struct ExportCommand;

impl BuiltinCommand for ExportCommand {
    fn name(&self) -> &'static str {
        "export"
    }
    fn run(&self, argv: &[String], env: &mut Environment, out: &mut dyn Write) -> io::Result<ExecOutcome> {
        let args = args(argv);
        if args.is_empty() {
            for (k, v) in env.exported_vars() {
                writeln!(out, "export {}={}", k, v)?;
            }
            return Ok(ExecOutcome::success());
        }

        let mut status = 0;
        for arg in args {
            let (name, value) = match arg.split_once('=') {
                Some((name, value)) => (name, Some(value)),
                None => (arg.as_str(), None),
            };
            if !is_identifier(name) {
                eprintln!("export: `{}': not a valid identifier", arg);
                status = 1;
                continue;
            }
            match value {
                Some(value) => env.set_exported(name, value),
                None => {
                    if !env.export(name) {
                        env.set_exported(name, "");
                    }
                }
            }
        }
        Ok(ExecOutcome::Code(status))
    }
}

pub struct UnsetCommand;

impl BuiltinCommand for UnsetCommand {
    fn name(&self) -> &'static str {
        "unset"
    }
    fn run(&self, argv: &[String], env: &mut Environment, _out: &mut dyn Write) -> io::Result<ExecOutcome> {
        for name in args(argv) {
            env.unset(name);
        }
        Ok(ExecOutcome::success())
    }
}

pub struct ExitCommand;

impl BuiltinCommand for ExitCommand {
    fn name(&self) -> &'static str {
        "exit"
    }
    fn run(&self, argv: &[String], _env: &mut Environment, _out: &mut dyn Write) -> io::Result<ExecOutcome> {
        match args(argv) {
            [] => Ok(ExecOutcome::Exit(None)),
            [code] => match code.parse::<i32>() {
                Ok(code) => Ok(ExecOutcome::Exit(Some(code))),
                Err(_) => {
                    eprintln!("exit: {}: numeric argument required", code);
                    Ok(ExecOutcome::Code(2))
                }
            },
            _ => {
                eprintln!("exit: too many arguments");
                Ok(ExecOutcome::failure())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(cmd: &dyn BuiltinCommand, argv: &[&str], env: &mut Environment) -> (ExecOutcome, String) {
        let argv: Vec<String> = argv.iter().map(|s| s.to_string()).collect();
        let mut out = Vec::new();
        let outcome = cmd.run(&argv, env, &mut out).unwrap();
        (outcome, String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_echo() {
        let mut env = Environment::empty();
        assert_eq!(
            run(&EchoCommand, &["echo", "a", "b c"], &mut env),
            (ExecOutcome::Code(0), "a b c\n".to_string())
        );
        assert_eq!(run(&EchoCommand, &["echo", "-n", "x"], &mut env).1, "x");
        assert_eq!(run(&EchoCommand, &["echo"], &mut env).1, "\n");
    }

    #[test]
    fn test_env_lists_exported_only() {
        let mut env = Environment::empty();
        env.set_exported("B", "2");
        env.set_exported("A", "1");
        env.set("HIDDEN", "x");
        assert_eq!(run(&EnvCommand, &["env"], &mut env).1, "A=1\nB=2\n");
    }

    #[test]
    fn test_export_and_unset() {
        let mut env = Environment::empty();
        let (outcome, _) = run(&ExportCommand, &["export", "FOO=bar", "EMPTY"], &mut env);
        assert_eq!(outcome, ExecOutcome::Code(0));
        assert_eq!(
            env.exported_vars(),
            vec![
                ("EMPTY".to_string(), String::new()),
                ("FOO".to_string(), "bar".to_string()),
            ]
        );
        assert_eq!(run(&ExportCommand, &["export"], &mut env).1, "export EMPTY=\nexport FOO=bar\n");

        run(&UnsetCommand, &["unset", "FOO"], &mut env);
        assert_eq!(env.get("FOO"), None);
    }

    #[test]
    fn test_export_rejects_bad_identifier() {
        let mut env = Environment::empty();
        let (outcome, _) = run(&ExportCommand, &["export", "1X=y", "OK=1"], &mut env);
        assert_eq!(outcome, ExecOutcome::Code(1));
        assert_eq!(env.get("OK"), Some("1"));
        assert_eq!(env.get("1X"), None);
    }

    #[test]
    fn test_exit_outcomes() {
        let mut env = Environment::empty();
        assert_eq!(run(&ExitCommand, &["exit"], &mut env).0, ExecOutcome::Exit(None));
        assert_eq!(run(&ExitCommand, &["exit", "3"], &mut env).0, ExecOutcome::Exit(Some(3)));
        assert_eq!(run(&ExitCommand, &["exit", "abc"], &mut env).0, ExecOutcome::Code(2));
        assert_eq!(run(&ExitCommand, &["exit", "1", "2"], &mut env).0, ExecOutcome::Code(1));
    }

    #[test]
    fn test_cd_usage_errors_do_not_move() {
        let mut env = Environment::empty();
        let before = std::env::current_dir().unwrap();
        assert_eq!(run(&CdCommand, &["cd", "a", "b"], &mut env).0, ExecOutcome::Code(1));
        assert_eq!(
            run(&CdCommand, &["cd", "/definitely/not/a/dir"], &mut env).0,
            ExecOutcome::Code(1)
        );
        assert_eq!(std::env::current_dir().unwrap(), before);
    }

    #[test]
    fn test_pwd_prints_current_dir() {
        let mut env = Environment::empty();
        let (outcome, out) = run(&PwdCommand, &["pwd"], &mut env);
        assert_eq!(outcome, ExecOutcome::success());
        assert_eq!(out, format!("{}\n", std::env::current_dir().unwrap().display()));
    }

    #[test]
    fn test_help_lists_every_builtin() {
        let mut env = Environment::empty();
        let out = run(&HelpCommand, &["help"], &mut env).1;
        for name in ["cd", "pwd", "echo", "env", "export", "unset", "help", "exit"] {
            assert!(out.contains(&format!("  {}", name)), "missing {name}");
        }
    }

    #[test]
    fn test_identifier_rules() {
        assert!(is_identifier("_x1"));
        assert!(!is_identifier(""));
        assert!(!is_identifier("a-b"));
    }
}
