use std::fs::File;
use std::io::{self, BufReader, IsTerminal};
use std::os::fd::AsFd;
use std::path::PathBuf;
use clap::Parser;
use pipesh::config::{Config, ConfigLoader};
use pipesh::environment::Environment;
use pipesh::error::ShellError;
use pipesh::executor::DefaultExecutor;
use pipesh::prompt::ShellPrompt;
use pipesh::repl::Shell;

#[derive(Debug, Parser)]
#[command(name = "pipesh", version, about = "A small shell for commands, pipes and redirections")]
struct Cli {
    /// Read settings from FILE instead of ~/.pipeshrc
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Run COMMAND and exit
    #[arg(short = 'c', value_name = "COMMAND")]
    command: Option<String>,
}

fn main() {
    let cli = Cli::parse();

    let config = match ConfigLoader::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("pipesh: {}", e);
            std::process::exit(2);
        }
    };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&config.log_filter)).init();
    log::debug!("config loaded: {:?}", config);

    let code = match run(cli, config) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("pipesh: {}", e);
            1
        }
    };
    std::process::exit(code);
}

fn run(cli: Cli, config: Config) -> Result<i32, ShellError> {
    let mut env = Environment::new();
    for (k, v) in &config.env_vars {
        env.set_exported(k, v);
    }
    let executor = DefaultExecutor::new()?;

    match cli.command {
        Some(command) => Shell::new(executor, env, ShellPrompt::disabled()).run(command.as_bytes()),
        None => {
            let prompt = ShellPrompt::new(&config.prompt, io::stdin().is_terminal());
            Shell::new(executor, env, prompt).run(unbuffered_stdin()?)
        }
    }
}

/// Reads fd 0 one byte at a time. Commands inherit the same descriptor,
/// so the shell must not consume input past the end of the current line.
fn unbuffered_stdin() -> io::Result<BufReader<File>> {
    let fd = io::stdin().as_fd().try_clone_to_owned()?;
    Ok(BufReader::with_capacity(1, File::from(fd)))
}
