use std::path::{Path, PathBuf};

/// One user-entered line split on `|`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CommandLine {
    pub stages: Vec<Stage>,
}

impl CommandLine {
    pub fn new(stages: Vec<Stage>) -> Self {
        CommandLine { stages }
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }
}

/// A single program invocation inside a pipeline.
///
/// `argv` always holds at least the program name. `input` and `output`
/// are file redirections requested by the user; when absent the stage
/// inherits whatever the executor wires up (a pipe end or the shell's
/// own stream).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stage {
    argv: Vec<String>,
    input: Option<PathBuf>,
    output: Option<PathBuf>,
}

impl Stage {
    pub fn new<S: Into<String>>(program: S, args: Vec<String>) -> Self {
        let mut argv = Vec::with_capacity(args.len() + 1);
        argv.push(program.into());
        argv.extend(args);
        Stage {
            argv,
            input: None,
            output: None,
        }
    }

    pub fn with_input<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.input = Some(path.into());
        self
    }

    pub fn with_output<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.output = Some(path.into());
        self
    }

    pub fn program(&self) -> &str {
        // argv is never empty, see `Stage::new`
        self.argv.first().map(String::as_str).unwrap_or_default()
    }

    pub fn argv(&self) -> &[String] {
        &self.argv
    }

    pub fn args(&self) -> &[String] {
        self.argv.get(1..).unwrap_or_default()
    }

    pub fn input_file(&self) -> Option<&Path> {
        self.input.as_deref()
    }

    pub fn output_file(&self) -> Option<&Path> {
        self.output.as_deref()
    }
}
