mod default_executor;
mod executor;
pub mod builtin;
pub mod fd;
pub mod pipeline;
pub mod redirect;
pub mod spawner;


pub use default_executor::{classify, DefaultExecutor, Dispatch};
pub use executor::{ExecError, ExecOutcome, ExecStatus, Executor};
pub use pipeline::Orchestrator;
pub use spawner::{ChildOutcome, ForkSpawner, ProcessHandle, Spawner};
