pub mod commands;
pub mod dispatch;
pub mod manager;

pub use dispatch::dispatch_builtin;
pub use manager::{BuiltinCommand, BuiltinManager};
