//! Wiring stages together with pipes and collecting their statuses.

use std::os::fd::OwnedFd;
use log::{debug, warn};
use crate::ast::Stage;
use crate::environment::Environment;
use super::executor::ExecError;
use super::fd::{Pipe, StageIo};
use super::spawner::{ChildOutcome, ProcessHandle, Spawner};

/// Runs a sequence of stages as one pipeline: one pipe per adjacent
/// pair, every stage spawned left to right, then every stage waited for.
///
/// A one-stage sequence is just "spawn, wait".
#[derive(Debug)]
pub struct Orchestrator<S: Spawner> {
    spawner: S,
    stray: Vec<ProcessHandle>,
}

impl<S: Spawner> Orchestrator<S> {
    pub fn new(spawner: S) -> Self {
        Orchestrator {
            spawner,
            stray: Vec::new(),
        }
    }

    pub fn spawner(&self) -> &S {
        &self.spawner
    }

    /// Children left behind by a pipeline that failed half-way.
    pub fn stray_count(&self) -> usize {
        self.stray.len()
    }

    /// Returns the outcome of the last stage.
    pub fn run(&mut self, stages: &[Stage], env: &Environment) -> Result<ChildOutcome, ExecError> {
        let mut handles = Vec::with_capacity(stages.len());

        if let Err(e) = self.spawn_all(stages, env, &mut handles) {
            if !handles.is_empty() {
                warn!("pipeline aborted, {} stage(s) left running: {}", handles.len(), e);
            }
            self.stray.append(&mut handles);
            return Err(e);
        }

        self.wait_all(handles)
    }

    fn spawn_all(
        &mut self,
        stages: &[Stage],
        env: &Environment,
        handles: &mut Vec<ProcessHandle>,
    ) -> Result<(), ExecError> {
        // Read end of the pipe feeding the next stage, owned here until
        // that stage has been spawned.
        let mut upstream: Option<OwnedFd> = None;
        let mut stages = stages.iter().peekable();

        while let Some(stage) = stages.next() {
            let (downstream, next_upstream) = match stages.peek() {
                Some(_) => {
                    let pipe = Pipe::open()?;
                    (Some(pipe.write), Some(pipe.read))
                }
                None => (None, None),
            };

            // Moving the ends into `io` means the parent's copies are
            // closed as soon as `spawn` returns.
            let io = StageIo::resolve(stage, upstream.take(), downstream);
            handles.push(self.spawner.spawn(stage, io, env)?);
            upstream = next_upstream;
        }
        Ok(())
    }

    fn wait_all(&mut self, handles: Vec<ProcessHandle>) -> Result<ChildOutcome, ExecError> {
        let mut last = Ok(ChildOutcome::Exited(0));
        for handle in handles {
            last = self.spawner.wait(handle);
            if let Err(e) = &last {
                warn!("{}", e);
            }
        }
        last
    }

    /// Collect any stray child that has finished, without blocking.
    pub fn reap_stray(&mut self) {
        for handle in std::mem::take(&mut self.stray) {
            match self.spawner.try_wait(handle) {
                Ok(Ok(outcome)) => debug!("reaped stray child: {:?}", outcome),
                Ok(Err(handle)) => self.stray.push(handle),
                Err(e) => warn!("{}", e),
            }
        }
    }
}
