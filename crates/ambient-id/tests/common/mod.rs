//! Shared fixtures for provider tests

#![allow(dead_code)]

use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use ambient_id::{
    AmbientDetector, CommandFuture, CommandOutput, CommandRunner, DetectConfig, Detector,
    FixedEnvironment,
};

/// A subprocess invocation seen by [`RecordingRunner`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub timeout: Duration,
}

/// Returns a canned result and records every invocation
#[derive(Clone)]
pub struct RecordingRunner {
    result: Result<CommandOutput, io::ErrorKind>,
    calls: Arc<Mutex<Vec<RecordedCall>>>,
}

impl RecordingRunner {
    pub fn returning(output: CommandOutput) -> Self {
        Self {
            result: Ok(output),
            calls: Arc::default(),
        }
    }

    pub fn failing(kind: io::ErrorKind) -> Self {
        Self {
            result: Err(kind),
            calls: Arc::default(),
        }
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }
}

impl CommandRunner for RecordingRunner {
    fn run<'a>(
        &'a self,
        program: &'a Path,
        args: &'a [String],
        timeout: Duration,
    ) -> CommandFuture<'a> {
        self.calls.lock().unwrap().push(RecordedCall {
            program: program.to_path_buf(),
            args: args.to_vec(),
            timeout,
        });
        let result = self
            .result
            .clone()
            .map_err(|kind| io::Error::new(kind, "recorded failure"));
        Box::pin(async move { result })
    }
}

/// A detector running only `detector` against `env`
pub fn single(
    detector: impl Detector + 'static,
    env: FixedEnvironment,
    config: DetectConfig,
) -> AmbientDetector {
    AmbientDetector::with_config(config)
        .environment(env)
        .detectors(vec![Box::new(detector)])
}
