//! Recording audio output for tests

use std::sync::{Arc, Mutex};

use super::output::{AudioOutput, Completion, PlaybackError};

#[derive(Default)]
pub struct FakeLog {
    /// Resources passed to `start`, in order
    pub started: Vec<String>,
    /// Reporters of started attempts, drained by tests to simulate outcomes
    pub completions: Vec<Completion>,
    pub stops: usize,
    pub unlocks: usize,
    /// When set, `unlock` fails
    pub refuse_unlock: bool,
}

/// Output that records calls instead of playing anything
#[derive(Clone, Default)]
pub struct FakeOutput {
    pub log: Arc<Mutex<FakeLog>>,
}

impl FakeOutput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn started(&self) -> Vec<String> {
        self.log.lock().unwrap().started.clone()
    }

    /// Reporter of the most recent attempt
    pub fn take_last(&self) -> Completion {
        self.log
            .lock()
            .unwrap()
            .completions
            .pop()
            .expect("no playback was started")
    }

    pub fn stops(&self) -> usize {
        self.log.lock().unwrap().stops
    }
}

impl AudioOutput for FakeOutput {
    fn start(&mut self, resource: &str, completion: Completion) {
        let mut log = self.log.lock().unwrap();
        log.started.push(resource.to_string());
        log.completions.push(completion);
    }

    fn stop(&mut self) {
        self.log.lock().unwrap().stops += 1;
    }

    fn unlock(&mut self) -> Result<(), PlaybackError> {
        let mut log = self.log.lock().unwrap();
        log.unlocks += 1;
        if log.refuse_unlock {
            Err(PlaybackError::Blocked)
        } else {
            Ok(())
        }
    }
}
