use crate::core::{TrapNotification, TrapSender};
use crate::transport::SendError;
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

/// Builds the error a failed transport run would produce, for scripting
/// fakes without a real subprocess.
pub fn command_failed(stderr: &str) -> SendError {
    SendError::CommandFailed {
        program: "snmptrap".to_string(),
        status: "exit status: 1".to_string(),
        stderr: stderr.to_string(),
    }
}

/// Fake trap sender for testing
pub struct FakeTrapSender {
    // Every notification handed to send(), in order, successful or not.
    sent: Arc<Mutex<Vec<TrapNotification>>>,
    // A queue of scripted failures per destination. The front of the queue
    // is the next result; an empty queue means success.
    failures: Arc<Mutex<HashMap<String, VecDeque<SendError>>>>,
}

impl FakeTrapSender {
    pub fn new() -> Self {
        Self {
            sent: Arc::new(Mutex::new(Vec::new())),
            failures: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Queue a failure for the next send to `destination` (host:port form)
    pub fn add_failure(&self, destination: &str, error: SendError) {
        let mut failures = self.failures.lock().unwrap();
        failures
            .entry(destination.to_string())
            .or_default()
            .push_back(error);
    }

    /// All notifications seen so far, in send order
    pub fn notifications(&self) -> Vec<TrapNotification> {
        self.sent.lock().unwrap().clone()
    }

    /// Number of transport invocations made
    pub fn call_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

impl Default for FakeTrapSender {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TrapSender for FakeTrapSender {
    fn name(&self) -> &str {
        "fake"
    }

    async fn send(&self, notification: &TrapNotification) -> Result<(), SendError> {
        self.sent.lock().unwrap().push(notification.clone());

        let mut failures = self.failures.lock().unwrap();
        if let Some(queue) = failures.get_mut(&notification.destination.to_string()) {
            if let Some(error) = queue.pop_front() {
                return Err(error);
            }
        }
        Ok(())
    }
}
