//! Common test utilities and helpers

#![allow(dead_code)] // Test utilities may not all be used in every test file

pub mod builders;
pub mod recorder;

use pipeflow_rs::pipeline::{Dispatcher, LastOutput};
use pipeflow_rs::NodeId;
use std::time::{Duration, Instant};

/// How long to wait for background sources before failing a test
pub fn test_timeout() -> Duration {
    Duration::from_secs(5)
}

/// Poll `dispatcher` until `done` holds or the timeout expires
pub fn poll_until(dispatcher: &mut Dispatcher, mut done: impl FnMut(&Dispatcher) -> bool) -> bool {
    let deadline = Instant::now() + test_timeout();
    while Instant::now() < deadline {
        dispatcher.poll().expect("dispatcher faulted while polling");
        if done(dispatcher) {
            return true;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    false
}

/// Assert the replay value of a node
pub fn assert_last_output(dispatcher: &Dispatcher, node: &str, expected: LastOutput) {
    assert_eq!(
        dispatcher.last_output(&NodeId::from(node)),
        Some(expected),
        "unexpected last output for {}",
        node
    );
}
