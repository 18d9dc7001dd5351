use std::time::{Duration, Instant};

/// Wall-clock budget for one optimization run.
///
/// Workers poll this between 2-opt passes; the stitcher polls it between
/// clusters. Polling keeps the hot loops free of timer syscalls.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    at: Instant,
}

impl Deadline {
    pub fn after(budget: Duration) -> Self {
        Deadline {
            at: Instant::now() + budget,
        }
    }

    pub fn expired(&self) -> bool {
        Instant::now() >= self.at
    }
}
