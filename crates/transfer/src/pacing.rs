//! Pacing between chunk sends.

use std::future::Future;
use std::time::Duration;

/// Decides how long the transmitter waits between two chunk sends.
///
/// `pause` is awaited before every chunk except the first one.
pub trait Pacer: Send {
    fn pause(&mut self) -> impl Future<Output = ()> + Send;
}

/// Waits a fixed delay between chunks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedDelay {
    delay: Duration,
}

impl FixedDelay {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

impl Pacer for FixedDelay {
    fn pause(&mut self) -> impl Future<Output = ()> + Send {
        tokio::time::sleep(self.delay)
    }
}

/// Sends as fast as the channel accepts.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unpaced;

impl Pacer for Unpaced {
    fn pause(&mut self) -> impl Future<Output = ()> + Send {
        std::future::ready(())
    }
}
