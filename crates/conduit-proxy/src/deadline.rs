use std::time::{Duration, Instant};

/// Abstracts "has the handshake timer elapsed yet" away from any specific
/// event loop's timer wheel -- the event loop/timer is an external
/// collaborator (see `conduit_pipeline::Channel`), so this handler only
/// needs a yes/no answer, not a `Sleep`/`Repeater` it would have to drive
/// itself.
pub trait Deadline {
    fn has_elapsed(&self) -> bool;
}

/// Reference `Deadline` backed by `std::time::Instant`, for tests and for
/// callers without their own timer wheel integration.
pub struct InstantDeadline {
    expires_at: Instant,
}

impl InstantDeadline {
    pub fn new(timeout: Duration) -> Self {
        Self { expires_at: Instant::now() + timeout }
    }

    pub fn at(expires_at: Instant) -> Self {
        Self { expires_at }
    }
}

impl Deadline for InstantDeadline {
    fn has_elapsed(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn elapsed_deadline_reports_true() {
        let deadline = InstantDeadline::at(Instant::now() - Duration::from_secs(1));
        assert!(deadline.has_elapsed());
    }

    #[test]
    fn future_deadline_reports_false() {
        let deadline = InstantDeadline::new(Duration::from_secs(60));
        assert!(!deadline.has_elapsed());
    }
}
