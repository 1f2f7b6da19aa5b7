use std::cell::Cell;
use std::time::{Duration, Instant};

/// Enforces a minimum interval between requests to one host. Single-shot
/// synchronous pipeline, so interior mutability through a `Cell` is enough.
#[derive(Debug)]
pub struct Pacer {
    min_interval: Duration,
    last: Cell<Option<Instant>>,
}

impl Pacer {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last: Cell::new(None),
        }
    }

    /// Block until at least the configured interval has passed since the
    /// previous call, then mark this request.
    pub fn wait(&self) {
        if let Some(last) = self.last.get() {
            let elapsed = last.elapsed();
            if elapsed < self.min_interval {
                std::thread::sleep(self.min_interval - elapsed);
            }
        }
        self.last.set(Some(Instant::now()));
    }
}

#[cfg(test)]
mod tests {
    use super::Pacer;
    use std::time::{Duration, Instant};

    #[test]
    fn second_call_waits_out_the_interval() {
        let pacer = Pacer::new(Duration::from_millis(20));
        let start = Instant::now();
        pacer.wait();
        pacer.wait();
        assert!(start.elapsed() >= Duration::from_millis(20));
    }

    #[test]
    fn first_call_does_not_block() {
        let pacer = Pacer::new(Duration::from_secs(60));
        let start = Instant::now();
        pacer.wait();
        assert!(start.elapsed() < Duration::from_secs(1));
    }
}
