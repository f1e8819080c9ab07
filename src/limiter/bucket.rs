use std::time::Instant;

/// Token bucket refilled continuously at `rate` tokens per second, holding at most `capacity` tokens.
#[derive(Debug, Clone)]
pub struct TokenBucket {
    capacity: f64,
    rate: f64,
    tokens: f64,
    last_refill: Instant,
}

impl TokenBucket {
    /// A full bucket.
    pub fn new(capacity: u32, rate: f64, now: Instant) -> Self {
        let capacity = f64::from(capacity);
        Self {
            capacity,
            rate: rate.max(0.0),
            tokens: capacity,
            last_refill: now,
        }
    }

    fn refill(&mut self, now: Instant) {
        // Instants earlier than the last refill are treated as "no time passed".
        let elapsed = now.saturating_duration_since(self.last_refill).as_secs_f64();
        if elapsed > 0.0 {
            self.tokens = (self.tokens + elapsed * self.rate).min(self.capacity);
            self.last_refill = now;
        }
    }

    /// Consume one token if available.
    pub fn try_acquire(&mut self, now: Instant) -> bool {
        self.refill(now);
        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    pub fn available(&self) -> f64 {
        self.tokens
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn starts_full_and_drains() {
        let t0 = Instant::now();
        let mut bucket = TokenBucket::new(3, 1.0, t0);
        assert!(bucket.try_acquire(t0));
        assert!(bucket.try_acquire(t0));
        assert!(bucket.try_acquire(t0));
        assert!(!bucket.try_acquire(t0));
    }

    #[test]
    fn refills_at_rate_and_caps_at_capacity() {
        let t0 = Instant::now();
        let mut bucket = TokenBucket::new(2, 4.0, t0);
        assert!(bucket.try_acquire(t0));
        assert!(bucket.try_acquire(t0));
        assert!(!bucket.try_acquire(t0));

        // 1/4 s refills exactly one token.
        assert!(bucket.try_acquire(t0 + Duration::from_millis(250)));
        assert!(!bucket.try_acquire(t0 + Duration::from_millis(250)));

        // A long idle period never overfills.
        let later = t0 + Duration::from_secs(60);
        bucket.refill(later);
        assert_eq!(bucket.available(), 2.0);
    }

    #[test]
    fn fractional_rate() {
        let t0 = Instant::now();
        let mut bucket = TokenBucket::new(1, 0.5, t0);
        assert!(bucket.try_acquire(t0));
        assert!(!bucket.try_acquire(t0 + Duration::from_secs(1)));
        assert!(bucket.try_acquire(t0 + Duration::from_secs(2)));
    }
}
