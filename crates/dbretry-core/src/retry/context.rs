/// Position of one attempt within a retry session
///
/// Handed to observers and to context-aware operations. Attempts are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttemptContext {
    attempt: u32,
    max_attempts: u32,
}

impl AttemptContext {
    pub(crate) fn new(attempt: u32, max_attempts: u32) -> Self {
        Self {
            attempt,
            max_attempts,
        }
    }

    /// The attempt number (1-indexed)
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    /// The attempt budget of the session
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn is_first(&self) -> bool {
        self.attempt == 1
    }

    /// Whether a failure of this attempt ends the session
    pub fn is_last(&self) -> bool {
        self.attempt >= self.max_attempts
    }

    /// Attempts still available after this one
    pub fn remaining(&self) -> u32 {
        self.max_attempts.saturating_sub(self.attempt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_positions() {
        let first = AttemptContext::new(1, 3);
        assert!(first.is_first());
        assert!(!first.is_last());
        assert_eq!(first.remaining(), 2);

        let last = AttemptContext::new(3, 3);
        assert!(!last.is_first());
        assert!(last.is_last());
        assert_eq!(last.remaining(), 0);
    }

    #[test]
    fn test_single_attempt_is_first_and_last() {
        let only = AttemptContext::new(1, 1);
        assert!(only.is_first());
        assert!(only.is_last());
    }
}
