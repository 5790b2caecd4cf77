//! Destination rotation.

use std::sync::atomic::{AtomicUsize, Ordering};

use crate::{DspaceError, Result};

/// Cycles through a fixed list of destinations.
///
/// The cursor lives in the rotator itself, so independent engines (and tests)
/// never share rotation state. It is not persisted; a restart begins again at
/// the first destination.
#[derive(Debug)]
pub struct DestinationRotator {
    destinations: Vec<String>,
    cursor: AtomicUsize,
}

impl DestinationRotator {
    /// Create a rotator over `destinations`, which must not be empty.
    pub fn new(destinations: Vec<String>) -> Result<Self> {
        if destinations.is_empty() {
            return Err(DspaceError::Config(
                "destination rotator needs at least one destination".to_string(),
            ));
        }

        Ok(Self {
            destinations,
            cursor: AtomicUsize::new(0),
        })
    }

    /// Return the destination under the cursor and advance the cursor.
    pub fn next(&self) -> &str {
        let len = self.destinations.len();
        let index = self
            .cursor
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |c| Some((c + 1) % len))
            .unwrap_or_else(|c| c);
        &self.destinations[index]
    }

    /// All destinations, in rotation order.
    pub fn destinations(&self) -> &[String] {
        &self.destinations
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rotator(names: &[&str]) -> DestinationRotator {
        DestinationRotator::new(names.iter().map(|s| s.to_string()).collect()).unwrap()
    }

    #[test]
    fn test_empty_is_rejected() {
        assert!(matches!(
            DestinationRotator::new(vec![]),
            Err(DspaceError::Config(_))
        ));
    }

    #[test]
    fn test_single_destination_repeats() {
        let r = rotator(&["only"]);
        for _ in 0..5 {
            assert_eq!(r.next(), "only");
        }
    }

    #[test]
    fn test_wraps_after_n_calls() {
        let r = rotator(&["a", "b", "c"]);

        assert_eq!(r.next(), "a");
        assert_eq!(r.next(), "b");
        assert_eq!(r.next(), "c");
        // N calls later we are back at the start, N+1 gives the second.
        assert_eq!(r.next(), "a");
        assert_eq!(r.next(), "b");
    }

    #[test]
    fn test_independent_rotators() {
        let first = rotator(&["a", "b"]);
        let second = rotator(&["a", "b"]);

        assert_eq!(first.next(), "a");
        assert_eq!(first.next(), "b");
        assert_eq!(second.next(), "a");
    }
}
