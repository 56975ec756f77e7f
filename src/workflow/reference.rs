//! Trip reference numbers.

use std::sync::atomic::{AtomicU32, Ordering};

/// Issues trip references of the form `YYYY/N` from a workspace counter.
///
/// The counter only ever grows, so two callers never receive the same
/// number, whichever thread they run on.
///
/// # Example
///
/// ```
/// use travel_cost_engine::workflow::TripReferenceSequence;
///
/// let sequence = TripReferenceSequence::starting_after(41);
/// assert_eq!(sequence.next_reference(2024), "2024/42");
/// assert_eq!(sequence.next_reference(2024), "2024/43");
/// ```
#[derive(Debug, Default)]
pub struct TripReferenceSequence {
    last: AtomicU32,
}

impl TripReferenceSequence {
    /// Creates a sequence whose first reference ends in `/1`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Resumes a sequence after the last number already issued.
    pub fn starting_after(last: u32) -> Self {
        Self {
            last: AtomicU32::new(last),
        }
    }

    /// Returns the next reference for the given year.
    pub fn next_reference(&self, year: i32) -> String {
        let number = self.last.fetch_add(1, Ordering::SeqCst) + 1;
        format!("{}/{}", year, number)
    }

    /// Returns the last number issued, 0 when none was.
    pub fn last_issued(&self) -> u32 {
        self.last.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Mutex;
    use std::thread;

    #[test]
    fn test_starts_at_one() {
        let sequence = TripReferenceSequence::new();
        assert_eq!(sequence.next_reference(2024), "2024/1");
        assert_eq!(sequence.next_reference(2025), "2025/2");
        assert_eq!(sequence.last_issued(), 2);
    }

    #[test]
    fn test_concurrent_references_are_unique() {
        let sequence = TripReferenceSequence::new();
        let issued = Mutex::new(HashSet::new());

        thread::scope(|scope| {
            for _ in 0..8 {
                scope.spawn(|| {
                    for _ in 0..50 {
                        let reference = sequence.next_reference(2024);
                        assert!(issued.lock().unwrap().insert(reference));
                    }
                });
            }
        });

        assert_eq!(issued.lock().unwrap().len(), 400);
        assert_eq!(sequence.last_issued(), 400);
    }
}
