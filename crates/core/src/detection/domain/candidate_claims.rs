use std::sync::atomic::{AtomicBool, Ordering};

/// One claimed-flag per candidate region of the current detection cycle.
///
/// Slots claim candidates with compare-and-swap, so concurrent slot
/// updates can never take the same candidate twice. Which slot wins a
/// given candidate is decided by the race and is not deterministic.
#[derive(Debug, Default)]
pub struct CandidateClaims {
    claimed: Vec<AtomicBool>,
}

impl CandidateClaims {
    pub fn new(count: usize) -> Self {
        Self {
            claimed: (0..count).map(|_| AtomicBool::new(false)).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.claimed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.claimed.is_empty()
    }

    /// Atomically flips candidate `index` from unclaimed to claimed.
    pub fn try_claim(&self, index: usize) -> bool {
        self.claimed.get(index).is_some_and(|flag| {
            flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
        })
    }

    /// Scans in index order and takes the first candidate nobody holds.
    pub fn claim_first_available(&self) -> Option<usize> {
        (0..self.claimed.len()).find(|&i| self.try_claim(i))
    }

    pub fn claimed_count(&self) -> usize {
        self.claimed
            .iter()
            .filter(|f| f.load(Ordering::Acquire))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Mutex;

    #[test]
    fn test_claim_succeeds_once() {
        let claims = CandidateClaims::new(1);
        assert!(claims.try_claim(0));
        assert!(!claims.try_claim(0));
    }

    #[test]
    fn test_out_of_range_claim_fails() {
        let claims = CandidateClaims::new(2);
        assert!(!claims.try_claim(2));
    }

    #[test]
    fn test_first_available_in_index_order() {
        let claims = CandidateClaims::new(3);
        assert!(claims.try_claim(0));
        assert_eq!(claims.claim_first_available(), Some(1));
        assert_eq!(claims.claim_first_available(), Some(2));
        assert_eq!(claims.claim_first_available(), None);
    }

    #[test]
    fn test_empty_has_nothing_to_claim() {
        let claims = CandidateClaims::new(0);
        assert!(claims.is_empty());
        assert_eq!(claims.claim_first_available(), None);
    }

    #[test]
    fn test_concurrent_claims_never_collide() {
        const CANDIDATES: usize = 16;
        const CLAIMERS: usize = 32;

        for _ in 0..50 {
            let claims = CandidateClaims::new(CANDIDATES);
            let won = Mutex::new(Vec::new());
            std::thread::scope(|s| {
                for _ in 0..CLAIMERS {
                    s.spawn(|| {
                        if let Some(i) = claims.claim_first_available() {
                            won.lock().unwrap().push(i);
                        }
                    });
                }
            });
            let won = won.into_inner().unwrap();
            let unique: HashSet<usize> = won.iter().copied().collect();
            assert_eq!(won.len(), CANDIDATES);
            assert_eq!(unique.len(), CANDIDATES);
            assert_eq!(claims.claimed_count(), CANDIDATES);
        }
    }
}
