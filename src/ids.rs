// Vendor id allocation
//
// Ids are positive integers handed out in increasing order and never
// reused, even after the vendor holding one is deleted.

use crate::entities::VendorId;
use std::sync::atomic::{AtomicI64, Ordering};

pub trait IdGenerator: Send + Sync {
    fn next_id(&self) -> VendorId;
}

/// Monotonic counter starting at 1
#[derive(Debug)]
pub struct SequentialIds {
    next: AtomicI64,
}

impl SequentialIds {
    pub fn new() -> Self {
        SequentialIds {
            next: AtomicI64::new(1),
        }
    }
}

impl Default for SequentialIds {
    fn default() -> Self {
        Self::new()
    }
}

impl IdGenerator for SequentialIds {
    fn next_id(&self) -> VendorId {
        VendorId(self.next.fetch_add(1, Ordering::Relaxed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;

    #[test]
    fn test_sequential_ids_start_at_one() {
        let ids = SequentialIds::new();
        assert_eq!(ids.next_id(), VendorId(1));
        assert_eq!(ids.next_id(), VendorId(2));
        assert_eq!(ids.next_id(), VendorId(3));
    }

    #[test]
    fn test_concurrent_allocation_has_no_duplicates() {
        let ids = Arc::new(SequentialIds::new());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let ids = Arc::clone(&ids);
                std::thread::spawn(move || (0..500).map(|_| ids.next_id()).collect::<Vec<_>>())
            })
            .collect();

        let mut seen = HashSet::new();
        for handle in handles {
            for id in handle.join().unwrap() {
                assert!(seen.insert(id), "duplicate id {}", id);
            }
        }
        assert_eq!(seen.len(), 8 * 500);
    }
}
