use super::HashedLaneInfo;
use crate::ElementId;
use smallvec::SmallVec;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Maps hashed lane buckets to the elements occupying them.
///
/// Each element is filed under at most one bucket. The registry is shared by
/// every element's update and guarded by a single lock.
#[derive(Default)]
pub struct HashedLaneRegistry {
    inner: Mutex<Buckets>,
}

#[derive(Default)]
struct Buckets {
    elements: HashMap<HashedLaneInfo, SmallVec<[ElementId; 4]>>,
    buckets: HashMap<ElementId, HashedLaneInfo>,
}

impl Buckets {
    fn remove(&mut self, id: ElementId) -> Option<HashedLaneInfo> {
        let old = self.buckets.remove(&id)?;
        if let Some(ids) = self.elements.get_mut(&old) {
            ids.retain(|other| *other != id);
            if ids.is_empty() {
                self.elements.remove(&old);
            }
        }
        Some(old)
    }
}

impl HashedLaneRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Buckets> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Files an element under `bucket`, first removing it from any other bucket.
    /// Returns false if it was already filed there.
    pub fn register(&self, id: ElementId, bucket: HashedLaneInfo) -> bool {
        let mut inner = self.lock();
        if inner.buckets.get(&id) == Some(&bucket) {
            return false;
        }
        inner.remove(id);
        inner.buckets.insert(id, bucket);
        inner.elements.entry(bucket).or_default().push(id);
        true
    }

    /// Removes an element, returning the bucket it was filed under.
    pub fn unregister(&self, id: ElementId) -> Option<HashedLaneInfo> {
        self.lock().remove(id)
    }

    /// The elements filed under a bucket.
    pub fn elements_in(&self, bucket: &HashedLaneInfo) -> SmallVec<[ElementId; 4]> {
        self.lock()
            .elements
            .get(bucket)
            .cloned()
            .unwrap_or_default()
    }

    pub fn bucket_of(&self, id: ElementId) -> Option<HashedLaneInfo> {
        self.lock().buckets.get(&id).copied()
    }

    /// The number of elements filed.
    pub fn len(&self) -> usize {
        self.lock().buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
