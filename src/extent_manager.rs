//! Allocates extents with monotonically increasing ids.

use crate::model::{Extent, ExtentId, IdAllocator};

pub struct ExtentManager {
    extents: Vec<Option<Extent>>,
    ids: IdAllocator,
    default_ext_size: u64,
    default_secondary_threshold: u8,
}

impl ExtentManager {
    pub fn new(default_ext_size: u64, default_secondary_threshold: u8) -> Self {
        Self {
            extents: Vec::new(),
            ids: IdAllocator::new(),
            default_ext_size,
            default_secondary_threshold,
        }
    }

    /// `create_extent(size?, secondary_threshold=15)` in §4.4: returns a
    /// fresh extent pre-sized to `size` or the configured default.
    pub fn create_extent(&mut self, size: Option<u64>, key: i64) -> ExtentId {
        let id = self.ids.next_extent();
        let ext = Extent::new(
            id,
            size.unwrap_or(self.default_ext_size),
            self.default_secondary_threshold,
            key,
        );
        let idx = id.0 as usize;
        if self.extents.len() <= idx {
            self.extents.resize_with(idx + 1, || None);
        }
        self.extents[idx] = Some(ext);
        id
    }

    pub fn get(&self, id: ExtentId) -> Option<&Extent> {
        self.extents.get(id.0 as usize).and_then(|e| e.as_ref())
    }

    pub fn get_mut(&mut self, id: ExtentId) -> Option<&mut Extent> {
        self.extents.get_mut(id.0 as usize).and_then(|e| e.as_mut())
    }

    /// Removes `e` from the roster. The caller must have already unlinked
    /// it from any stripe and re-pooled its live objects (§4.4).
    pub fn delete_extent(&mut self, id: ExtentId) {
        if let Some(slot) = self.extents.get_mut(id.0 as usize) {
            *slot = None;
        }
    }

    pub fn count(&self) -> usize {
        self.extents.iter().filter(|e| e.is_some()).count()
    }

    /// Every live extent, for the CLI's per-tick data-center size accounting
    /// (§6).
    pub fn iter(&self) -> impl Iterator<Item = &Extent> {
        self.extents.iter().filter_map(|e| e.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_extent_uses_default_size_when_unspecified() {
        let mut em = ExtentManager::new(1024, 15);
        let id = em.create_extent(None, 0);
        assert_eq!(em.get(id).unwrap().ext_size, 1024);
    }

    #[test]
    fn delete_extent_removes_it_from_roster() {
        let mut em = ExtentManager::new(1024, 15);
        let id = em.create_extent(Some(50), 0);
        assert_eq!(em.count(), 1);
        em.delete_extent(id);
        assert_eq!(em.count(), 0);
        assert!(em.get(id).is_none());
    }

    #[test]
    fn ids_are_monotonically_increasing() {
        let mut em = ExtentManager::new(1024, 15);
        let a = em.create_extent(None, 0);
        let b = em.create_extent(None, 0);
        assert!(b.0 > a.0);
    }
}
