use super::graph::ConnectionType;
use crate::core::models::hkl::HKL;
use std::collections::BTreeMap;

/// Identifies one connection: unit-cell atom `source` to the `hkl` image of `target`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeKey {
    pub source: usize,
    pub target: usize,
    pub hkl: HKL,
}

impl EdgeKey {
    pub const fn new(source: usize, target: usize, hkl: HKL) -> Self {
        Self {
            source,
            target,
            hkl,
        }
    }

    pub fn reversed(&self) -> Self {
        Self::new(self.target, self.source, -self.hkl)
    }

    /// The orientation the connectivity builder visits: `source <= target`,
    /// and a positive `hkl` when an atom is paired with its own image.
    pub fn canonical(&self) -> Self {
        if self.source > self.target || (self.source == self.target && !self.hkl.is_positive()) {
            self.reversed()
        } else {
            *self
        }
    }
}

/// Forced classifications that take precedence over distance-based perception.
///
/// Keys are stored in canonical orientation, so an override written from
/// either end of a connection matches the same edge.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BondOverrides {
    entries: BTreeMap<EdgeKey, ConnectionType>,
}

impl BondOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(
        &mut self,
        source: usize,
        target: usize,
        hkl: HKL,
        connection_type: ConnectionType,
    ) -> Option<ConnectionType> {
        self.entries
            .insert(EdgeKey::new(source, target, hkl).canonical(), connection_type)
    }

    pub fn get(&self, key: &EdgeKey) -> Option<ConnectionType> {
        self.entries.get(&key.canonical()).copied()
    }

    /// Removes and returns the override for `key`, marking it as consumed.
    pub fn take(&mut self, key: &EdgeKey) -> Option<ConnectionType> {
        self.entries.remove(&key.canonical())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&EdgeKey, &ConnectionType)> + '_ {
        self.entries.iter()
    }
}

impl IntoIterator for BondOverrides {
    type Item = (EdgeKey, ConnectionType);
    type IntoIter = std::collections::btree_map::IntoIter<EdgeKey, ConnectionType>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl FromIterator<(EdgeKey, ConnectionType)> for BondOverrides {
    fn from_iter<I: IntoIterator<Item = (EdgeKey, ConnectionType)>>(iter: I) -> Self {
        let mut overrides = Self::new();
        for (key, ty) in iter {
            overrides.insert(key.source, key.target, key.hkl, ty);
        }
        overrides
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_orders_endpoints() {
        let key = EdgeKey::new(3, 1, HKL::new(1, 0, 0));
        assert_eq!(key.canonical(), EdgeKey::new(1, 3, HKL::new(-1, 0, 0)));
        assert_eq!(key.canonical().canonical(), key.canonical());
    }

    #[test]
    fn canonical_self_image_uses_positive_hkl() {
        let key = EdgeKey::new(2, 2, HKL::new(0, -1, 0));
        assert_eq!(key.canonical(), EdgeKey::new(2, 2, HKL::new(0, 1, 0)));
    }

    #[test]
    fn overrides_match_from_either_end() {
        let mut overrides = BondOverrides::new();
        overrides.insert(5, 2, HKL::new(0, 0, 1), ConnectionType::DontBond);

        let forward = EdgeKey::new(2, 5, HKL::new(0, 0, -1));
        assert_eq!(overrides.get(&forward), Some(ConnectionType::DontBond));
        assert_eq!(overrides.take(&forward.reversed()), Some(ConnectionType::DontBond));
        assert!(overrides.is_empty());
        assert_eq!(overrides.take(&forward), None);
    }

    #[test]
    fn later_insert_replaces_earlier_one() {
        let mut overrides = BondOverrides::new();
        assert_eq!(
            overrides.insert(0, 1, HKL::ZERO, ConnectionType::CloseContact),
            None
        );
        assert_eq!(
            overrides.insert(1, 0, HKL::ZERO, ConnectionType::CovalentBond),
            Some(ConnectionType::CloseContact)
        );
        assert_eq!(overrides.len(), 1);
    }
}
