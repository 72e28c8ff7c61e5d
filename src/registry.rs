use rustc_hash::FxHashSet;
use crate::clustering::Clustering;

/// Every optimal clustering discovered so far, in discovery order.
///
/// Append-only. Lookups compare canonical forms, so two clusterings that
/// differ only by their labels are the same entry.
#[derive(Debug, Default)]
pub struct Registry {
    solutions: Vec<Clustering>,
    canonical: FxHashSet<Vec<usize>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding only `initial`.
    pub fn with_initial(initial: Clustering) -> Self {
        let mut registry = Self::new();
        registry.add(initial);
        registry
    }

    /// Whether an equivalent clustering is already registered.
    pub fn contains(&self, clustering: &Clustering) -> bool {
        self.canonical.contains(clustering.canonical_membership())
    }

    /// Register `clustering`. Returns false, leaving the registry unchanged,
    /// when an equivalent clustering is already there.
    pub fn add(&mut self, clustering: Clustering) -> bool {
        if !self.canonical.insert(clustering.canonical_membership().to_vec()) {
            return false;
        }
        self.solutions.push(clustering);
        true
    }

    pub fn len(&self) -> usize {
        self.solutions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.solutions.is_empty()
    }

    pub fn last(&self) -> Option<&Clustering> {
        self.solutions.last()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Clustering> {
        self.solutions.iter()
    }

    pub fn as_slice(&self) -> &[Clustering] {
        &self.solutions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_and_contains() {
        // Arrange
        let mut registry = Registry::with_initial(Clustering::new(vec![1, 1, 2], 3).unwrap());

        // Act
        let added_relabelled = registry.add(Clustering::new(vec![3, 3, 1], 3).unwrap());
        let added_new = registry.add(Clustering::new(vec![1, 2, 2], 3).unwrap());

        // Assert
        assert!(!added_relabelled);
        assert!(added_new);
        assert_eq!(registry.len(), 2);
        assert!(registry.contains(&Clustering::new(vec![2, 1, 1], 3).unwrap()));
        assert!(!registry.contains(&Clustering::new(vec![1, 2, 3], 3).unwrap()));
    }

    #[test]
    fn test_keeps_discovery_order() {
        // Arrange
        let mut registry = Registry::new();
        let memberships = [vec![1, 2, 3], vec![1, 1, 1], vec![1, 2, 1]];

        // Act
        for membership in &memberships {
            registry.add(Clustering::new(membership.clone(), 3).unwrap());
        }

        // Assert
        let stored: Vec<&[usize]> = registry.iter().map(|c| c.membership()).collect();
        assert_eq!(stored, vec![&[1, 2, 3][..], &[1, 1, 1][..], &[1, 2, 1][..]]);
        assert_eq!(registry.last().map(|c| c.num_clusters()), Some(2));
    }
}
