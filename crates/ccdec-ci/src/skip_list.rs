//! Sets of test-vector names excluded from a suite run.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Vectors known to fail (or be unsupported) for an architecture/suite pair.
///
/// Equality ignores insertion order and duplicates collapse. Iteration is
/// sorted so harness command lines are reproducible between runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SkipList(BTreeSet<String>);

impl SkipList {
    pub fn new() -> Self {
        Self(BTreeSet::new())
    }

    pub fn contains(&self, vector: &str) -> bool {
        self.0.contains(vector)
    }

    pub fn insert(&mut self, vector: impl Into<String>) -> bool {
        self.0.insert(vector.into())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for SkipList {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl<'a> IntoIterator for &'a SkipList {
    type Item = &'a String;
    type IntoIter = std::collections::btree_set::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for SkipList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("none");
        }
        for (index, vector) in self.0.iter().enumerate() {
            if index > 0 {
                f.write_str(", ")?;
            }
            f.write_str(vector)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::SkipList;

    #[test]
    fn equality_ignores_order_and_duplicates() {
        let a: SkipList = ["b.webm", "a.webm", "b.webm"].into_iter().collect();
        let b: SkipList = ["a.webm", "b.webm"].into_iter().collect();
        assert_eq!(a, b);
        assert_eq!(a.len(), 2);
    }

    #[test]
    fn membership() {
        let skip: SkipList = ["vp91-2-04-yuv422.webm"].into_iter().collect();
        assert!(skip.contains("vp91-2-04-yuv422.webm"));
        assert!(!skip.contains("vp90-2-00-quantizer-00.webm"));
    }

    #[test]
    fn display_lists_sorted_vectors() {
        let skip: SkipList = ["z.ivf", "a.ivf"].into_iter().collect();
        assert_eq!(skip.to_string(), "a.ivf, z.ivf");
        assert_eq!(SkipList::new().to_string(), "none");
    }
}
