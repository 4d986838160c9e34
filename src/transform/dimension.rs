use indexmap::IndexSet;
use std::hash::Hash;

/// Surrogate key type shared by every dimension.
pub type SurrogateKey = i64;

/// Deduplicated natural keys in first-appearance order.
///
/// The surrogate key of a natural key is `1 + position`, so keys are dense and
/// start at 1. Keys are only stable within one build.
#[derive(Debug, Clone)]
pub struct Dimension<K> {
    name: &'static str,
    keys: IndexSet<K>,
}

impl<K> Dimension<K>
where
    K: Eq + Hash + Clone,
{
    pub fn from_keys<I>(name: &'static str, natural_keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
    {
        Self {
            name,
            keys: natural_keys.into_iter().collect(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn key_of(&self, natural_key: &K) -> Option<SurrogateKey> {
        self.keys
            .get_index_of(natural_key)
            .map(|idx| idx as SurrogateKey + 1)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// `(surrogate key, natural key)` pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (SurrogateKey, &K)> + '_ {
        self.keys
            .iter()
            .enumerate()
            .map(|(idx, key)| (idx as SurrogateKey + 1, key))
    }

    /// Runs construction again over this dimension's own rows.
    pub fn rebuild(&self) -> Self {
        Self::from_keys(self.name, self.keys.iter().cloned())
    }
}
