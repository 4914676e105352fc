//! Batched key/value input for [`NamespacedStore::set`](crate::NamespacedStore::set)

use crate::{StoreError, StoreResult};

/// Ordered list of key/value pairs written in one round trip.
///
/// Every supported input shape (explicit pairs, a flat alternating
/// key/value sequence, or several batches appended together) ends up as one
/// flat list with insertion order preserved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyValueBatch {
    pairs: Vec<(String, String)>,
}

impl KeyValueBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            pairs: Vec::with_capacity(capacity),
        }
    }

    /// Build from a flat `key, value, key, value, ...` sequence.
    ///
    /// An odd number of items is rejected.
    pub fn from_flat<I, S>(items: I) -> StoreResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut batch = Self::new();
        let mut items = items.into_iter();

        while let Some(key) = items.next() {
            let key = key.into();
            let value = items.next().ok_or_else(|| {
                StoreError::InvalidInput(format!("key '{}' has no value", key))
            })?;
            batch.pairs.push((key, value.into()));
        }

        Ok(batch)
    }

    pub fn push(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.pairs.push((key.into(), value.into()));
        self
    }

    /// Append another batch, keeping its order after ours
    pub fn append(&mut self, mut other: KeyValueBatch) -> &mut Self {
        self.pairs.append(&mut other.pairs);
        self
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub(crate) fn into_pairs(self) -> Vec<(String, String)> {
        self.pairs
    }
}

impl<K, V> FromIterator<(K, V)> for KeyValueBatch
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            pairs: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl<K, V> Extend<(K, V)> for KeyValueBatch
where
    K: Into<String>,
    V: Into<String>,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        self.pairs
            .extend(iter.into_iter().map(|(k, v)| (k.into(), v.into())));
    }
}

impl<K, V> From<Vec<(K, V)>> for KeyValueBatch
where
    K: Into<String>,
    V: Into<String>,
{
    fn from(pairs: Vec<(K, V)>) -> Self {
        pairs.into_iter().collect()
    }
}

impl<K, V, const N: usize> From<[(K, V); N]> for KeyValueBatch
where
    K: Into<String>,
    V: Into<String>,
{
    fn from(pairs: [(K, V); N]) -> Self {
        pairs.into_iter().collect()
    }
}

impl<K, V> From<(K, V)> for KeyValueBatch
where
    K: Into<String>,
    V: Into<String>,
{
    fn from(pair: (K, V)) -> Self {
        std::iter::once(pair).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn flat_sequence_pairs_up() {
        let batch = KeyValueBatch::from_flat(["a", "1", "b", "2"]).unwrap();
        let pairs: Vec<_> = batch.iter().collect();
        assert_eq!(pairs, vec![("a", "1"), ("b", "2")]);
    }

    #[test]
    fn odd_flat_sequence_is_rejected() {
        let err = KeyValueBatch::from_flat(["a", "1", "dangling"]).unwrap_err();
        assert!(matches!(err, StoreError::InvalidInput(_)));
    }

    #[test]
    fn mixed_shapes_flatten_in_order() {
        let mut batch = KeyValueBatch::from(("k0", "v0"));
        batch.append(KeyValueBatch::from([("k1", "v1"), ("k2", "v2")]));
        batch.append(KeyValueBatch::from_flat(vec!["k3", "v3"]).unwrap());
        batch.push("k4", "v4");

        let keys: Vec<_> = batch.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["k0", "k1", "k2", "k3", "k4"]);
        assert_eq!(batch.len(), 5);
    }

    proptest! {
        #[test]
        fn flat_and_paired_forms_agree(
            pairs in prop::collection::vec(("[a-z]{1,8}", "[a-z0-9]{0,8}"), 0..16)
        ) {
            let flat: Vec<String> = pairs
                .iter()
                .flat_map(|(k, v)| [k.clone(), v.clone()])
                .collect();

            let from_flat = KeyValueBatch::from_flat(flat).unwrap();
            let from_pairs = KeyValueBatch::from(pairs.clone());

            prop_assert_eq!(from_flat.len(), pairs.len());
            prop_assert_eq!(from_flat, from_pairs);
        }
    }
}
