//! PropertyMap: the key-value store on vertices and edges.

use hashbrown::HashMap;
use super::Value;

/// A map of property names to single values.
pub type PropertyMap = HashMap<String, Value>;

/// Build a PropertyMap from `(key, value)` pairs.
pub fn props<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> PropertyMap
where
    K: Into<String>,
    V: Into<Value>,
{
    pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect()
}
