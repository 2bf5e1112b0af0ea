/// Provider query parameters, without the credential.
///
/// Parameters keep their insertion order so the request URL is stable.
/// Setting an existing name replaces its value in place.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct QuerySpec {
    params: Vec<(String, String)>,
}

impl QuerySpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.params.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.params.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.params.iter().any(|(n, _)| n == name)
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.params.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }
}

impl<K, V> FromIterator<(K, V)> for QuerySpec
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut query = Self::new();
        for (k, v) in iter {
            query.insert(k, v);
        }
        query
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_preserves_order_and_replaces() {
        let mut query = QuerySpec::new()
            .with("function", "TIME_SERIES_DAILY")
            .with("symbol", "IBM");
        query.insert("function", "GLOBAL_QUOTE");

        let params: Vec<_> = query.iter().collect();
        assert_eq!(
            params,
            vec![("function", "GLOBAL_QUOTE"), ("symbol", "IBM")]
        );
        assert_eq!(query.len(), 2);
    }

    #[test]
    fn test_from_iter_and_lookup() {
        let query: QuerySpec = [("function", "QUOTE"), ("symbol", "IBM")]
            .into_iter()
            .collect();
        assert_eq!(query.get("symbol"), Some("IBM"));
        assert!(query.contains("function"));
        assert!(!query.contains("apikey"));
        assert!(QuerySpec::new().is_empty());
    }
}
