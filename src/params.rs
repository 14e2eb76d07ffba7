//! Named query attributes.

use crate::types::RowValues;

/// Ordered mapping from placeholder name to value.
///
/// Names may be given with or without the leading `:`; both refer to the same
/// placeholder. Inserting a name twice replaces the earlier value in place.
/// ```rust
/// use sql_executor::prelude::*;
///
/// let attrs = attributes! { "n" => "a:b=c", ":id" => 7 };
/// assert_eq!(attrs.get("id"), Some(&RowValues::Int(7)));
/// assert_eq!(attrs.get(":n"), Some(&RowValues::Text("a:b=c".into())));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Attributes {
    entries: Vec<(String, RowValues)>,
}

/// Strip the optional `:` sigil from a placeholder name.
#[must_use]
pub fn normalize_name(name: &str) -> &str {
    name.strip_prefix(':').unwrap_or(name)
}

impl Attributes {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, name: impl AsRef<str>, value: impl Into<RowValues>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl AsRef<str>, value: impl Into<RowValues>) {
        let name = normalize_name(name.as_ref());
        let value = value.into();
        match self.entries.iter_mut().find(|(existing, _)| existing == name) {
            Some(slot) => slot.1 = value,
            None => self.entries.push((name.to_string(), value)),
        }
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&RowValues> {
        let name = normalize_name(name);
        self.entries
            .iter()
            .find_map(|(existing, value)| (existing == name).then_some(value))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &RowValues)> {
        self.entries.iter().map(|(name, value)| (name.as_str(), value))
    }
}

impl<K: AsRef<str>, V: Into<RowValues>> FromIterator<(K, V)> for Attributes {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut attrs = Attributes::new();
        for (name, value) in iter {
            attrs.insert(name, value);
        }
        attrs
    }
}

impl<K: AsRef<str>, V: Into<RowValues>, const N: usize> From<[(K, V); N]> for Attributes {
    fn from(pairs: [(K, V); N]) -> Self {
        pairs.into_iter().collect()
    }
}

/// Build [`Attributes`] from `name => value` pairs.
#[macro_export]
macro_rules! attributes {
    () => {
        $crate::params::Attributes::new()
    };
    ($($name:expr => $value:expr),+ $(,)?) => {
        $crate::params::Attributes::new()$(.with($name, $value))+
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sigil_is_optional_and_later_values_win() {
        let mut attrs = Attributes::new();
        attrs.insert(":a", 1);
        attrs.insert("b", "x");
        attrs.insert("a", 2);
        assert_eq!(attrs.len(), 2);
        let collected: Vec<_> = attrs.iter().collect();
        assert_eq!(
            collected,
            vec![("a", &RowValues::Int(2)), ("b", &RowValues::Text("x".into()))]
        );
    }

    #[test]
    fn values_with_separators_are_kept_verbatim() {
        let raw = "key:value = other\t value\n\u{7f}end";
        let attrs = Attributes::from([("v", raw)]);
        assert_eq!(attrs.get("v").and_then(RowValues::as_text), Some(raw));
    }

    #[test]
    fn macro_builds_empty_and_populated() {
        assert!(attributes! {}.is_empty());
        let attrs = attributes! { "x" => 1.5, "y" => None::<i64> };
        assert_eq!(attrs.get("x"), Some(&RowValues::Float(1.5)));
        assert_eq!(attrs.get("y"), Some(&RowValues::Null));
    }
}
