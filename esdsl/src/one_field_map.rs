//! Serialization helper for the `{"<field>": {...}}` objects that are
//! everywhere in the Elasticsearch DSL.

use serde::ser::SerializeMap;
use serde::Serialize;

/// Borrowed `{"<field>": value}` object.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OneFieldMap<'a, V> {
    pub field: &'a str,
    pub value: &'a V,
}

impl<'a, V> OneFieldMap<'a, V> {
    pub fn new(field: &'a str, value: &'a V) -> Self {
        Self { field, value }
    }
}

impl<V: Serialize> Serialize for OneFieldMap<'_, V> {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(self.field, self.value)?;
        map.end()
    }
}

/// Implements `Serialize` for a query made of a `field` and a derived
/// `params` body, producing `{"<field>": <params>}`.
macro_rules! field_keyed_serialize {
    ($($ty:ty),* $(,)?) => {
        $(
            impl serde::Serialize for $ty {
                fn serialize<S: serde::Serializer>(
                    &self,
                    serializer: S,
                ) -> ::std::result::Result<S::Ok, S::Error> {
                    serde::Serialize::serialize(
                        &$crate::one_field_map::OneFieldMap::new(&self.field, &self.params),
                        serializer,
                    )
                }
            }
        )*
    };
}

pub(crate) use field_keyed_serialize;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Serialize)]
    struct Property {
        count: usize,
    }

    #[test]
    fn test_one_field_map_simple() {
        let property = Property { count: 2 };
        let json = serde_json::to_value(OneFieldMap::new("my-field", &property)).unwrap();
        assert_eq!(json, json!({"my-field": {"count": 2}}));
    }

    #[test]
    fn test_one_field_map_scalar_value() {
        let json = serde_json::to_value(OneFieldMap::new("user", &"kimchy")).unwrap();
        assert_eq!(json, json!({"user": "kimchy"}));
    }
}
