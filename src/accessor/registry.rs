use super::{FieldValue, PropertyAccessError, PropertyAccessor};
use std::collections::HashMap;
use std::fmt;

type Getter<R> = Box<dyn Fn(&R) -> Result<FieldValue, PropertyAccessError> + Send + Sync>;

/// Explicit per-type property table: each exported path maps to a getter.
pub struct PropertyMap<R> {
    getters: HashMap<String, Getter<R>>,
}

impl<R> PropertyMap<R> {
    pub fn new() -> Self {
        Self {
            getters: HashMap::new(),
        }
    }

    pub fn with<F, V>(mut self, path: impl Into<String>, getter: F) -> Self
    where
        R: 'static,
        F: Fn(&R) -> V + Send + Sync + 'static,
        V: Into<FieldValue>,
    {
        let boxed: Getter<R> =
            Box::new(move |row: &R| -> Result<FieldValue, PropertyAccessError> { Ok(getter(row).into()) });
        self.getters.insert(path.into(), boxed);
        self
    }

    /// Registers a getter that can itself fail, e.g. an optional relation.
    pub fn with_fallible<F>(mut self, path: impl Into<String>, getter: F) -> Self
    where
        F: Fn(&R) -> Result<FieldValue, PropertyAccessError> + Send + Sync + 'static,
    {
        self.getters.insert(path.into(), Box::new(getter));
        self
    }

    pub fn contains(&self, path: &str) -> bool {
        self.getters.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.getters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.getters.is_empty()
    }
}

impl<R> Default for PropertyMap<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> fmt::Debug for PropertyMap<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut paths: Vec<&String> = self.getters.keys().collect();
        paths.sort();
        f.debug_struct("PropertyMap").field("paths", &paths).finish()
    }
}

impl<R> PropertyAccessor<R> for PropertyMap<R> {
    fn resolve(&self, row: &R, path: &str) -> Result<FieldValue, PropertyAccessError> {
        let getter = self
            .getters
            .get(path)
            .ok_or_else(|| PropertyAccessError::missing(path))?;
        getter(row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    struct Address {
        city: String,
    }

    struct Customer {
        id: i64,
        name: String,
        born: NaiveDate,
        address: Option<Address>,
    }

    fn properties() -> PropertyMap<Customer> {
        PropertyMap::new()
            .with("id", |c: &Customer| c.id)
            .with("name", |c: &Customer| c.name.clone())
            .with("born", |c: &Customer| c.born)
            .with_fallible("address.city", |c: &Customer| {
                c.address
                    .as_ref()
                    .map(|a| FieldValue::from(&a.city))
                    .ok_or_else(|| PropertyAccessError::Failed {
                        path: "address.city".to_string(),
                        reason: "address is null".to_string(),
                    })
            })
    }

    #[test]
    fn test_registered_getters() {
        let born = NaiveDate::from_ymd_opt(1990, 1, 31).unwrap();
        let row = Customer {
            id: 1,
            name: "Alice".to_string(),
            born,
            address: Some(Address {
                city: "Torino".to_string(),
            }),
        };
        let map = properties();

        assert_eq!(map.len(), 4);
        assert!(map.contains("address.city"));
        assert_eq!(map.resolve(&row, "id"), Ok(FieldValue::Integer(1)));
        assert_eq!(map.resolve(&row, "born"), Ok(FieldValue::Date(born)));
        assert_eq!(map.resolve(&row, "address.city"), Ok(FieldValue::from("Torino")));
    }

    #[test]
    fn test_unregistered_and_failing_getters() {
        let row = Customer {
            id: 2,
            name: "Bob".to_string(),
            born: NaiveDate::from_ymd_opt(1985, 6, 1).unwrap(),
            address: None,
        };
        let map = properties();

        assert_eq!(map.resolve(&row, "email"), Err(PropertyAccessError::missing("email")));
        assert!(matches!(
            map.resolve(&row, "address.city"),
            Err(PropertyAccessError::Failed { .. })
        ));
    }
}
