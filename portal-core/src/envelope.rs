//! Typed response envelope.
//!
//! Backend endpoints are inconsistent about whether they return a value
//! directly or wrapped in `{"data": ...}`. Decoding through `Envelope<T>` at
//! the service boundary keeps that normalization in one place instead of
//! sprinkling shape checks through every caller.

use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum Envelope<T> {
    Wrapped { data: T },
    Bare(T),
}

impl<T> Envelope<T> {
    pub fn into_inner(self) -> T {
        match self {
            Envelope::Wrapped { data } => data,
            Envelope::Bare(value) => value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Envelope;

    #[derive(Debug, serde::Deserialize, PartialEq)]
    struct Item {
        id: u32,
    }

    #[test]
    fn decodes_bare_list() {
        let list: Envelope<Vec<Item>> = serde_json::from_str(r#"[{"id":1},{"id":2}]"#).unwrap();
        assert_eq!(list.into_inner(), vec![Item { id: 1 }, Item { id: 2 }]);
    }

    #[test]
    fn decodes_wrapped_list() {
        let list: Envelope<Vec<Item>> =
            serde_json::from_str(r#"{"data":[{"id":7}]}"#).unwrap();
        assert_eq!(list.into_inner(), vec![Item { id: 7 }]);
    }

    #[test]
    fn decodes_wrapped_object() {
        let item: Envelope<Item> = serde_json::from_str(r#"{"data":{"id":3}}"#).unwrap();
        assert_eq!(item.into_inner(), Item { id: 3 });
    }
}
