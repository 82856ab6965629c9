pub mod budget;
pub mod credit;
pub mod department;
pub mod key_account;
pub mod user;
pub mod withdrawal;

use serde::{Deserialize, Deserializer};

/// Accept a JSON number, a numeric string, or null.
///
/// Budget figures arrive from the backend in all three shapes depending on
/// the endpoint; an unparseable string decodes to `None` rather than failing
/// the whole payload.
pub(crate) fn de_flexible_amount<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Num(f64),
        Text(String),
    }

    Ok(match Option::<Raw>::deserialize(deserializer)? {
        None => None,
        Some(Raw::Num(n)) => Some(n),
        Some(Raw::Text(s)) => s.trim().parse().ok(),
    })
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct Probe {
        #[serde(default, deserialize_with = "super::de_flexible_amount")]
        amount: Option<f64>,
    }

    #[test]
    fn accepts_numbers_strings_null_and_garbage() {
        let n: Probe = serde_json::from_str(r#"{"amount": 500}"#).unwrap();
        assert_eq!(n.amount, Some(500.0));

        let s: Probe = serde_json::from_str(r#"{"amount": "300.5"}"#).unwrap();
        assert_eq!(s.amount, Some(300.5));

        let null: Probe = serde_json::from_str(r#"{"amount": null}"#).unwrap();
        assert_eq!(null.amount, None);

        let garbage: Probe = serde_json::from_str(r#"{"amount": "n/a"}"#).unwrap();
        assert_eq!(garbage.amount, None);

        let missing: Probe = serde_json::from_str(r#"{}"#).unwrap();
        assert_eq!(missing.amount, None);
    }
}
