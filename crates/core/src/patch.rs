//! Partial-update support: telling an absent field apart from an explicit `null`.

use serde::{Deserialize, Deserializer};

/// A nullable column in a change set.
///
/// `None` leaves the column alone, `Some(None)` clears it, `Some(Some(v))` sets it.
pub type Patch<T> = Option<Option<T>>;

/// Deserializer for [`Patch`] fields; pair it with `#[serde(default)]` so a
/// missing key stays `None` while `null` becomes `Some(None)`.
pub fn nullable<'de, D, T>(deserializer: D) -> Result<Patch<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Apply a [`Patch`] to the current value.
pub fn apply<T>(current: &mut Option<T>, patch: Patch<T>) {
    if let Some(next) = patch {
        *current = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize)]
    struct Changes {
        #[serde(default, deserialize_with = "nullable")]
        note: Patch<String>,
    }

    fn parse(json: serde_json::Value) -> Patch<String> {
        serde_json::from_value::<Changes>(json).unwrap().note
    }

    #[test]
    fn absent_null_and_value_are_distinct() {
        assert_eq!(parse(serde_json::json!({})), None);
        assert_eq!(parse(serde_json::json!({"note": null})), Some(None));
        assert_eq!(
            parse(serde_json::json!({"note": "hi"})),
            Some(Some("hi".to_string()))
        );
    }

    #[test]
    fn apply_clears_sets_and_keeps() {
        let mut value = Some(1);
        apply(&mut value, None);
        assert_eq!(value, Some(1));
        apply(&mut value, Some(Some(2)));
        assert_eq!(value, Some(2));
        apply(&mut value, Some(None));
        assert_eq!(value, None);
    }
}
