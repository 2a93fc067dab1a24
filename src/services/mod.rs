pub mod audit;
pub mod codes;
pub mod dashboard;
pub mod import;
pub mod lending;
pub mod master_data;
pub mod products;
pub mod serials;
pub mod stock;

use serde::{Deserialize, Deserializer};

/// Trims `value`; blank input becomes `None`.
pub(crate) fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// For `Option<Option<T>>` patch fields: absent stays `None`, an explicit
/// `null` becomes `Some(None)`.
pub(crate) fn deserialize_some<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_empty_trims_and_drops_blanks() {
        assert_eq!(non_empty("  Dell ".into()).as_deref(), Some("Dell"));
        assert_eq!(non_empty("   ".into()), None);
    }
}
