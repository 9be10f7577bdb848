use serde::{Deserialize, Deserializer};

/// Trims text fields on the way in, so length checks see what gets stored
/// and a whitespace-only title fails `length(min = 1)`.
pub fn trimmed<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(String::deserialize(deserializer)?.trim().to_string())
}

pub fn trimmed_opt<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.map(|s| s.trim().to_string()))
}
