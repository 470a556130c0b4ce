//! Field deserializers for values the server copies straight out of LLM
//! output, where an integer may arrive as `72.5` and a string as `null`.

use serde::{Deserialize, Deserializer};

/// Integer, float or `null` confidence, rounded and clamped into `0..=100`.
pub fn confidence<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<f64>::deserialize(deserializer)?;
    Ok(raw
        .filter(|v| v.is_finite())
        .map_or(0, |v| v.round().clamp(0.0, 100.0) as u32))
}

/// `null` reads as the type's default instead of failing the whole row.
pub fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
