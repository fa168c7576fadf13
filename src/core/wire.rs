use serde::{Deserialize, Deserializer};

use crate::core::models::Provider;

/// Top-level envelope returned by the registry API.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct ApiResponse {
    #[serde(default)]
    pub result_count: u32,
    #[serde(default)]
    pub results: Vec<Provider>,
}

/// The registry returns epoch timestamps either as JSON integers or as numeric strings,
/// and occasionally as an empty string. Missing, `null` and `""` all decode to `0`.
pub fn de_flex_epoch<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum FlexInt {
        Int(i64),
        Str(String),
    }

    match Option::<FlexInt>::deserialize(deserializer)? {
        Some(FlexInt::Int(i)) => Ok(i),
        Some(FlexInt::Str(s)) if s.trim().is_empty() => Ok(0),
        Some(FlexInt::Str(s)) => s.trim().parse::<i64>().map_err(|e| {
            serde::de::Error::custom(format!("invalid epoch value {s:?}: {e}"))
        }),
        None => Ok(0),
    }
}
