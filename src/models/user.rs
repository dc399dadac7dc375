//! Identity claims carried by bearer tokens

use serde::{Deserialize, Deserializer, Serialize};

/// JWT claims identifying the caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserClaims {
    #[serde(rename = "userId", deserialize_with = "deserialize_user_id")]
    pub user_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
}

impl UserClaims {
    pub fn new(user_id: i64) -> Self {
        Self { user_id, exp: None }
    }

    pub fn expiring_at(mut self, exp: i64) -> Self {
        self.exp = Some(exp);
        self
    }
}

/// Token issuers encode the id as a JSON number, sometimes as a float
fn deserialize_user_id<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let number = serde_json::Number::deserialize(deserializer)?;
    number
        .as_i64()
        .or_else(|| number.as_f64().filter(|f| f.is_finite()).map(|f| f as i64))
        .ok_or_else(|| serde::de::Error::custom("userId is not a valid integer"))
}
