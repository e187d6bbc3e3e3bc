use secrecy::SecretString;
use serde::{Deserialize, Deserializer, Serializer};

/// Marker written in place of a secret value
pub const REDACTED: &str = "***STEELSHARDS REDACTED SECRET***";

/// Deserialize an optional secret from a plain string
pub(crate) fn de_secret<'a, D>(deserializer: D) -> Result<Option<SecretString>, D::Error>
where
    D: Deserializer<'a>,
{
    let s = Option::<String>::deserialize(deserializer)?;
    Ok(s.map(SecretString::new))
}

/// Redact the actual secret value
pub(crate) fn ser_secret<S>(key: &Option<SecretString>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match key {
        Some(_) => serializer.serialize_str(REDACTED),
        None => serializer.serialize_none(),
    }
}
