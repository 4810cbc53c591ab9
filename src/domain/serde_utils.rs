//! Serde helpers for Discord wire formats.

use serde::de::{self, Visitor};
use serde::{Deserializer, Serializer};
use std::fmt;

/// Snowflake IDs arrive as strings in REST and gateway payloads, but numbers
/// show up in older fixtures and hand-written test data. Both are accepted.
pub mod snowflake {
    use super::{Deserializer, Serializer, Visitor, de, fmt};

    /// Serializes a snowflake as a string.
    ///
    /// # Errors
    ///
    /// Returns an error if the serializer fails.
    pub fn serialize<S>(value: &u64, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.to_string())
    }

    /// Deserializes a snowflake from a string or an integer.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is neither, or the string is not numeric.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<u64, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct SnowflakeVisitor;

        impl Visitor<'_> for SnowflakeVisitor {
            type Value = u64;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a string or integer snowflake")
            }

            fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(value)
            }

            fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                u64::try_from(value).map_err(de::Error::custom)
            }

            fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                value.parse::<u64>().map_err(de::Error::custom)
            }
        }

        deserializer.deserialize_any(SnowflakeVisitor)
    }
}

/// Integer fields that older API versions sent as strings (e.g. `permissions`).
pub mod lenient_u64 {
    use super::{Deserializer, Visitor, de, fmt};

    /// Deserializes a u64 from a string, an integer, or null (as zero).
    ///
    /// # Errors
    ///
    /// Returns an error if a string value is not numeric.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<u64, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct LenientVisitor;

        impl Visitor<'_> for LenientVisitor {
            type Value = u64;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("an integer, numeric string or null")
            }

            fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(value)
            }

            fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                u64::try_from(value).map_err(de::Error::custom)
            }

            fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                value.parse::<u64>().map_err(de::Error::custom)
            }

            fn visit_unit<E>(self) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(0)
            }
        }

        deserializer.deserialize_any(LenientVisitor)
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Wrapper {
        #[serde(with = "super::snowflake")]
        id: u64,
        #[serde(default, deserialize_with = "super::lenient_u64::deserialize")]
        permissions: u64,
    }

    #[test]
    fn test_snowflake_from_string_and_number() {
        let from_str: Wrapper = serde_json::from_str(r#"{"id": "80351110224678912"}"#).unwrap();
        let from_num: Wrapper = serde_json::from_str(r#"{"id": 80351110224678912}"#).unwrap();

        assert_eq!(from_str.id, 80_351_110_224_678_912);
        assert_eq!(from_str.id, from_num.id);
    }

    #[test]
    fn test_snowflake_rejects_garbage() {
        let result = serde_json::from_str::<Wrapper>(r#"{"id": "not-a-number"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_lenient_permissions() {
        let parsed: Wrapper =
            serde_json::from_str(r#"{"id": "1", "permissions": "2147483647"}"#).unwrap();
        assert_eq!(parsed.permissions, 2_147_483_647);

        let parsed: Wrapper = serde_json::from_str(r#"{"id": "1", "permissions": null}"#).unwrap();
        assert_eq!(parsed.permissions, 0);
    }
}
