//! Lenient deserializers for columns the hosted backend may return as a
//! number, a numeric string, or null

use serde::de;
use serde::Deserialize;

/// Deserialize an i64 that may arrive as a number, string, or null
pub(crate) fn deserialize_i64_lenient<'de, D>(deserializer: D) -> std::result::Result<i64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    struct I64Lenient;

    impl<'de> de::Visitor<'de> for I64Lenient {
        type Value = i64;

        fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
            formatter.write_str("a number, string, or null")
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> std::result::Result<i64, E> {
            Ok(v)
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> std::result::Result<i64, E> {
            Ok(v as i64)
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> std::result::Result<i64, E> {
            Ok(v as i64)
        }

        fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<i64, E> {
            v.parse::<i64>().map_err(de::Error::custom)
        }

        fn visit_none<E: de::Error>(self) -> std::result::Result<i64, E> {
            Ok(0)
        }

        fn visit_unit<E: de::Error>(self) -> std::result::Result<i64, E> {
            Ok(0)
        }
    }

    deserializer.deserialize_any(I64Lenient)
}

/// Deserialize a u32 counter that may arrive as a number, string, or null
pub(crate) fn deserialize_u32_lenient<'de, D>(deserializer: D) -> std::result::Result<u32, D::Error>
where
    D: serde::Deserializer<'de>,
{
    struct U32Lenient;

    impl<'de> de::Visitor<'de> for U32Lenient {
        type Value = u32;

        fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
            formatter.write_str("a number, string, or null")
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> std::result::Result<u32, E> {
            Ok(v as u32)
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> std::result::Result<u32, E> {
            Ok(v.max(0) as u32)
        }

        fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<u32, E> {
            v.parse::<u32>().map_err(de::Error::custom)
        }

        fn visit_none<E: de::Error>(self) -> std::result::Result<u32, E> {
            Ok(0)
        }

        fn visit_unit<E: de::Error>(self) -> std::result::Result<u32, E> {
            Ok(0)
        }
    }

    deserializer.deserialize_any(U32Lenient)
}

/// Deserialize an enum column, mapping null to its default
pub(crate) fn deserialize_or_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
