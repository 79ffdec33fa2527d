// setkit-common/src/model/mod.rs
// Declares the modules within the model directory.
use std::fmt;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer};

pub mod action;
pub mod application;
pub mod catalog;
pub mod utility;

// Re-export
pub use action::{ActionKind, InstallAction};
pub use application::{Application, Arch, DownloadSource, DownloadTarget};
pub use catalog::Catalog;
pub use utility::Utility;

/// Treats an explicit YAML null the same as a missing sequence.
pub(crate) fn null_as_empty<'de, D, T>(deserializer: D) -> std::result::Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Reads an optional text field that catalog authors may write as any scalar.
///
/// `args: 1` or `fileName: 2024` arrive as numbers; they are kept as text.
/// Null and missing both map to `None`.
pub(crate) fn scalar_string<'de, D>(
    deserializer: D,
) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    struct ScalarText(String);

    impl<'de> Deserialize<'de> for ScalarText {
        fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
        where
            D: Deserializer<'de>,
        {
            deserializer.deserialize_str(ScalarVisitor).map(ScalarText)
        }
    }

    struct ScalarVisitor;

    impl<'de> Visitor<'de> for ScalarVisitor {
        type Value = String;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a string, number or boolean")
        }

        fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<String, E> {
            Ok(v.to_string())
        }

        fn visit_string<E: de::Error>(self, v: String) -> std::result::Result<String, E> {
            Ok(v)
        }

        fn visit_bool<E: de::Error>(self, v: bool) -> std::result::Result<String, E> {
            Ok(v.to_string())
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> std::result::Result<String, E> {
            Ok(v.to_string())
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> std::result::Result<String, E> {
            Ok(v.to_string())
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> std::result::Result<String, E> {
            Ok(v.to_string())
        }
    }

    Ok(Option::<ScalarText>::deserialize(deserializer)?.map(|s| s.0))
}
