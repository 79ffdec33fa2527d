// setkit-common/src/model/utility.rs
use serde::{Deserialize, Serialize};

use super::action::InstallAction;
use super::null_as_empty;

/// A standalone tool script: one action list, no phases.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Utility {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub actions: Vec<InstallAction>,
}
