use serde::{Deserialize, Serialize};

/// A named bundle of permission ids.
///
/// `inherits_from` lists parent roles whose permissions are only
/// considered when the checker is built with role inheritance enabled.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct Role {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub permissions: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub inherits_from: Vec<String>,
}

mod impls;
