//! Result of the `info` remote call.

use crate::error::{Result, UnoError};
use crate::rpc::Value;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Width of the filter-name column in [`ServiceInfo`]'s text rendering.
const FILTER_COLUMN: usize = 34;

/// Versions and available filters reported by unoserver.
///
/// Filter maps are `BTreeMap`s so iteration (and therefore the rendered
/// text and JSON) is always in ascending key order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceInfo {
    /// XML-RPC API version.
    pub api: String,
    /// unoserver package version.
    pub unoserver: String,
    /// Import filter name → description.
    pub import_filters: BTreeMap<String, String>,
    /// Export filter name → description.
    pub export_filters: BTreeMap<String, String>,
}

impl ServiceInfo {
    /// Decode the struct returned by `info`.
    ///
    /// Missing members decode as empty; members of the wrong type are an error.
    pub fn from_value(value: &Value) -> Result<Self> {
        let members = value.as_struct().ok_or_else(|| {
            UnoError::protocol("info", format!("expected struct, got {}", value.type_name()))
        })?;

        Ok(Self {
            api: string_member(members, "api")?,
            unoserver: string_member(members, "unoserver")?,
            import_filters: filter_member(members, "import_filters")?,
            export_filters: filter_member(members, "export_filters")?,
        })
    }
}

fn string_member(members: &BTreeMap<String, Value>, name: &str) -> Result<String> {
    match members.get(name) {
        None | Some(Value::Nil) => Ok(String::new()),
        Some(Value::String(s)) => Ok(s.clone()),
        // Older servers report the API version as an int.
        Some(Value::Int(i)) => Ok(i.to_string()),
        Some(other) => Err(UnoError::protocol(
            "info",
            format!("member '{name}' should be a string, got {}", other.type_name()),
        )),
    }
}

fn filter_member(
    members: &BTreeMap<String, Value>,
    name: &str,
) -> Result<BTreeMap<String, String>> {
    let filters = match members.get(name) {
        None | Some(Value::Nil) => return Ok(BTreeMap::new()),
        Some(Value::Struct(m)) => m,
        Some(other) => {
            return Err(UnoError::protocol(
                "info",
                format!("member '{name}' should be a struct, got {}", other.type_name()),
            ))
        }
    };

    filters
        .iter()
        .map(|(key, v)| match v {
            Value::String(s) => Ok((key.clone(), s.clone())),
            Value::Nil => Ok((key.clone(), String::new())),
            other => Err(UnoError::protocol(
                "info",
                format!("filter '{key}' in '{name}' has a {} description", other.type_name()),
            )),
        })
        .collect()
}

impl fmt::Display for ServiceInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "api           : {}", self.api)?;
        writeln!(f, "unoserver     : {}", self.unoserver)?;

        writeln!(f, "import_filters:")?;
        for (name, desc) in &self.import_filters {
            writeln!(f, "    {name:<width$}: {desc}", width = FILTER_COLUMN)?;
        }

        writeln!(f, "export_filters:")?;
        for (name, desc) in &self.export_filters {
            writeln!(f, "    {name:<width$}: {desc}", width = FILTER_COLUMN)?;
        }
        Ok(())
    }
}
