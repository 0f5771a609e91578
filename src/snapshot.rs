//! Wire types for the authority's geometry snapshot.
//!
//! The layout authority answers a geometry request with a JSON object
//! carrying the run-length encodings for both axes. The encodings stay
//! strings at this layer; [`crate::axis::AxisDimension`] parses them.

use serde::Deserialize;

use crate::error::Result;

/// Expected value of the snapshot's `commandName` field.
pub const SNAPSHOT_COMMAND_NAME: &str = "GridGeometryData";

/// A full geometry snapshot for one sheet part.
///
/// `columns`/`rows` may be absent in incremental updates; within an axis,
/// each encoding may be absent as well (e.g. a groups-only update after the
/// user removes an outline).
#[derive(Debug, Clone, Deserialize)]
pub struct GeometrySnapshot {
    #[serde(rename = "commandName")]
    pub command_name: String,
    /// Highest addressable column index, as a decimal string.
    #[serde(rename = "maxColumnIndex")]
    pub max_column_index: String,
    /// Highest addressable row index, as a decimal string.
    #[serde(rename = "maxRowIndex")]
    pub max_row_index: String,
    pub columns: Option<AxisSnapshot>,
    pub rows: Option<AxisSnapshot>,
}

/// The four per-axis encodings. See [`crate::runs`] and [`crate::outline`]
/// for the grammars.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AxisSnapshot {
    pub sizes: Option<String>,
    pub hidden: Option<String>,
    pub filtered: Option<String>,
    pub groups: Option<String>,
}

impl GeometrySnapshot {
    /// Deserializes a snapshot from the authority's JSON payload.
    pub fn from_json(payload: &str) -> Result<Self> {
        Ok(serde_json::from_str(payload)?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_payload() {
        let snapshot = GeometrySnapshot::from_json(
            r#"{
                "commandName": "GridGeometryData",
                "maxColumnIndex": "1023",
                "maxRowIndex": "500000",
                "columns": {
                    "sizes": "1280:1023 ",
                    "hidden": "0:1023 ",
                    "filtered": "0:1023 ",
                    "groups": ""
                },
                "rows": {
                    "sizes": "256:1048575 ",
                    "hidden": "0:1048575 ",
                    "filtered": "0:1048575 "
                }
            }"#,
        )
        .unwrap();

        assert_eq!(snapshot.command_name, SNAPSHOT_COMMAND_NAME);
        assert_eq!(snapshot.max_column_index, "1023");
        let rows = snapshot.rows.unwrap();
        assert_eq!(rows.sizes.as_deref(), Some("256:1048575 "));
        assert!(rows.groups.is_none());
    }

    #[test]
    fn missing_command_name_is_a_transport_error() {
        assert!(GeometrySnapshot::from_json(r#"{"maxColumnIndex": "1"}"#).is_err());
    }
}
