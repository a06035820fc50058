//! Live event envelope carried on a grid's broadcast topic.

use serde::{Deserialize, Serialize};

use crate::id::{Coord, GridId};
use crate::Value;

/// A message delivered to observers of a grid.
///
/// Serialized as an internally tagged JSON object:
///
/// ```text
/// {"type":"hello","gridId":"g_.."}
/// {"type":"cell_claimed","gridId":"g_..","coord":[0,1],"value":"held:a"}
/// {"type":"cell_released","gridId":"g_..","coord":[0,1]}
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum GridEvent {
    /// First frame of every stream; confirms the subscription is live.
    Hello {
        /// Grid being observed.
        grid_id: GridId,
    },
    /// A cell was claimed.
    CellClaimed {
        /// Grid containing the cell.
        grid_id: GridId,
        /// Coordinate of the cell.
        coord: Coord,
        /// Payload submitted by the winning claim.
        #[serde(default)]
        value: Value,
    },
    /// A cell was released.
    CellReleased {
        /// Grid containing the cell.
        grid_id: GridId,
        /// Coordinate of the cell.
        coord: Coord,
    },
}

impl GridEvent {
    /// The grid this event belongs to.
    pub fn grid_id(&self) -> &GridId {
        match self {
            Self::Hello { grid_id }
            | Self::CellClaimed { grid_id, .. }
            | Self::CellReleased { grid_id, .. } => grid_id,
        }
    }

    /// Serialize to the wire representation.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Parse a wire payload.
    pub fn from_json(raw: &str) -> serde_json::Result<Self> {
        serde_json::from_str(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use smallvec::smallvec;

    #[test]
    fn hello_wire_shape() {
        let ev = GridEvent::Hello {
            grid_id: GridId::from("g_1"),
        };
        let v: Value = serde_json::from_str(&ev.to_json().unwrap()).unwrap();
        assert_eq!(v, json!({"type": "hello", "gridId": "g_1"}));
    }

    #[test]
    fn claimed_wire_shape() {
        let ev = GridEvent::CellClaimed {
            grid_id: GridId::from("g_1"),
            coord: smallvec![0, 2],
            value: json!({"holder": "a"}),
        };
        let v: Value = serde_json::from_str(&ev.to_json().unwrap()).unwrap();
        assert_eq!(
            v,
            json!({"type": "cell_claimed", "gridId": "g_1", "coord": [0, 2], "value": {"holder": "a"}})
        );
    }

    #[test]
    fn released_has_no_value() {
        let ev = GridEvent::CellReleased {
            grid_id: GridId::from("g_1"),
            coord: smallvec![1],
        };
        let v: Value = serde_json::from_str(&ev.to_json().unwrap()).unwrap();
        assert_eq!(v, json!({"type": "cell_released", "gridId": "g_1", "coord": [1]}));
    }

    #[test]
    fn parses_wire_payloads() {
        let ev = GridEvent::from_json(r#"{"type":"cell_claimed","gridId":"g_9","coord":[4,4]}"#)
            .unwrap();
        assert_eq!(
            ev,
            GridEvent::CellClaimed {
                grid_id: GridId::from("g_9"),
                coord: smallvec![4, 4],
                value: Value::Null,
            }
        );
        assert_eq!(ev.grid_id().as_str(), "g_9");
        assert!(GridEvent::from_json(r#"{"type":"bogus"}"#).is_err());
    }
}
