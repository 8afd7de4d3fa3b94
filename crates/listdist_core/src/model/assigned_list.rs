//! Distribution group model.
//!
//! # Invariants
//! - `agent_name` is a snapshot taken at assignment time and is never
//!   resynchronized with the registry.
//! - All lists of one distribution run share the same `assigned_at`.

use crate::model::agent::AgentId;
use crate::model::contact::ContactRecord;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier of one persisted list.
pub type ListId = Uuid;

/// A group of records destined for one agent, not yet persisted.
///
/// Also the wire shape of client-built distribution payloads; the legacy
/// `agentId`/`agentName` keys are accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListDraft {
    #[serde(rename = "recipientId", alias = "agentId")]
    pub agent_id: AgentId,
    #[serde(rename = "recipientName", alias = "agentName")]
    pub agent_name: String,
    #[serde(default)]
    pub items: Vec<ContactRecord>,
}

/// A persisted group of the active distribution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignedList {
    pub id: ListId,
    #[serde(rename = "recipientId")]
    pub agent_id: AgentId,
    #[serde(rename = "recipientName")]
    pub agent_name: String,
    /// Zero-based group index within its distribution run.
    pub position: u32,
    pub items: Vec<ContactRecord>,
    /// Unix epoch milliseconds.
    #[serde(rename = "assignedDate")]
    pub assigned_at: i64,
}

#[cfg(test)]
mod tests {
    use super::{AssignedList, ListDraft};
    use crate::model::contact::ContactRecord;
    use serde_json::json;
    use uuid::Uuid;

    #[test]
    fn draft_accepts_legacy_agent_keys_and_missing_items() {
        let id = Uuid::new_v4();
        let draft: ListDraft = serde_json::from_value(json!({
            "agentId": id,
            "agentName": "Ana"
        }))
        .unwrap();

        assert_eq!(draft.agent_id, id);
        assert_eq!(draft.agent_name, "Ana");
        assert!(draft.items.is_empty());
    }

    #[test]
    fn assigned_list_serializes_console_field_names() {
        let list = AssignedList {
            id: Uuid::nil(),
            agent_id: Uuid::nil(),
            agent_name: "Ana".to_string(),
            position: 0,
            items: vec![ContactRecord::new("Ben", "555", "")],
            assigned_at: 1_700_000_000_000,
        };

        let value = serde_json::to_value(&list).unwrap();

        assert_eq!(value["recipientName"], json!("Ana"));
        assert_eq!(value["assignedDate"], json!(1_700_000_000_000_i64));
        assert_eq!(
            value["items"][0],
            json!({ "FirstName": "Ben", "Phone": "555", "Notes": "" })
        );
        assert!(value.get("agentId").is_none());
    }
}
