//! Round-robin partitioning of validated records across agents.
//!
//! # Invariants
//! - Item `i` lands in group `i % group_count`, in input order.
//! - Every input item appears in exactly one group.
//! - Group sizes differ by at most one.

use crate::model::agent::Agent;
use crate::model::assigned_list::ListDraft;
use crate::model::contact::ContactRecord;
use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DistributeError {
    NoRecipients,
}

impl Display for DistributeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoRecipients => write!(f, "no agents available for distribution"),
        }
    }
}

impl Error for DistributeError {}

/// Splits `items` into `group_count` groups by index modulo `group_count`.
///
/// Groups past the item count come back empty; the result always has
/// exactly `group_count` entries.
pub fn round_robin<T: Clone>(
    items: &[T],
    group_count: usize,
) -> Result<Vec<Vec<T>>, DistributeError> {
    if group_count == 0 {
        return Err(DistributeError::NoRecipients);
    }

    let mut groups: Vec<Vec<T>> = (0..group_count)
        .map(|_| Vec::with_capacity(items.len().div_ceil(group_count)))
        .collect();
    for (index, item) in items.iter().enumerate() {
        groups[index % group_count].push(item.clone());
    }

    Ok(groups)
}

/// Pairs group `g` of the round-robin split with `agents[g]`.
///
/// Each draft snapshots the agent's current name.
pub fn assign_to_agents(
    records: &[ContactRecord],
    agents: &[Agent],
) -> Result<Vec<ListDraft>, DistributeError> {
    let groups = round_robin(records, agents.len())?;
    Ok(agents
        .iter()
        .zip(groups)
        .map(|(agent, items)| ListDraft {
            agent_id: agent.id,
            agent_name: agent.name.clone(),
            items,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::{assign_to_agents, round_robin, DistributeError};
    use crate::model::agent::Agent;
    use crate::model::contact::ContactRecord;
    use uuid::Uuid;

    fn agent(name: &str) -> Agent {
        Agent {
            id: Uuid::new_v4(),
            name: name.to_string(),
            email: format!("{}@example.com", name.to_lowercase()),
            phone_number: "555".to_string(),
            created_at: 0,
        }
    }

    #[test]
    fn three_items_over_two_groups_alternate() {
        let groups = round_robin(&["A", "B", "C"], 2).unwrap();
        assert_eq!(groups, vec![vec!["A", "C"], vec!["B"]]);
    }

    #[test]
    fn equal_counts_give_one_item_each() {
        let groups = round_robin(&[1, 2, 3, 4, 5], 5).unwrap();
        assert!(groups.iter().all(|group| group.len() == 1));
    }

    #[test]
    fn zero_groups_fail_even_for_empty_input() {
        assert_eq!(
            round_robin::<u8>(&[], 0).unwrap_err(),
            DistributeError::NoRecipients
        );
        assert_eq!(
            round_robin(&[1, 2], 0).unwrap_err(),
            DistributeError::NoRecipients
        );
    }

    #[test]
    fn partition_is_exact_and_balanced_for_many_shapes() {
        for item_count in 0..40usize {
            let items: Vec<usize> = (0..item_count).collect();
            for group_count in 1..12usize {
                let groups = round_robin(&items, group_count).unwrap();
                assert_eq!(groups.len(), group_count);

                let floor = item_count / group_count;
                let ceil = item_count.div_ceil(group_count);
                let mut seen = Vec::new();
                for (group_index, group) in groups.iter().enumerate() {
                    assert!(group.len() == floor || group.len() == ceil);
                    assert!(group.windows(2).all(|pair| pair[0] < pair[1]));
                    assert!(group.iter().all(|item| item % group_count == group_index));
                    seen.extend(group.iter().copied());
                }
                seen.sort_unstable();
                assert_eq!(seen, items);
            }
        }
    }

    #[test]
    fn drafts_follow_agent_order_and_snapshot_names() {
        let agents = vec![agent("Ana"), agent("Ben"), agent("Cai")];
        let records = vec![
            ContactRecord::new("A", "1", ""),
            ContactRecord::new("B", "2", ""),
        ];

        let drafts = assign_to_agents(&records, &agents).unwrap();
        assert_eq!(drafts.len(), 3);
        assert_eq!(drafts[0].agent_id, agents[0].id);
        assert_eq!(drafts[0].agent_name, "Ana");
        assert_eq!(drafts[0].items, vec![records[0].clone()]);
        assert_eq!(drafts[1].items, vec![records[1].clone()]);
        assert!(drafts[2].items.is_empty());
    }

    #[test]
    fn drafts_require_at_least_one_agent() {
        let records = vec![ContactRecord::new("A", "1", "")];
        assert_eq!(
            assign_to_agents(&records, &[]).unwrap_err(),
            DistributeError::NoRecipients
        );
    }
}
