use crate::data::{AssignmentResult, Participant, ParticipantId, SlotKey, UnmetPreference};
use crate::error::AssignmentError;
use log::{debug, info, trace};
use std::collections::{BTreeMap, HashSet};
use std::time::Instant;

/// Utility of an unranked slot.
const UNRANKED_UTILITY: i64 = 0;
/// Floor added to every ranked pick so any pick beats an unranked slot.
const RANKED_BASE_UTILITY: i64 = 10;
/// Weight of each step a pick sits above the bottom of the list.
const RANK_STEP_UTILITY: i64 = 2;

/// Utility of giving `slot` to `participant`.
///
/// Strictly decreasing in rank, and always above the unranked utility.
pub fn pick_utility(participant: &Participant, slot: &str) -> i64 {
    match participant.rank_of(slot) {
        Some(rank) => {
            let remaining = (participant.picks.len() - rank) as i64;
            RANKED_BASE_UTILITY + RANK_STEP_UTILITY * remaining
        }
        None => UNRANKED_UTILITY,
    }
}

/// Participants as rows, slots as columns.
pub fn utility_matrix(slots: &[SlotKey], participants: &[Participant]) -> Vec<Vec<i64>> {
    participants
        .iter()
        .map(|p| slots.iter().map(|s| pick_utility(p, s)).collect())
        .collect()
}

/// Turns utilities into a square cost matrix with one column per slot. Real cells cost
/// `max utility - utility`; padding cells cost nothing.
///
/// Column `p` holds slot `column_order[p]`. Real rows also pay `p` on a
/// scale below one unit of utility, so among equally good assignments the
/// real participants take the slots that come first in `column_order` and
/// the later ones are left to padding.
fn padded_cost_matrix(utility: &[Vec<i64>], column_order: &[usize]) -> Vec<Vec<i64>> {
    let size = column_order.len();
    let max_utility = utility.iter().flatten().copied().max().unwrap_or(0);
    // exceeds the largest possible sum of column positions over real rows
    let scale = (size * size) as i64 + 1;
    let mut cost = vec![vec![0; size]; size];
    for (i, row) in utility.iter().enumerate() {
        for (p, &j) in column_order.iter().enumerate() {
            cost[i][p] = (max_utility - row[j]) * scale + p as i64;
        }
    }
    cost
}

/// Slot indices ordered by key, so the outcome does not depend on the
/// order the caller listed the slots in.
fn canonical_column_order(slots: &[SlotKey]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..slots.len()).collect();
    order.sort_by(|&a, &b| slots[a].cmp(&slots[b]));
    order
}

/// Kuhn-Munkres with row/column potentials, O(n^3) on a square matrix.
///
/// Returns `assignment[row] = column`, a permutation of `0..n`.
fn kuhn_munkres(cost: &[Vec<i64>]) -> Vec<usize> {
    let n = cost.len();
    // 1-based; index 0 is the virtual source row/column
    let mut row_potential = vec![0i64; n + 1];
    let mut col_potential = vec![0i64; n + 1];
    let mut col_owner = vec![0usize; n + 1];
    let mut way = vec![0usize; n + 1];

    for row in 1..=n {
        col_owner[0] = row;
        let mut col0 = 0;
        let mut min_slack = vec![i64::MAX; n + 1];
        let mut used = vec![false; n + 1];
        loop {
            used[col0] = true;
            let row0 = col_owner[col0];
            let mut delta = i64::MAX;
            let mut col1 = 0;
            for col in 1..=n {
                if used[col] {
                    continue;
                }
                let slack = cost[row0 - 1][col - 1] - row_potential[row0] - col_potential[col];
                if slack < min_slack[col] {
                    min_slack[col] = slack;
                    way[col] = col0;
                }
                if min_slack[col] < delta {
                    delta = min_slack[col];
                    col1 = col;
                }
            }
            for col in 0..=n {
                if used[col] {
                    row_potential[col_owner[col]] += delta;
                    col_potential[col] -= delta;
                } else {
                    min_slack[col] -= delta;
                }
            }
            col0 = col1;
            if col_owner[col0] == 0 {
                break;
            }
        }
        // augment along the alternating path
        while col0 != 0 {
            let prev = way[col0];
            col_owner[col0] = col_owner[prev];
            col0 = prev;
        }
    }

    let mut assignment = vec![0; n];
    for col in 1..=n {
        if col_owner[col] != 0 {
            assignment[col_owner[col] - 1] = col - 1;
        }
    }
    assignment
}

fn validate(slots: &[SlotKey], participants: &[Participant]) -> Result<(), AssignmentError> {
    if slots.len() < participants.len() {
        return Err(AssignmentError::NotEnoughSlots {
            slots: slots.len(),
            participants: participants.len(),
        });
    }
    let mut seen_slots = HashSet::new();
    for slot in slots {
        if !seen_slots.insert(slot.as_str()) {
            return Err(AssignmentError::DuplicateSlot(slot.clone()));
        }
    }
    let mut seen_ids = HashSet::new();
    for participant in participants {
        if !seen_ids.insert(participant.id.as_str()) {
            return Err(AssignmentError::DuplicateParticipant(participant.id.clone()));
        }
    }
    Ok(())
}

/// Matches every participant to a distinct slot, maximising total utility.
///
/// Requires at least as many slots as participants; extra slots are left
/// unassigned. Ties between equally good assignments go to the slots with
/// the smallest keys, whatever order `slots` is given in.
pub fn compute_assignment(
    slots: &[SlotKey],
    participants: &[Participant],
) -> Result<AssignmentResult, AssignmentError> {
    let start_time = Instant::now();
    validate(slots, participants)?;

    info!(
        "Assigning {} participants to {} slots...",
        participants.len(),
        slots.len()
    );
    let utility = utility_matrix(slots, participants);
    let column_order = canonical_column_order(slots);
    let cost = padded_cost_matrix(&utility, &column_order);
    trace!("Padded cost matrix: {:?}", cost);

    // row -> slot index; padding rows are dropped
    let permutation: Vec<usize> = kuhn_munkres(&cost)
        .into_iter()
        .take(participants.len())
        .map(|p| column_order[p])
        .collect();

    let mut assignments: BTreeMap<SlotKey, ParticipantId> = BTreeMap::new();
    let mut total_utility = 0;
    for (i, participant) in participants.iter().enumerate() {
        let j = permutation[i];
        total_utility += utility[i][j];
        assignments.insert(slots[j].clone(), participant.id.clone());
    }
    let unassigned_slots = slots
        .iter()
        .filter(|s| !assignments.contains_key(s.as_str()))
        .cloned()
        .collect();
    let unmet_preferences = collect_unmet_preferences(slots, participants, &permutation);

    debug!(
        "Assignment with total utility {} found in {:.2?}",
        total_utility,
        start_time.elapsed()
    );
    Ok(AssignmentResult {
        assignments,
        total_utility,
        unassigned_slots,
        unmet_preferences,
    })
}

fn collect_unmet_preferences(
    slots: &[SlotKey],
    participants: &[Participant],
    permutation: &[usize],
) -> Vec<UnmetPreference> {
    participants
        .iter()
        .zip(permutation)
        .filter_map(|(participant, &j)| {
            let slot = &slots[j];
            let rank = participant.rank_of(slot);
            if rank == Some(0) || participant.picks.is_empty() {
                return None;
            }
            let description = match rank {
                Some(r) => format!(
                    "Assigned {} (pick #{}) instead of first pick {}.",
                    slot,
                    r + 1,
                    participant.picks[0]
                ),
                None => format!(
                    "Assigned {}, which is not among the {} ranked picks.",
                    slot,
                    participant.picks.len()
                ),
            };
            Some(UnmetPreference {
                participant_id: participant.id.clone(),
                assigned_slot: slot.clone(),
                assigned_rank: rank,
                description,
            })
        })
        .collect()
}
