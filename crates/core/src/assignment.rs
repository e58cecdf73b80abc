//! Ring target assignment.
//!
//! Players are shuffled and each one hunts the next, with the last wrapping
//! around to the first. The result is a single directed cycle: everyone has
//! exactly one target and exactly one hunter.

use crate::dictionary::KillDictionary;
use crate::facts::TargetAssignment;
use rand::seq::SliceRandom;
use rand::RngCore;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AssignmentError {
    #[error("dictionary {0} produced no kill word")]
    NoWord(String),
}

/// Shuffles `player_ids` and links them into one ring, drawing a kill word
/// from `dictionary_id` for every edge.
pub fn assign_ring<R: RngCore>(
    mut player_ids: Vec<String>,
    dictionary_id: &str,
    dictionary: &dyn KillDictionary,
    rng: &mut R,
) -> Result<Vec<TargetAssignment>, AssignmentError> {
    player_ids.shuffle(&mut *rng);

    let n = player_ids.len();
    let mut assignments = Vec::with_capacity(n);
    for (i, player_id) in player_ids.iter().enumerate() {
        let target_id = &player_ids[(i + 1) % n];
        let kill_word = dictionary
            .pick_word(dictionary_id, &mut *rng)
            .ok_or_else(|| AssignmentError::NoWord(dictionary_id.to_string()))?;
        assignments.push(TargetAssignment {
            player_id: player_id.clone(),
            target_id: target_id.clone(),
            kill_word,
        });
    }
    Ok(assignments)
}

/// Follows targets from `start` and returns the number of steps taken to get
/// back to it, or `None` if the chain breaks or never returns.
pub fn ring_cycle_len(assignments: &[TargetAssignment], start: &str) -> Option<usize> {
    let targets: HashMap<&str, &str> = assignments
        .iter()
        .map(|a| (a.player_id.as_str(), a.target_id.as_str()))
        .collect();

    let mut current = start;
    for steps in 1..=targets.len() {
        current = *targets.get(current)?;
        if current == start {
            return Some(steps);
        }
    }
    None
}
