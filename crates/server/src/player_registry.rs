use crate::errors::PlayerRegistryError;
use assassin_core::{player_key, Player, TargetAssignment};
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Every player on this server, across all games, keyed by player identity.
///
/// Uniqueness is enforced here in memory only; durability comes from the
/// event log written by the game registry.
#[derive(Default)]
pub struct PlayerRegistry {
    players: RwLock<HashMap<String, Player>>,
}

impl PlayerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_player(&self, player: Player) -> Result<(), PlayerRegistryError> {
        if player.id.is_empty() {
            return Err(PlayerRegistryError::MissingId);
        }
        let mut players = self.players.write().await;
        if players.contains_key(&player.id) {
            return Err(PlayerRegistryError::Duplicate(player.id));
        }
        players.insert(player.id.clone(), player);
        Ok(())
    }

    pub async fn get(&self, id: &str) -> Option<Player> {
        self.players.read().await.get(id).cloned()
    }

    pub async fn get_by_game_and_participant(
        &self,
        game_id: &str,
        participant_id: &str,
    ) -> Option<Player> {
        self.get(&player_key(game_id, participant_id)).await
    }

    /// Players registered under `game_id`, in join order.
    // Linear scan; fine while a server holds a few hundred players.
    pub async fn players_in_game(&self, game_id: &str) -> Vec<Player> {
        let players = self.players.read().await;
        let mut in_game: Vec<Player> = players
            .values()
            .filter(|p| p.game_id == game_id)
            .cloned()
            .collect();
        in_game.sort_by(|a, b| {
            a.time_created
                .cmp(&b.time_created)
                .then_with(|| a.id.cmp(&b.id))
        });
        in_game
    }

    /// Applies a round of targets. Either every assignment lands or none does.
    pub async fn apply_assignments(
        &self,
        assignments: &[TargetAssignment],
    ) -> Result<(), PlayerRegistryError> {
        let mut players = self.players.write().await;
        if let Some(missing) = assignments
            .iter()
            .find(|a| !players.contains_key(&a.player_id))
        {
            return Err(PlayerRegistryError::NotFound(missing.player_id.clone()));
        }
        for a in assignments {
            if let Some(player) = players.get_mut(&a.player_id) {
                player.set_target(a.target_id.clone(), a.kill_word.clone());
            }
        }
        Ok(())
    }

    pub async fn len(&self) -> usize {
        self.players.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.players.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assassin_core::PlayerAddedFact;

    fn player(game: &str, participant: &str) -> Player {
        Player::from_fact(&PlayerAddedFact::new(game, participant, "name", "mail").unwrap())
    }

    #[tokio::test]
    async fn add_and_lookup() {
        let registry = PlayerRegistry::new();
        registry.add_player(player("g1", "UAlice")).await.unwrap();

        let p = registry.get("g1+UAlice").await.unwrap();
        assert_eq!(p.game_id, "g1");
        let same = registry
            .get_by_game_and_participant("g1", "UAlice")
            .await
            .unwrap();
        assert_eq!(p, same);
        assert!(registry.get("g2+UAlice").await.is_none());
    }

    #[tokio::test]
    async fn rejects_missing_id_and_duplicates() {
        let registry = PlayerRegistry::new();
        let mut blank = player("g1", "UAlice");
        blank.id.clear();
        assert_eq!(
            registry.add_player(blank).await,
            Err(PlayerRegistryError::MissingId)
        );

        registry.add_player(player("g1", "UAlice")).await.unwrap();
        assert_eq!(
            registry.add_player(player("g1", "UAlice")).await,
            Err(PlayerRegistryError::Duplicate("g1+UAlice".to_string()))
        );
        // Same participant in another game is a different player.
        registry.add_player(player("g2", "UAlice")).await.unwrap();
        assert_eq!(registry.len().await, 2);
    }

    #[tokio::test]
    async fn players_in_game_filters_by_game() {
        let registry = PlayerRegistry::new();
        for p in ["UA", "UB", "UC"] {
            registry.add_player(player("g1", p)).await.unwrap();
        }
        registry.add_player(player("g2", "UD")).await.unwrap();

        let in_g1 = registry.players_in_game("g1").await;
        assert_eq!(in_g1.len(), 3);
        assert!(in_g1.iter().all(|p| p.game_id == "g1"));
        assert!(registry.players_in_game("nope").await.is_empty());
    }

    #[tokio::test]
    async fn apply_assignments_is_all_or_nothing() {
        let registry = PlayerRegistry::new();
        registry.add_player(player("g1", "UA")).await.unwrap();
        registry.add_player(player("g1", "UB")).await.unwrap();

        let bad = vec![
            TargetAssignment {
                player_id: "g1+UA".into(),
                target_id: "g1+UB".into(),
                kill_word: "zebra".into(),
            },
            TargetAssignment {
                player_id: "g1+UX".into(),
                target_id: "g1+UA".into(),
                kill_word: "zebra".into(),
            },
        ];
        assert_eq!(
            registry.apply_assignments(&bad).await,
            Err(PlayerRegistryError::NotFound("g1+UX".to_string()))
        );
        assert_eq!(registry.get("g1+UA").await.unwrap().target, None);

        registry.apply_assignments(&bad[..1]).await.unwrap();
        let a = registry.get("g1+UA").await.unwrap();
        assert_eq!(a.target.as_deref(), Some("g1+UB"));
        assert_eq!(a.kill_word.as_deref(), Some("zebra"));
    }
}
