//! Startup replay of the event log into an empty registry.

use crate::errors::{PlayerRegistryError, ReconcileError};
use crate::game_registry::GameRegistry;
use crate::player_registry::PlayerRegistry;
use crate::types::RegistryConfig;
use assassin_core::{ring_cycle_len, Fact, Game, KillDictionary, Player};
use assassin_store::{collections, decode, DocumentStore};
use std::sync::Arc;
use tracing::{error, info};

impl GameRegistry {
    /// Builds a registry from everything already in the event log.
    ///
    /// Games are reconstituted first, then players and starts are replayed in
    /// log order. Any inconsistency (a repeated game, a player joining a game
    /// that was never created or has already started, a start whose targets
    /// are not one ring over the admitted players) aborts the open: the server
    /// must not serve requests from a state it cannot trust.
    pub async fn open(
        store: Arc<dyn DocumentStore>,
        players: Arc<PlayerRegistry>,
        dictionary: Arc<dyn KillDictionary>,
        config: RegistryConfig,
    ) -> Result<Self, ReconcileError> {
        let registry = Self::new(store, players, dictionary, config);
        registry.replay().await?;
        Ok(registry)
    }

    async fn replay(&self) -> Result<(), ReconcileError> {
        let documents = self.store().read_all(collections::EVENTS).await?;
        let facts = documents
            .iter()
            .map(|doc| decode::<Fact>(doc))
            .collect::<Result<Vec<_>, _>>()?;

        let min_players = self.config().min_players();
        let games: Vec<Game> = facts
            .iter()
            .filter_map(|fact| match fact {
                Fact::GameCreated(created) => Some(Game::from_fact(created, min_players)),
                _ => None,
            })
            .collect();
        let game_count = games.len();
        self.reconstitute(games).await?;

        let mut pool = self.pool.write().await;
        let mut player_count = 0usize;
        let mut started_count = 0usize;

        for fact in &facts {
            match fact {
                Fact::GameCreated(_) => {}
                Fact::PlayerAdded(added) => {
                    let game = pool.get_mut(&added.game_id).ok_or_else(|| {
                        ReconcileError::UnknownGame {
                            fact_id: added.id.clone(),
                            game_id: added.game_id.clone(),
                        }
                    })?;
                    if !game.is_accepting_players() {
                        error!(
                            player_id = %added.id,
                            status = %game.status,
                            "player added after game start"
                        );
                        return Err(ReconcileError::PlayerAfterStart {
                            game_id: added.game_id.clone(),
                            player_id: added.id.clone(),
                        });
                    }
                    self.players()
                        .add_player(Player::from_fact(added))
                        .await
                        .map_err(|_| {
                            error!(player_id = %added.id, "duplicate player during reconciliation");
                            ReconcileError::DuplicatePlayer(added.id.clone())
                        })?;
                    game.start_players += 1;
                    player_count += 1;
                }
                Fact::GameStarted(started) => {
                    let game = pool.get_mut(&started.game_id).ok_or_else(|| {
                        ReconcileError::UnknownGame {
                            fact_id: started.id.clone(),
                            game_id: started.game_id.clone(),
                        }
                    })?;
                    let assigned = started.assignments.len();
                    let single_ring = started
                        .assignments
                        .first()
                        .and_then(|a| ring_cycle_len(&started.assignments, &a.player_id))
                        == Some(assigned);
                    if assigned != game.start_players || !single_ring {
                        error!(
                            game_id = %started.game_id,
                            assigned,
                            admitted = game.start_players,
                            "start fact does not cover the game in one ring"
                        );
                        return Err(ReconcileError::BrokenRing {
                            game_id: started.game_id.clone(),
                            assigned,
                            admitted: game.start_players,
                        });
                    }
                    self.players()
                        .apply_assignments(&started.assignments)
                        .await
                        .map_err(|e| ReconcileError::UnknownPlayer {
                            game_id: started.game_id.clone(),
                            player_id: match e {
                                PlayerRegistryError::NotFound(id) => id,
                                other => other.to_string(),
                            },
                        })?;
                    game.start(started.time_created)?;
                    started_count += 1;
                }
            }
        }

        info!(
            events = facts.len(),
            games = game_count,
            players = player_count,
            started = started_count,
            "event log replayed"
        );
        Ok(())
    }
}
