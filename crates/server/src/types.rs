use assassin_core::MINIMUM_PLAYERS;

/// Configuration for the game registry.
#[derive(Clone, Debug)]
pub struct RegistryConfig {
    /// Players required before a game may start.
    pub min_players: usize,
    /// Seed for target shuffling. Random when unset.
    pub seed: Option<u64>,
}

impl RegistryConfig {
    /// Effective minimum; a ring needs at least two players to avoid
    /// self-targeting.
    pub fn min_players(&self) -> usize {
        self.min_players.max(2)
    }
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            min_players: MINIMUM_PLAYERS,
            seed: None,
        }
    }
}
