use assassin_core::{ring_cycle_len, GameStatus, KillWord, TargetAssignment, WordList};
use assassin_server::{
    AddGameError, AddPlayerError, AdmissionError, GameRegistry, Handler, PlayerRegistry,
    ReconcileError, RegistryConfig, StartGameError,
};
use assassin_store::{collections, DocumentStore, MemoryStore};
use std::collections::HashSet;
use std::sync::Arc;

fn words() -> Arc<WordList> {
    Arc::new(
        ["aardvark", "bramble", "cobbler", "doorknob"]
            .iter()
            .map(|w| KillWord::new("d", w).unwrap())
            .collect(),
    )
}

fn config() -> RegistryConfig {
    RegistryConfig {
        min_players: 5,
        seed: Some(7),
    }
}

async fn open(store: Arc<MemoryStore>) -> Result<GameRegistry, ReconcileError> {
    GameRegistry::open(store, Arc::new(PlayerRegistry::new()), words(), config()).await
}

async fn add_players(registry: &GameRegistry, game_id: &str, participants: &[&str]) {
    for p in participants {
        let fact = assassin_core::PlayerAddedFact::new(game_id, p, p, "").unwrap();
        registry.add_player_to_game(game_id, fact).await.unwrap();
    }
}

#[tokio::test]
async fn test_distinct_games_are_independent() {
    let registry = open(Arc::new(MemoryStore::new())).await.unwrap();
    registry.add_game("g1", "U1", "d", "p").await.unwrap();
    registry.add_game("g2", "W2", "d", "q").await.unwrap();

    let g1 = registry.get_game("g1").await.unwrap();
    let g2 = registry.get_game("g2").await.unwrap();
    assert_eq!(g1.creator.as_str(), "U1");
    assert_eq!(g2.creator.as_str(), "W2");
    assert_eq!(g2.passcode, "q");
}

#[tokio::test]
async fn test_duplicate_after_restart() {
    let store = Arc::new(MemoryStore::new());
    {
        let registry = open(store.clone()).await.unwrap();
        registry.add_game("g1", "U1", "d", "p").await.unwrap();
    }

    let registry = open(store).await.unwrap();
    let err = registry.add_game("g1", "U1", "d", "p").await.unwrap_err();
    assert!(matches!(err, AddGameError::Duplicate(ref id) if id == "g1"));
}

#[tokio::test]
async fn test_create_fill_and_start_game() {
    let registry = open(Arc::new(MemoryStore::new())).await.unwrap();
    registry.add_game("g1", "U1", "d", "p").await.unwrap();

    let err = registry.add_game("g1", "U1", "d", "p").await.unwrap_err();
    assert!(err.to_string().contains("g1"));

    add_players(&registry, "g1", &["UA", "UB", "UC", "UD"]).await;
    let err = registry.start_game("g1", "U1").await.unwrap_err();
    assert!(matches!(
        err,
        StartGameError::InsufficientPlayers { current: 4, .. }
    ));
    assert_eq!(
        registry.get_game("g1").await.unwrap().status,
        GameStatus::Starting
    );

    add_players(&registry, "g1", &["UE"]).await;
    let game = registry.start_game("g1", "U1").await.unwrap();
    assert_eq!(game.status, GameStatus::Playing);

    let assignments: Vec<TargetAssignment> = registry
        .players()
        .players_in_game("g1")
        .await
        .into_iter()
        .map(|p| TargetAssignment {
            target_id: p.target.clone().unwrap(),
            kill_word: p.kill_word.clone().unwrap(),
            player_id: p.id,
        })
        .collect();
    assert_eq!(assignments.len(), 5);
    for a in &assignments {
        assert_ne!(a.player_id, a.target_id);
        assert_eq!(ring_cycle_len(&assignments, &a.player_id), Some(5));
    }
    let hunted: HashSet<&str> = assignments.iter().map(|a| a.target_id.as_str()).collect();
    assert_eq!(hunted.len(), 5);
}

#[tokio::test]
async fn test_not_creator_regardless_of_state() {
    let registry = open(Arc::new(MemoryStore::new())).await.unwrap();
    registry.add_game("g1", "U1", "d", "p").await.unwrap();
    add_players(&registry, "g1", &["UA", "UB", "UC", "UD", "UE"]).await;

    let err = registry.start_game("g1", "U2").await.unwrap_err();
    assert!(matches!(err, StartGameError::NotCreator { .. }));
    assert_eq!(
        registry.get_game("g1").await.unwrap().status,
        GameStatus::Starting
    );
}

#[tokio::test]
async fn test_restart_round_trip() {
    let store = Arc::new(MemoryStore::new());
    let before = {
        let registry = open(store.clone()).await.unwrap();
        for (game, creator) in [("g1", "U1"), ("g2", "U2"), ("g3", "U3")] {
            registry.add_game(game, creator, "d", "p").await.unwrap();
        }
        add_players(&registry, "g1", &["UA", "UB", "UC", "UD", "UE"]).await;
        add_players(&registry, "g2", &["UA", "UB"]).await;
        registry.start_game("g1", "U1").await.unwrap();
        (
            registry.list_games().await,
            registry.players().players_in_game("g1").await,
        )
    };

    let registry = open(store).await.unwrap();
    let (games, g1_players) = before;
    for game in &games {
        assert_eq!(registry.get_game(&game.id).await.as_ref(), Some(game));
    }
    assert_eq!(registry.list_games().await, games);
    assert_eq!(registry.players().players_in_game("g1").await, g1_players);
    assert_eq!(registry.players().len().await, 7);
    assert_eq!(
        registry.can_add_players("g1").await,
        Err(AdmissionError::NotAccepting {
            game_id: "g1".to_string(),
            status: GameStatus::Playing,
        })
    );
}

#[tokio::test]
async fn test_store_outage_changes_nothing() {
    let store = Arc::new(MemoryStore::new());
    let registry = open(store.clone()).await.unwrap();
    registry.add_game("g1", "U1", "d", "p").await.unwrap();

    store.set_unavailable(true);
    assert!(matches!(
        registry.add_game("g2", "U1", "d", "p").await,
        Err(AddGameError::Store(_))
    ));
    let fact = assassin_core::PlayerAddedFact::new("g1", "UA", "A", "").unwrap();
    assert!(matches!(
        registry.add_player_to_game("g1", fact).await,
        Err(AddPlayerError::Store(_))
    ));

    store.set_unavailable(false);
    assert!(registry.get_game("g2").await.is_none());
    assert_eq!(registry.get_game("g1").await.unwrap().start_players, 0);
    assert!(registry.players().is_empty().await);
    assert_eq!(store.len(collections::EVENTS).await, 1);
}

#[tokio::test]
async fn test_concurrent_add_game_single_winner() {
    let registry = Arc::new(open(Arc::new(MemoryStore::new())).await.unwrap());

    let mut handles = Vec::new();
    for i in 0..16 {
        let registry = registry.clone();
        let creator = format!("U{i}");
        handles.push(tokio::spawn(async move {
            registry.add_game("race", &creator, "d", "p").await
        }));
    }

    let mut wins = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => wins += 1,
            Err(AddGameError::Duplicate(id)) => assert_eq!(id, "race"),
            Err(e) => panic!("unexpected error: {e}"),
        }
    }
    assert_eq!(wins, 1);
    assert_eq!(registry.list_games().await.len(), 1);
}

#[tokio::test]
async fn test_concurrent_joins_are_all_counted() {
    let registry = Arc::new(open(Arc::new(MemoryStore::new())).await.unwrap());
    registry.add_game("g1", "U1", "d", "p").await.unwrap();

    let mut handles = Vec::new();
    for i in 0..20 {
        let registry = registry.clone();
        handles.push(tokio::spawn(async move {
            let participant = format!("U{}", i % 10);
            let fact =
                assassin_core::PlayerAddedFact::new("g1", &participant, "", "").unwrap();
            registry.add_player_to_game("g1", fact).await
        }));
    }
    let mut admitted = 0;
    for handle in handles {
        if handle.await.unwrap().is_ok() {
            admitted += 1;
        }
    }
    assert_eq!(admitted, 10);
    assert_eq!(registry.get_game("g1").await.unwrap().start_players, 10);
    assert_eq!(registry.players().players_in_game("g1").await.len(), 10);
}

#[tokio::test]
async fn test_doubly_written_log_aborts_open() {
    let store = Arc::new(MemoryStore::new());
    let registry = open(store.clone()).await.unwrap();
    registry.add_game("g1", "U1", "d", "p").await.unwrap();

    // Same game written again under a different key, as a botched import would.
    let documents = store.read_all(collections::EVENTS).await.unwrap();
    store
        .append(collections::EVENTS, "g1-copy", &documents[0])
        .await
        .unwrap();

    let err = open(store).await.err().unwrap();
    assert!(matches!(err, ReconcileError::DuplicateGame(ref id) if id == "g1"));
}

#[tokio::test]
async fn test_handler_over_shared_store() {
    let store = Arc::new(MemoryStore::new());
    let handler = Handler::open(store.clone(), config()).await.unwrap();
    handler.add_word("d", "aardvark").await.unwrap();
    handler.create_game("g1", "U1", "d", "p").await.unwrap();
    for p in ["UA", "UB", "UC", "UD", "UE"] {
        handler.add_player("g1", p, p, "").await.unwrap();
    }
    handler.start_game("g1", "U1").await.unwrap();
    drop(handler);

    let handler = Handler::open(store, config()).await.unwrap();
    let status = handler.game_status("g1").await.unwrap();
    assert!(status.contains("Status: playing"));
    assert!(status.contains("# Players: 5"));
    assert!(handler.games_list().await.contains("g1: playing, 5 players"));
    assert!(matches!(
        handler.add_player("g1", "UF", "F", "").await,
        Err(AddPlayerError::NotAcceptingPlayers(_))
    ));
}
