//! Word assassin HTTP server.
//!
//! Replays the event log on startup and refuses to serve if the log is
//! inconsistent. Without `--database-url` everything lives in memory and is
//! lost on exit.

use assassin_server::{
    AddGameError, AddPlayerError, AdmissionError, DictionaryError, Handler, RegistryConfig,
    StartGameError,
};
use assassin_store::{DocumentStore, MemoryStore, PgStore, PgStoreConfig};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use clap::Parser;
use serde::Deserialize;
use std::{sync::Arc, time::Duration};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "wordassassin-server")]
#[command(about = "Word assassin game server")]
struct Args {
    /// Port to listen on
    #[arg(long, env = "PORT", default_value = "8080")]
    port: u16,

    /// Postgres URL for the event log. In-memory when absent.
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    /// Players required before a game may start
    #[arg(long, default_value_t = assassin_core::MINIMUM_PLAYERS)]
    min_players: usize,

    /// Upper bound on any single store operation
    #[arg(long, default_value = "10")]
    store_timeout_secs: u64,
}

#[derive(Deserialize, Default)]
struct CreateGameParams {
    #[serde(default)]
    dictionary: String,
    #[serde(default)]
    passcode: String,
}

#[derive(Deserialize, Default)]
struct AddPlayerParams {
    #[serde(default)]
    name: String,
    #[serde(default)]
    email: String,
}

/// An error response: status code plus the message shown to the caller.
struct ApiError(StatusCode, String);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.0, self.1).into_response()
    }
}

impl From<AddGameError> for ApiError {
    fn from(e: AddGameError) -> Self {
        let status = match &e {
            AddGameError::Validation(_) => StatusCode::BAD_REQUEST,
            AddGameError::Duplicate(_) => StatusCode::CONFLICT,
            AddGameError::PoolOutOfSync(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AddGameError::Store(_) => StatusCode::SERVICE_UNAVAILABLE,
        };
        ApiError(status, e.to_string())
    }
}

impl From<AddPlayerError> for ApiError {
    fn from(e: AddPlayerError) -> Self {
        let status = match &e {
            AddPlayerError::Validation(_) | AddPlayerError::GameMismatch { .. } => {
                StatusCode::BAD_REQUEST
            }
            AddPlayerError::NotAcceptingPlayers(AdmissionError::NotFound(_)) => {
                StatusCode::NOT_FOUND
            }
            AddPlayerError::NotAcceptingPlayers(AdmissionError::NotAccepting { .. })
            | AddPlayerError::Duplicate { .. } => StatusCode::CONFLICT,
            AddPlayerError::PoolOutOfSync(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AddPlayerError::Store(_) => StatusCode::SERVICE_UNAVAILABLE,
        };
        ApiError(status, e.to_string())
    }
}

impl From<StartGameError> for ApiError {
    fn from(e: StartGameError) -> Self {
        let status = match &e {
            StartGameError::MissingArgument | StartGameError::InvalidRequester(_) => {
                StatusCode::BAD_REQUEST
            }
            StartGameError::NotFound(_) => StatusCode::NOT_FOUND,
            StartGameError::NotCreator { .. } => StatusCode::FORBIDDEN,
            StartGameError::WrongState { .. }
            | StartGameError::InsufficientPlayers { .. }
            | StartGameError::InvalidDictionary { .. } => StatusCode::CONFLICT,
            StartGameError::PoolOutOfSync(_) => StatusCode::INTERNAL_SERVER_ERROR,
            StartGameError::Store(_) => StatusCode::SERVICE_UNAVAILABLE,
        };
        ApiError(status, e.to_string())
    }
}

impl From<DictionaryError> for ApiError {
    fn from(e: DictionaryError) -> Self {
        let status = match &e {
            DictionaryError::Invalid(_) => StatusCode::BAD_REQUEST,
            DictionaryError::Duplicate { .. } => StatusCode::CONFLICT,
            DictionaryError::Store(_) => StatusCode::SERVICE_UNAVAILABLE,
        };
        ApiError(status, e.to_string())
    }
}

type AppState = Arc<Handler>;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let store: Arc<dyn DocumentStore> = match &args.database_url {
        Some(url) => {
            let mut config = PgStoreConfig::new(url.clone());
            config.op_timeout = Duration::from_secs(args.store_timeout_secs);
            let store = PgStore::connect_lazy(&config)?;
            store.ensure_schema().await?;
            tracing::info!("Event log: postgres");
            Arc::new(store)
        }
        None => {
            tracing::warn!("DATABASE_URL not set, games will not survive a restart");
            Arc::new(MemoryStore::new())
        }
    };

    let config = RegistryConfig {
        min_players: args.min_players,
        seed: None,
    };
    let handler = match Handler::open(store, config).await {
        Ok(handler) => Arc::new(handler),
        Err(e) => {
            tracing::error!(error = %e, "reconciliation failed, refusing to start");
            return Err(e.into());
        }
    };

    let app = Router::new()
        .route("/", get(health_check))
        .route("/health", get(health_check))
        .route("/gamestatus/{game_id}", get(game_status))
        .route("/gameslist", get(games_list))
        .route("/creategame/{game_id}/{creator}", post(create_game))
        .route("/addplayer/{game_id}/{participant_id}", post(add_player))
        .route("/startgame/{game_id}/{requester}", post(start_game))
        .route("/addword/{dictionary}/{word}", post(add_word))
        .layer(TraceLayer::new_for_http())
        .with_state(handler);

    let listener = TcpListener::bind(("0.0.0.0", args.port)).await?;
    tracing::info!("Listening on http://0.0.0.0:{}", args.port);
    axum::serve(listener, app).await?;

    Ok(())
}

async fn health_check() -> &'static str {
    "I'm running!"
}

async fn game_status(State(handler): State<AppState>, Path(game_id): Path<String>) -> Response {
    match handler.game_status(&game_id).await {
        Some(report) => report.into_response(),
        None => (StatusCode::NOT_FOUND, format!("Game {game_id} not found")).into_response(),
    }
}

async fn games_list(State(handler): State<AppState>) -> String {
    handler.games_list().await
}

async fn create_game(
    State(handler): State<AppState>,
    Path((game_id, creator)): Path<(String, String)>,
    Query(params): Query<CreateGameParams>,
) -> Result<String, ApiError> {
    Ok(handler
        .create_game(&game_id, &creator, &params.dictionary, &params.passcode)
        .await?)
}

async fn add_player(
    State(handler): State<AppState>,
    Path((game_id, participant_id)): Path<(String, String)>,
    Query(params): Query<AddPlayerParams>,
) -> Result<String, ApiError> {
    Ok(handler
        .add_player(&game_id, &participant_id, &params.name, &params.email)
        .await?)
}

async fn start_game(
    State(handler): State<AppState>,
    Path((game_id, requester)): Path<(String, String)>,
) -> Result<String, ApiError> {
    Ok(handler.start_game(&game_id, &requester).await?)
}

async fn add_word(
    State(handler): State<AppState>,
    Path((dictionary, word)): Path<(String, String)>,
) -> Result<String, ApiError> {
    Ok(handler.add_word(&dictionary, &word).await?)
}
