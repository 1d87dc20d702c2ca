pub mod config;
pub mod db;
pub mod entities;
pub mod error;
pub mod gazetteer;
pub mod handlers;
pub mod indexing;
pub mod matching;
pub mod middleware;
pub mod routes;
pub mod utils;

use sea_orm::DatabaseConnection;

pub use config::Config;
pub use error::{AppError, AppResult};

use indexing::Indexer;
use matching::MatchingEngine;

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub config: Config,
    pub engine: MatchingEngine,
    pub indexer: Indexer,
}

impl AppState {
    pub fn new(db: DatabaseConnection, config: Config) -> AppResult<Self> {
        let indexer = Indexer {
            db: db.clone(),
            routing: indexing::RoutingClient::from_config(&config)?,
            locks: indexing::IndexLocks::new(),
            snap_radius_km: config.route_snap_radius_km,
        };

        Ok(Self {
            engine: MatchingEngine::new(config.score_weights),
            db,
            config,
            indexer,
        })
    }
}
