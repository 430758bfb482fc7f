//! # State Module
//!
//! The two pieces of state every command can ask for.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    State Architecture                                   │
//! │                                                                         │
//! │  lib.rs::run()                                                         │
//! │    ConfigState::load()  ──►  DbState::open(config.database_path())     │
//! │          │                           │                                  │
//! │          ▼                           ▼                                  │
//! │  ┌──────────────────┐        ┌──────────────────┐                      │
//! │  │   ConfigState    │        │     DbState      │                      │
//! │  │                  │        │                  │                      │
//! │  │  store name      │        │  Database        │                      │
//! │  │  currency        │        │  (SQLite pool)   │                      │
//! │  │  database path   │        │  current user    │                      │
//! │  └──────────────────┘        └──────────────────┘                      │
//! │                                                                         │
//! │  Commands declare exactly what they need:                              │
//! │    category::run(&db, cmd)                                             │
//! │    report::run(&db, &config, cmd)                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod config;
mod db;

pub use config::{ConfigState, ENV_CONFIG, ENV_CURRENCY, ENV_DB_PATH, ENV_STORE_NAME};
pub use db::DbState;
