pub mod api;
pub mod clock;
pub mod config;
pub mod db;
pub mod directory;
pub mod domain;
pub mod engine;
pub mod error;
pub mod seed;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::Config;
pub use db::{init_db, Repository};
pub use directory::{CatalogStore, ManagerRegistry, MockDirectory, SqliteDirectory};
pub use domain::{
    Actor, BusinessDate, ManagerLock, MarketId, NoteType, Price, PriceRound, ProductId, ProfileId,
    Role, RoundId, RoundItem, RoundStatus, UnitId,
};
pub use engine::{RoundEngine, RoundError};
pub use error::AppError;
