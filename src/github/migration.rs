//! Github migration payloads
use serde::{Deserialize, Serialize};

use crate::platform::{MigrationJob, MigrationState};

/// Github Migration, as returned by the start and status endpoints
#[derive(Deserialize, Serialize, Default, Debug, Clone)]
pub struct MigrationGithub {
    /// Migration ID
    pub id: u64,

    /// Migration state (pending, exporting, exported, failed)
    pub state: String,
}

impl From<MigrationGithub> for MigrationJob {
    fn from(migration: MigrationGithub) -> Self {
        MigrationJob {
            id: migration.id,
            state: MigrationState::from(migration.state.as_str()),
        }
    }
}
