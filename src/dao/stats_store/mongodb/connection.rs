use std::time::Duration;

use mongodb::{Client, Database, bson::doc};
use tokio::time::sleep;
use tracing::debug;

use super::{
    config::MongoConfig,
    error::{MongoDaoError, MongoResult},
};

/// Attempts made before giving up; the storage supervisor owns long-term retries.
const CONNECT_ATTEMPTS: u32 = 3;
const CONNECT_PAUSE: Duration = Duration::from_millis(300);

/// Live client plus the database holding the hockey collections.
pub struct MongoConnection {
    #[allow(dead_code)]
    pub client: Client,
    pub database: Database,
}

impl MongoConnection {
    /// Open a client for `config` and wait for the server to answer a ping.
    pub async fn open(config: &MongoConfig) -> MongoResult<Self> {
        let client = Client::with_options(config.options.clone())
            .map_err(|source| MongoDaoError::ClientConstruction { source })?;
        let database = client.database(&config.database_name);

        let mut attempt = 1;
        loop {
            match ping(&database).await {
                Ok(()) => return Ok(Self { client, database }),
                Err(source) if attempt >= CONNECT_ATTEMPTS => {
                    return Err(MongoDaoError::Unreachable {
                        database: config.database_name.clone(),
                        attempts: attempt,
                        source,
                    });
                }
                Err(err) => {
                    debug!(attempt, error = %err, "MongoDB not answering yet");
                    attempt += 1;
                    sleep(CONNECT_PAUSE).await;
                }
            }
        }
    }
}

pub async fn ping(database: &Database) -> Result<(), mongodb::error::Error> {
    database.run_command(doc! { "ping": 1 }).await.map(|_| ())
}
