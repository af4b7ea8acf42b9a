use mongodb::error::Error as MongoError;
use thiserror::Error;

pub type MongoResult<T> = Result<T, MongoDaoError>;

/// Failures of the MongoDB stats backend, tagged with the collection involved.
#[derive(Debug, Error)]
pub enum MongoDaoError {
    #[error("environment variable `{var}` is required for the mongo backend")]
    MissingEnvVar { var: &'static str },
    #[error("invalid MongoDB URI `{uri}`")]
    InvalidUri {
        uri: String,
        #[source]
        source: MongoError,
    },
    #[error("could not build MongoDB client")]
    ClientConstruction {
        #[source]
        source: MongoError,
    },
    #[error("database `{database}` unreachable after {attempts} ping(s)")]
    Unreachable {
        database: String,
        attempts: u32,
        #[source]
        source: MongoError,
    },
    #[error("MongoDB health ping failed")]
    HealthPing {
        #[source]
        source: MongoError,
    },
    #[error("creating index `{index}` on `{collection}` failed")]
    EnsureIndex {
        collection: &'static str,
        index: &'static str,
        #[source]
        source: MongoError,
    },
    #[error("write to `{collection}` failed")]
    Write {
        collection: &'static str,
        #[source]
        source: MongoError,
    },
    #[error("read from `{collection}` failed")]
    Read {
        collection: &'static str,
        #[source]
        source: MongoError,
    },
    #[error("`{collection}` holds a malformed uuid `{value}`")]
    InvalidId {
        collection: &'static str,
        value: String,
    },
}
