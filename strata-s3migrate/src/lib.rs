//! # strata-s3migrate
//!
//! Versioned migrations for the objects of an S3 bucket.
//!
//! Instead of a schema, a migration changes which objects a bucket holds.
//! Each migration body is a JSON array of `UPLOAD` and `DELETE` statements;
//! uploads copy files from an [`AssetSource`] into the bucket. The applied
//! version lives in the bucket itself, in the [`STATE_KEY`] object:
//!
//! ```json
//! {"version": 3, "dirty": false}
//! ```
//!
//! A version of `-1` means nothing has been applied. `dirty` is set while a
//! migration runs and stays set if it fails; [`Migrator::up`] refuses to run
//! until the version is forced.
//!
//! ## Example
//!
//! ```rust,no_run
//! use strata_s3migrate::{
//!     DirAssets, DirSource, EnvExpandingSource, Migrator, S3Driver, S3DriverConfig,
//!     S3ObjectStore,
//! };
//!
//! # async fn run() -> Result<(), strata_s3migrate::MigrationError> {
//! let config = S3DriverConfig::from_dsn("s3migrator://media?region=eu-west-1")?;
//! let store = S3ObjectStore::connect(&config).await?;
//! let driver = S3Driver::open(store, DirAssets::new("./assets")).await?;
//!
//! let source = EnvExpandingSource::new(DirSource::open("./migrations").await?);
//! let applied = Migrator::new(driver, source).up().await?;
//! println!("applied {:?}", applied);
//! # Ok(())
//! # }
//! ```
//!
//! The driver takes no locks. Running two migrators against one bucket at
//! the same time is not safe.

pub mod assets;
pub mod config;
pub mod content_type;
pub mod driver;
pub mod env;
pub mod error;
pub mod runner;
#[cfg(feature = "s3")]
pub mod s3;
pub mod source;
pub mod state;
pub mod statement;
pub mod store;

pub use assets::{AssetSource, DirAssets, MemoryAssets};
pub use config::{S3DriverConfig, StaticCredentials};
pub use content_type::{content_type_for, extension_of};
pub use driver::{Driver, S3Driver};
pub use env::{EnvSource, MapEnv, StdEnv};
pub use error::{MigrateResult, MigrationError};
pub use runner::Migrator;
#[cfg(feature = "s3")]
pub use s3::S3ObjectStore;
pub use source::{DirSource, EnvExpandingSource, MemorySource, MigrationSource};
pub use state::{DRIVER_NAME, MigrationState, NIL_VERSION, STATE_KEY};
pub use statement::{Action, Statement, parse_statements};
pub use store::{MemoryObjectStore, Metadata, ObjectStore, StoredObject};
