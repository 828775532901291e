//! Creates one folder per identifier listed in a CSV file.
//!
//! # Core Concepts
//!
//! *   **[`Identifier`]:** A non-blank value from the identifier column of one
//!     row, used verbatim as a folder name.
//! *   **[`RecordExtractor`]:** Streams identifiers out of a delimited text file
//!     with a header row. The column is chosen by header label, by default
//!     `Base Document Reference`.
//! *   **[`Materializer`]:** Checks which identifiers lack a folder under the
//!     destination root and creates those folders concurrently. Each identifier
//!     gets its own [`CreationOutcome`]; failures are collected, not raised.
//! *   **[`FolderCreator`]:** The entry point. Validates both paths, extracts,
//!     materializes and returns a [`BatchResult`].
//! *   **[`DestinationStore`]:** Remembers the last destination in a one-line
//!     text file. It is used by callers, never by the engine itself.
//!
//! # Error Handling
//!
//! Missing inputs and unparsable source files abort the batch before any
//! folder is created ([`batch::Error`]). A folder that cannot be created only
//! affects its own identifier ([`CreationError`]).
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use std::path::Path;
//! use folder_creator_core::{CreatorConfig, FolderCreator};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let creator = FolderCreator::new(&CreatorConfig::default());
//!     let result = creator
//!         .create_folders(Path::new("orders.csv"), Path::new("/srv/jobs"))
//!         .await?;
//!     println!("{}", result.message());
//!     Ok(())
//! }
//! ```

pub mod batch;
pub mod config;
pub mod destination;
pub mod extract;
pub mod identifier;
pub mod materialize;

pub use batch::{FolderCreator, create_folders};
pub use config::CreatorConfig;
pub use destination::{DestinationStore, PersistenceError};
pub use extract::{Identifiers, ParseError, RecordExtractor};
pub use identifier::{Identifier, InvalidIdentifier};
pub use materialize::{
    BatchResult, BatchSummary, CreationError, CreationOutcome, MaterializeError, Materializer,
    Plan,
};
