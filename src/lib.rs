//! Streaming decoder and writer for `name:id` user records, plus a small
//! sort-by-second-field pipeline for two-column CSV files.
//!
//! ```no_run
//! use tokio_util::sync::CancellationToken;
//! use user_records::decode_users;
//!
//! # async fn run() {
//! let mut users = decode_users(CancellationToken::new(), "alice:1\nbob:2\n".as_bytes());
//! while let Some(result) = users.recv().await {
//!     match result {
//!         Ok(user) => println!("{user}"),
//!         Err(err) => eprintln!("stopped: {err}"),
//!     }
//! }
//! # }
//! ```

pub mod blocking;
pub mod config;
pub mod csv_records;
pub mod decoder;
pub mod error;
pub mod pipeline;
pub mod record;
pub mod writer;

pub use config::{CsvConfig, PipelineConfig};
pub use csv_records::CsvRecord;
pub use decoder::{decode_user_stream, decode_users, decode_users_with, DecodeResult};
pub use error::{ConfigError, CsvError, RecordError};
pub use pipeline::{copy_users, copy_users_with, CopySummary};
pub use record::{parse_user, User};
pub use writer::write_user;
