//! # lambda-view-sync
//!
//! Keeps a local view of one running strategy in sync and publishes
//! parameter edits back to it.
//!
//! ```text
//!  StrategyStates:{i} ──► Session ──┐
//!                                   ├──► SharedStore ──► rows()
//!  StrategyParams:{i} ──► Session ──┘
//!
//!  submit_edit(key, raw) ──► EditGateway ──► UpdateParam:{i}
//! ```
//!
//! [`TargetController`] ties it together: it owns the connection for the
//! selected target, the two sessions and the store.
//!
//! # Example
//!
//! ```rust,no_run
//! use lambda_view_core::Target;
//! use lambda_view_sync::{SyncConfig, TargetController};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let mut controller = TargetController::with_config(&SyncConfig::default());
//! controller
//!     .select(Some(Target::new("redis://127.0.0.1:6379", "swap-mm-ethusd")))
//!     .await?;
//!
//! let mut changes = controller.changes();
//! changes.changed().await?;
//! for row in controller.rows() {
//!     println!("{} {} = {}", row.group, row.key, row.value);
//! }
//!
//! controller.submit_edit("state", "Live").await?;
//! # Ok(())
//! # }
//! ```

pub mod cancel;
pub mod config;
pub mod controller;
pub mod error;
pub mod gateway;
pub mod session;
pub mod store;

pub use cancel::CancelToken;
pub use config::SyncConfig;
pub use controller::TargetController;
pub use error::{ControllerError, EditError, Result};
pub use gateway::{run_state_entry, Ack, EditGateway};
pub use session::{Session, SessionHandle, SessionId, SessionState};
pub use store::{Generation, SharedStore, SnapshotStore};
