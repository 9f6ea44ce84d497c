//! # lambda-view-core
//!
//! Plain data for observing and editing a running strategy:
//!
//! - [`Entry`]: one state or parameter fact with a runtime type tag
//! - [`Snapshot`]: a wholesale-replacing batch of entries for one group
//! - [`Channels`]: the `StrategyStates`/`StrategyParams`/`UpdateParam`
//!   channel names of an instance
//! - [`parse_edit`]: the value codec turning operator input into a
//!   [`TypedValue`]
//!
//! Nothing in this crate performs I/O. Transports live in
//! `lambda-view-bus`, the synchronization engine in `lambda-view-sync`.
//!
//! # Example
//!
//! ```rust
//! use lambda_view_core::{parse_edit, Channels, Group, Snapshot, TypedValue};
//!
//! let channels = Channels::for_instance("swap-mm-ethusd").unwrap();
//! assert_eq!(channels.update.to_string(), "UpdateParam:swap-mm-ethusd");
//!
//! let payload = r#"[{"group":"params","key":"size","type":"Int","value":1}]"#;
//! let snapshot = Snapshot::decode(Group::Param, payload).unwrap();
//! let edit = parse_edit(&snapshot.entries()[0], "42").unwrap();
//! assert_eq!(edit, TypedValue::Int(42));
//! ```

pub mod channel;
pub mod codec;
pub mod entry;
pub mod error;
pub mod snapshot;
pub mod target;

pub use channel::{ChannelKind, ChannelName, Channels};
pub use codec::{parse_edit, parse_edit_json, TypedValue};
pub use entry::{Entry, Group, RowId, ValueType};
pub use error::{CoercionError, Error, Result};
pub use snapshot::{encode_entries, Snapshot};
pub use target::Target;
