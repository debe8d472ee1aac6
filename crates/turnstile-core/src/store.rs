//! The `RecordStore` trait — the persistence and change-notification
//! contract consumed by the client layers.
//!
//! The trait is implemented by storage backends (e.g.
//! `turnstile-store-sqlite`). The terminal client depends on this
//! abstraction, not on any concrete backend, and receives the store handle
//! as an explicit dependency rather than reaching for process-wide state.

use std::future::Future;

use tokio::sync::broadcast;
use uuid::Uuid;

use crate::record::{NewRecord, Record, StageKey, StageStatus};

/// Abstraction over a turnstile record store backend.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes. There is no automatic retry: every failed
/// call is terminal for that user action.
pub trait RecordStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Create and persist a new record.
  ///
  /// The store assigns the id and creation time, initialises all three
  /// stages to pending, and computes `code_payload` from the supplied
  /// identity fields. Field formats are the form's responsibility; the
  /// store accepts what it is given.
  fn create(
    &self,
    input: NewRecord,
  ) -> impl Future<Output = Result<Record, Self::Error>> + Send + '_;

  /// Retrieve a record by id. Returns `None` if not found.
  fn get(
    &self,
    record_id: Uuid,
  ) -> impl Future<Output = Result<Option<Record>, Self::Error>> + Send + '_;

  /// List all records, newest creation time first.
  fn list(
    &self,
  ) -> impl Future<Output = Result<Vec<Record>, Self::Error>> + Send + '_;

  /// Unconditionally set a stage's status: `Checked` stamps the current
  /// time as the scan time, `Pending` clears it.
  ///
  /// No guard against re-checking or out-of-order checking — this is the
  /// raw contract operation, and re-invoking it simply refreshes the
  /// timestamp. Scan-driven advancement goes through
  /// [`RecordStore::advance_stage`] instead.
  fn update_stage(
    &self,
    record_id: Uuid,
    stage: StageKey,
    status: StageStatus,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// The guarded `Pending → Checked` transition used by the scan path.
  ///
  /// Fails if the stage is already checked. Returns the updated record.
  fn advance_stage(
    &self,
    record_id: Uuid,
    stage: StageKey,
  ) -> impl Future<Output = Result<Record, Self::Error>> + Send + '_;

  /// Subscribe to change notifications.
  ///
  /// Every change to the underlying table delivers the full, freshly
  /// queried, newest-first record list. Dropping the receiver ends the
  /// subscription; a lagged receiver should fall back to an explicit
  /// [`RecordStore::list`].
  fn subscribe(&self) -> broadcast::Receiver<Vec<Record>>;
}
