//! Progress callback trait
//!
//! Lets the transaction report progress without depending on a specific
//! terminal UI.

use crate::error::ProviderError;
use crate::outcome::RollbackEntry;
use crate::types::{Handle, ResourceKind};

/// Progress callback for provisioning operations
pub trait ProgressCallback {
    /// Called before a step's create call is issued
    ///
    /// `index` is 1-based.
    fn on_step_start(&mut self, index: usize, total: usize, kind: ResourceKind, name: &str);

    /// Called when a step's create call returns
    fn on_step_complete(
        &mut self,
        kind: ResourceKind,
        name: &str,
        result: Result<&Handle, &ProviderError>,
    );

    /// Called before unwinding `count` resources
    fn on_rollback_start(&mut self, count: usize);

    /// Called before a single delete is issued
    fn on_delete_start(&mut self, kind: ResourceKind, name: &str);

    /// Called after each rollback/teardown entry is settled
    fn on_rollback_entry(&mut self, entry: &RollbackEntry);
}

/// No-op progress callback
pub struct NoProgress;

impl ProgressCallback for NoProgress {
    fn on_step_start(&mut self, _index: usize, _total: usize, _kind: ResourceKind, _name: &str) {}
    fn on_step_complete(
        &mut self,
        _kind: ResourceKind,
        _name: &str,
        _result: Result<&Handle, &ProviderError>,
    ) {
    }
    fn on_rollback_start(&mut self, _count: usize) {}
    fn on_delete_start(&mut self, _kind: ResourceKind, _name: &str) {}
    fn on_rollback_entry(&mut self, _entry: &RollbackEntry) {}
}
