//! # Provision
//!
//! Transactional provisioning of a cloud virtual machine and its networking
//! dependencies.
//!
//! Standing up a VM takes six dependent resources. They are created one at a
//! time, and if any creation fails everything already created is deleted
//! again in reverse order.
//!
//! ## Core Concepts
//!
//! - **Step**: one resource to create, with a closure that builds its
//!   properties from the handles of earlier steps
//! - **Planner**: produces the fixed step list
//!   (VNet → Subnet → NSG → PublicIP → NIC → VM)
//! - **Executor**: runs steps forward and records each committed one
//! - **Compensator**: deletes committed steps last-first, never stopping on
//!   an individual failure
//!
//! ## Example
//!
//! ```ignore
//! use provision::{NoProgress, Provisioner};
//!
//! let provisioner = Provisioner::connect(&credentials, |cred| MyCloud::new(cred))?;
//! match provisioner.provision(&request, &mut NoProgress)?.into_result() {
//!     Ok(vm) => println!("created {}", vm.id),
//!     Err(failure) => {
//!         eprintln!("{failure}");
//!         for entry in failure.rollback().failed() {
//!             eprintln!("  left behind: {} {}", entry.kind, entry.name);
//!         }
//!     }
//! }
//! ```
//!
//! ## Provider Traits
//!
//! - [`CloudApi`]: management operations, each blocking until terminal
//! - [`CredentialProvider`]: acquires the credential for the client
//! - [`ProgressCallback`]: receives progress updates

pub mod cloud;
pub mod compensator;
pub mod context;
pub mod credential;
pub mod error;
pub mod executor;
pub mod outcome;
pub mod planner;
pub mod provisioner;
pub mod types;

// Re-export main types at crate root
pub use cloud::CloudApi;
pub use compensator::{rollback, teardown};
pub use context::{NoProgress, ProgressCallback};
pub use credential::{Credential, CredentialProvider};
pub use error::{ErrorCategory, ProviderError, ProvisionError, Result};
pub use executor::execute;
pub use outcome::{
    CommittedStep, PartialRollbackError, ProvisionFailure, ProvisionOutcome, RollbackEntry,
    RollbackReport, RollbackStatus, StepFailure,
};
pub use planner::{Outputs, STEP_ORDER, Step, plan, teardown_targets};
pub use provisioner::Provisioner;
pub use types::{
    DEFAULT_OS_DISK_TYPE, Handle, ImageReference, IpAllocation, ProvisionRequest, ResourceKind,
    ResourceNames, ResourceRef, ResourceSpec, SecurityRule, VmSpec,
};
