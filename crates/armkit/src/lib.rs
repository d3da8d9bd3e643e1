//! # armkit
//!
//! Blocking Azure Resource Manager backend for the `provision` crate.
//!
//! This crate provides:
//! - [`ArmClient`], an implementation of [`provision::CloudApi`] over HTTPS
//! - Long-running operation polling (`Azure-AsyncOperation`, `Location`,
//!   `provisioningState`) bounded by a maximum wait
//! - Decoding of ARM error bodies into [`provision::ProviderError`]
//! - Credential providers: environment service principal, Azure CLI, and a
//!   default chain of both
//!
//! ## Example
//!
//! ```no_run
//! use armkit::{ArmClient, ClientSettings, DefaultCredential};
//! use provision::{NoProgress, Provisioner};
//!
//! # fn demo(request: provision::ProvisionRequest) -> provision::Result<()> {
//! let provisioner = Provisioner::connect(&DefaultCredential::new(), |credential| {
//!     ArmClient::new(&request.subscription_id, credential, ClientSettings::default())
//! })?;
//! let outcome = provisioner.provision(&request, &mut NoProgress)?;
//! println!("success: {}", outcome.is_success());
//! # Ok(())
//! # }
//! ```

pub mod body;
pub mod client;
pub mod credential;
pub mod error;
pub mod lro;
pub mod path;
pub mod transport;

pub use client::{ArmClient, ClientSettings};
pub use credential::{AzureCliCredential, DefaultCredential, EnvironmentCredential};
pub use error::{Error, Result};
pub use path::ArmPaths;
