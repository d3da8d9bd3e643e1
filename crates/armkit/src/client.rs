//! Resource Manager client.
//!
//! [`ArmClient`] implements [`CloudApi`]: every call sends one request and
//! then waits for the long-running operation behind it to reach a terminal
//! state.

use crate::body;
use crate::error::Error;
use crate::lro::{Deadline, OperationStatus};
use crate::path::{ArmPaths, DEFAULT_ENDPOINT, VmAction};
use crate::transport::{Reply, Request, Transport, UreqTransport};
use provision::{CloudApi, Credential, Handle, ProviderError, ResourceRef, ResourceSpec};
use serde_json::Value;
use std::time::Duration;

/// Client tuning
#[derive(Debug, Clone)]
pub struct ClientSettings {
    /// Management endpoint
    pub endpoint: String,
    /// Delay between status polls when the service gives no `Retry-After`
    pub poll_interval: Duration,
    /// Upper bound on waiting for a single long-running operation
    pub max_wait: Duration,
    /// Timeout for an individual HTTP request
    pub request_timeout: Duration,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            poll_interval: Duration::from_secs(5),
            max_wait: Duration::from_secs(30 * 60),
            request_timeout: Duration::from_secs(60),
        }
    }
}

/// Blocking Azure Resource Manager client for one subscription
pub struct ArmClient<T = UreqTransport> {
    transport: T,
    credential: Credential,
    paths: ArmPaths,
    settings: ClientSettings,
}

impl ArmClient<UreqTransport> {
    pub fn new(
        subscription_id: impl Into<String>,
        credential: Credential,
        settings: ClientSettings,
    ) -> Self {
        let transport = UreqTransport::new(settings.request_timeout);
        Self::with_transport(transport, subscription_id, credential, settings)
    }
}

impl<T: Transport> ArmClient<T> {
    /// Create a client over a custom transport (useful for testing).
    pub fn with_transport(
        transport: T,
        subscription_id: impl Into<String>,
        credential: Credential,
        settings: ClientSettings,
    ) -> Self {
        let paths = ArmPaths::new(settings.endpoint.clone(), subscription_id);
        Self {
            transport,
            credential,
            paths,
            settings,
        }
    }

    pub fn paths(&self) -> &ArmPaths {
        &self.paths
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    fn send(&self, request: Request) -> Result<Reply, Error> {
        if self.credential.is_expired() {
            log::warn!("Access token has expired; requests will likely be rejected");
        }
        self.transport.send(&request.bearer(self.credential.secret()))
    }

    /// PUT a body and wait for the resource to settle; returns the final body
    fn put(&self, operation: &str, url: &str, body: Value) -> Result<Value, Error> {
        let reply = self.send(Request::put(url, body))?.error_for_status()?;
        self.settle(operation, reply, Some(url))
    }

    /// DELETE a resource and wait for the deletion to finish
    fn remove(&self, operation: &str, url: &str) -> Result<(), Error> {
        let reply = self.send(Request::delete(url))?.error_for_status()?;
        if untracked(&reply) {
            return self.await_gone(operation, url, reply.retry_after);
        }
        self.settle(operation, reply, None).map(|_| ())
    }

    /// POST an action and wait for it to finish
    fn act(&self, operation: &str, url: &str) -> Result<(), Error> {
        let reply = self.send(Request::post(url))?.error_for_status()?;
        if untracked(&reply) {
            return Err(Error::InvalidResponse(format!(
                "{operation}: accepted with no operation to follow"
            )));
        }
        self.settle(operation, reply, None).map(|_| ())
    }

    /// Poll the resource itself until it returns 404
    fn await_gone(
        &self,
        operation: &str,
        url: &str,
        retry_after: Option<Duration>,
    ) -> Result<(), Error> {
        log::debug!("{operation}: no status link, polling the resource");
        let deadline = Deadline::start(self.settings.max_wait, self.settings.poll_interval);
        let mut retry_after = retry_after;
        loop {
            deadline.pause(operation, retry_after)?;
            let poll = self.send(Request::get(url))?;
            if poll.status == 404 {
                return Ok(());
            }
            retry_after = poll.error_for_status()?.retry_after;
        }
    }

    /// Follow whatever progress signal the reply carries until it is terminal
    ///
    /// With a `resource_url`, the settled resource body is fetched and
    /// returned; otherwise the last body seen is returned.
    fn settle(
        &self,
        operation: &str,
        reply: Reply,
        resource_url: Option<&str>,
    ) -> Result<Value, Error> {
        let deadline = Deadline::start(self.settings.max_wait, self.settings.poll_interval);

        if let Some(status_url) = reply.async_operation.clone() {
            log::debug!("{operation}: following async operation");
            let mut retry_after = reply.retry_after;
            loop {
                deadline.pause(operation, retry_after)?;
                let poll = self.send(Request::get(&status_url))?.error_for_status()?;
                match OperationStatus::from_async_operation(&poll.body) {
                    OperationStatus::InProgress => retry_after = poll.retry_after,
                    OperationStatus::Succeeded => break,
                    OperationStatus::Failed(err) => return Err(err),
                }
            }
            return match resource_url {
                Some(url) => Ok(self.send(Request::get(url))?.error_for_status()?.body),
                None => Ok(Value::Null),
            };
        }

        if reply.status == 202
            && let Some(location) = reply.location.clone()
        {
            log::debug!("{operation}: following location");
            let mut retry_after = reply.retry_after;
            let done = loop {
                deadline.pause(operation, retry_after)?;
                let poll = self.send(Request::get(&location))?;
                if poll.status != 202 {
                    break poll.error_for_status()?;
                }
                retry_after = poll.retry_after;
            };
            return match resource_url {
                Some(url) => Ok(self.send(Request::get(url))?.error_for_status()?.body),
                None => Ok(done.body),
            };
        }

        match (resource_url, OperationStatus::from_resource(&reply.body)) {
            (Some(_), OperationStatus::Failed(err)) => Err(err),
            (Some(url), OperationStatus::InProgress) => {
                log::debug!("{operation}: waiting on provisioning state");
                let mut retry_after = reply.retry_after;
                loop {
                    deadline.pause(operation, retry_after)?;
                    let poll = self.send(Request::get(url))?.error_for_status()?;
                    match OperationStatus::from_resource(&poll.body) {
                        OperationStatus::InProgress => retry_after = poll.retry_after,
                        OperationStatus::Succeeded => return Ok(poll.body),
                        OperationStatus::Failed(err) => return Err(err),
                    }
                }
            }
            _ => Ok(reply.body),
        }
    }

    fn handle(body: &Value, fallback_id: String, name: &str) -> Handle {
        let id = body
            .get("id")
            .and_then(Value::as_str)
            .map_or(fallback_id, str::to_string);
        Handle::new(id, name)
    }
}

/// 202 Accepted with neither an async-operation nor a location header
fn untracked(reply: &Reply) -> bool {
    reply.status == 202 && reply.async_operation.is_none() && reply.location.is_none()
}

impl<T: Transport> CloudApi for ArmClient<T> {
    fn ensure_resource_group(&self, name: &str, location: &str) -> Result<Handle, ProviderError> {
        log::info!("Ensuring resource group {name} in {location}");
        let url = self.paths.resource_group_url(name);
        let body = self.put(
            &format!("create resource group {name}"),
            &url,
            body::resource_group(location),
        )?;
        Ok(Self::handle(&body, self.paths.resource_group_id(name), name))
    }

    fn delete_resource_group(&self, name: &str) -> Result<(), ProviderError> {
        log::info!("Deleting resource group {name}");
        let url = self.paths.resource_group_url(name);
        self.remove(&format!("delete resource group {name}"), &url)
            .map_err(ProviderError::from)
    }

    fn create_or_update(
        &self,
        resource_group: &str,
        spec: &ResourceSpec,
    ) -> Result<Handle, ProviderError> {
        let target = spec.target();
        let url = self.paths.resource_url(resource_group, &target);
        log::debug!("PUT {url}");

        let operation = format!("create {} {}", spec.kind(), spec.name());
        let body = self.put(&operation, &url, body::resource(spec))?;
        Ok(Self::handle(
            &body,
            self.paths.resource_id(resource_group, &target),
            spec.name(),
        ))
    }

    fn delete(&self, resource_group: &str, target: &ResourceRef) -> Result<(), ProviderError> {
        let url = self.paths.resource_url(resource_group, target);
        log::debug!("DELETE {url}");
        self.remove(&format!("delete {} {}", target.kind, target.name), &url)
            .map_err(ProviderError::from)
    }

    fn power_off(&self, resource_group: &str, vm: &str) -> Result<(), ProviderError> {
        let url = self.paths.vm_action_url(resource_group, vm, VmAction::PowerOff);
        self.act(&format!("power off {vm}"), &url)
            .map_err(ProviderError::from)
    }

    fn deallocate(&self, resource_group: &str, vm: &str) -> Result<(), ProviderError> {
        let url = self.paths.vm_action_url(resource_group, vm, VmAction::Deallocate);
        self.act(&format!("deallocate {vm}"), &url)
            .map_err(ProviderError::from)
    }
}
