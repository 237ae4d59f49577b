//! Azure Resource Manager adapter: implements every compute port over REST.
//!
//! One `ArmClient` is built per run around a `TokenCache` and passed to the
//! orchestrator. Transient failures (transport errors, 429, 5xx) are retried
//! with bounded exponential backoff. A 401 reacquires the token and is retried
//! once. Everything else surfaces immediately as a typed `ProviderError`.

use std::time::Duration;

use anyhow::{Context, Result};
use arm_types::compute::{
    DataDisk, Disk, HardwareProfile, ManagedDiskParameters, NetworkInterfaceReference,
    NetworkInterfaceReferenceProperties, NetworkProfile, OsDisk, Snapshot, StorageProfile,
    VirtualMachine, VirtualMachineProperties,
};
use arm_types::error::{ErrorBody, ErrorResponse};
use arm_types::operation::{AsyncOperation, OperationState};
use arm_types::sku::SkuList;
use reqwest::header::{HeaderMap, LOCATION, RETRY_AFTER};
use reqwest::{Method, StatusCode};

use crate::application::ports::{
    CatalogSku, CredentialProvider, DiskInspector, InstanceLifecycle, ManagedDisk,
    OperationHandle, OperationPoller, OperationStatus, SkuCatalog, SnapshotRequest,
    SnapshotWriter, StatusMonitor, VmCreateSpec, VmInspector,
};
use crate::domain::config::{AzureConfig, RetryConfig};
use crate::domain::{DiskKind, DiskRef, ProviderError, VmSnapshot};
use crate::infra::credential::TokenCache;

const ASYNC_OPERATION_HEADER: &str = "azure-asyncoperation";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
const ATTACH: &str = "Attach";

/// REST client for the `Microsoft.Compute` provider of one subscription.
pub struct ArmClient<C> {
    http: reqwest::Client,
    endpoint: String,
    subscription_id: String,
    tokens: TokenCache<C>,
    api: AzureConfig,
    max_elapsed: Duration,
    initial_interval: Duration,
}

impl<C: CredentialProvider> ArmClient<C> {
    /// `tokens` must be scoped to `subscription_id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(
        api: &AzureConfig,
        retry: &RetryConfig,
        subscription_id: &str,
        tokens: TokenCache<C>,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("az-zone-migrate/", env!("CARGO_PKG_VERSION")))
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("cannot build HTTP client")?;
        Ok(Self {
            http,
            endpoint: api.endpoint.trim_end_matches('/').to_string(),
            subscription_id: subscription_id.to_string(),
            tokens,
            api: api.clone(),
            max_elapsed: retry.max_elapsed(),
            initial_interval: Duration::from_millis(500),
        })
    }

    /// Override the first retry delay (tests use a few milliseconds).
    #[must_use]
    pub fn with_initial_retry_interval(mut self, interval: Duration) -> Self {
        self.initial_interval = interval;
        self
    }

    fn vm_url(&self, resource_group: &str, vm_name: &str, suffix: &str) -> String {
        format!(
            "{}/subscriptions/{}/resourceGroups/{resource_group}/providers/Microsoft.Compute/virtualMachines/{vm_name}{suffix}?api-version={}",
            self.endpoint, self.subscription_id, self.api.compute_api_version
        )
    }

    fn backoff(&self) -> backoff::ExponentialBackoff {
        backoff::ExponentialBackoff {
            initial_interval: self.initial_interval,
            max_elapsed_time: Some(self.max_elapsed),
            ..Default::default()
        }
    }

    /// Send one request. A rejected token is replaced and the request sent
    /// once more.
    async fn send(
        &self,
        method: Method,
        url: &str,
        body: Option<&serde_json::Value>,
    ) -> Result<reqwest::Response> {
        let token = self.tokens.bearer().await?;
        match self.send_with(&token, &method, url, body).await {
            Err(err) if err.is_unauthorized() => {
                tracing::info!("{method} {url} was rejected: {err}");
                let token = self.tokens.refresh(&token).await?;
                Ok(self.send_with(&token, &method, url, body).await?)
            }
            result => Ok(result?),
        }
    }

    /// Send one request with `token`, retrying transient failures. Non-2xx
    /// responses are decoded into a `ProviderError`.
    async fn send_with(
        &self,
        token: &str,
        method: &Method,
        url: &str,
        body: Option<&serde_json::Value>,
    ) -> Result<reqwest::Response, ProviderError> {
        let attempt = || {
            let mut req = self.http.request(method.clone(), url).bearer_auth(token);
            if let Some(body) = body {
                req = req.json(body);
            }
            async move {
                let resp = req.send().await.map_err(|e| {
                    backoff::Error::transient(ProviderError::Transient(e.to_string()))
                })?;
                let status = resp.status();
                if status.is_success() {
                    return Ok(resp);
                }
                let retry_after = retry_after(resp.headers());
                let text = resp.text().await.unwrap_or_default();
                let err = classify(status, &text);
                if !err.is_transient() {
                    return Err(backoff::Error::permanent(err));
                }
                Err(match retry_after {
                    Some(wait) => backoff::Error::retry_after(err, wait),
                    None => backoff::Error::transient(err),
                })
            }
        };
        backoff::future::retry_notify(self.backoff(), attempt, |err, wait: Duration| {
            tracing::info!("Retrying {method} {url} in {}ms: {err}", wait.as_millis());
        })
        .await
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T> {
        let resp = self.send(Method::GET, url, None).await?;
        resp.json::<T>()
            .await
            .with_context(|| format!("cannot decode response of GET {url}"))
    }

    async fn submit(
        &self,
        operation: String,
        method: Method,
        url: &str,
        body: Option<&serde_json::Value>,
    ) -> Result<OperationHandle> {
        let resp = self.send(method, url, body).await?;
        let handle = operation_handle(operation, resp.headers());
        tracing::debug!(
            operation = %handle.operation,
            poll_url = ?handle.poll_url,
            monitor = ?handle.monitor,
            "submitted"
        );
        Ok(handle)
    }
}

impl<C: CredentialProvider> VmInspector for ArmClient<C> {
    async fn get_vm(&self, resource_group: &str, vm_name: &str) -> Result<VmSnapshot> {
        let vm: VirtualMachine = self
            .get_json(&self.vm_url(resource_group, vm_name, ""))
            .await?;
        Ok(vm_snapshot(vm, vm_name))
    }
}

impl<C: CredentialProvider> DiskInspector for ArmClient<C> {
    async fn get_disk(&self, disk_id: &str) -> Result<ManagedDisk> {
        let url = format!(
            "{}{disk_id}?api-version={}",
            self.endpoint, self.api.disk_api_version
        );
        let disk: Disk = self.get_json(&url).await?;
        Ok(ManagedDisk {
            id: disk.id.unwrap_or_else(|| disk_id.to_string()),
            state: disk.properties.disk_state,
        })
    }
}

impl<C: CredentialProvider> SkuCatalog for ArmClient<C> {
    async fn list_skus(&self) -> Result<Vec<CatalogSku>> {
        let mut url = format!(
            "{}/subscriptions/{}/providers/Microsoft.Compute/skus?api-version={}",
            self.endpoint, self.subscription_id, self.api.sku_api_version
        );
        let mut skus = Vec::new();
        loop {
            let page: SkuList = self.get_json(&url).await?;
            skus.extend(page.value.into_iter().map(|s| CatalogSku {
                resource_type: s.resource_type,
                name: s.name,
                locations: s.locations,
            }));
            match page.next_link {
                Some(next) if !next.is_empty() => url = next,
                _ => break,
            }
        }
        tracing::debug!(count = skus.len(), "read SKU catalog");
        Ok(skus)
    }
}

impl<C: CredentialProvider> SnapshotWriter for ArmClient<C> {
    async fn begin_create_snapshot(
        &self,
        resource_group: &str,
        request: &SnapshotRequest,
    ) -> Result<OperationHandle> {
        let url = format!(
            "{}/subscriptions/{}/resourceGroups/{resource_group}/providers/Microsoft.Compute/snapshots/{}?api-version={}",
            self.endpoint, self.subscription_id, request.name, self.api.disk_api_version
        );
        let body = serde_json::to_value(Snapshot::copy_of(
            &request.source_disk_id,
            &request.location,
            &request.sku,
        ))
        .context("cannot encode snapshot request")?;
        self.submit(
            format!("create snapshot {resource_group}/{}", request.name),
            Method::PUT,
            &url,
            Some(&body),
        )
        .await
    }
}

impl<C: CredentialProvider> InstanceLifecycle for ArmClient<C> {
    async fn begin_delete_vm(
        &self,
        resource_group: &str,
        vm_name: &str,
    ) -> Result<OperationHandle> {
        self.submit(
            format!("delete VM {resource_group}/{vm_name}"),
            Method::DELETE,
            &self.vm_url(resource_group, vm_name, ""),
            None,
        )
        .await
    }

    async fn begin_create_vm(
        &self,
        resource_group: &str,
        vm_name: &str,
        spec: &VmCreateSpec,
    ) -> Result<OperationHandle> {
        let body = serde_json::to_value(create_body(spec)).context("cannot encode VM request")?;
        self.submit(
            format!("create VM {resource_group}/{vm_name}"),
            Method::PUT,
            &self.vm_url(resource_group, vm_name, ""),
            Some(&body),
        )
        .await
    }

    async fn begin_start_vm(
        &self,
        resource_group: &str,
        vm_name: &str,
    ) -> Result<OperationHandle> {
        self.submit(
            format!("start VM {resource_group}/{vm_name}"),
            Method::POST,
            &self.vm_url(resource_group, vm_name, "/start"),
            None,
        )
        .await
    }
}

impl<C: CredentialProvider> OperationPoller for ArmClient<C> {
    async fn poll(&self, operation: &OperationHandle) -> Result<OperationStatus> {
        let Some(url) = &operation.poll_url else {
            return Ok(OperationStatus::Succeeded);
        };
        let resp = self.send(Method::GET, url, None).await?;
        let status = resp.status();
        if operation.monitor == StatusMonitor::Location {
            return Ok(location_status(status));
        }
        if status == StatusCode::ACCEPTED {
            return Ok(OperationStatus::InProgress);
        }
        let text = resp
            .text()
            .await
            .with_context(|| format!("cannot read status of {}", operation.operation))?;
        Ok(operation_status(&operation.operation, &text))
    }
}

// ── Pure helpers ──────────────────────────────────────────────────────────────

/// Map a non-2xx response to a typed provider error.
pub fn classify(status: StatusCode, body: &str) -> ProviderError {
    let error = serde_json::from_str::<ErrorResponse>(body)
        .map(|r| r.error)
        .unwrap_or_default();
    let message = if error.message.is_empty() {
        body.trim().to_string()
    } else {
        error.message.clone()
    };
    let has_code = |code: &str| error.codes().iter().any(|c| c.eq_ignore_ascii_case(code));

    if has_code("SkuNotAvailable") {
        ProviderError::SkuNotAvailable(message)
    } else if status == StatusCode::NOT_FOUND
        || has_code("ResourceNotFound")
        || has_code("NotFound")
    {
        ProviderError::NotFound(message)
    } else if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
        ProviderError::Transient(format!("HTTP {}: {message}", status.as_u16()))
    } else if status == StatusCode::CONFLICT {
        ProviderError::Conflict(message)
    } else {
        ProviderError::Api {
            status: status.as_u16(),
            code: error.code.clone(),
            message,
        }
    }
}

/// Interpret the body of an `Azure-AsyncOperation` status poll.
///
/// Only an explicit `Succeeded` completes the operation. An error envelope
/// fails it. Any other body leaves it in progress, so the poll deadline
/// bounds a status URL that never answers sensibly.
pub fn operation_status(operation: &str, body: &str) -> OperationStatus {
    if let Ok(op) = serde_json::from_str::<AsyncOperation>(body) {
        return match op.status {
            OperationState::Succeeded => OperationStatus::Succeeded,
            OperationState::InProgress | OperationState::Other => OperationStatus::InProgress,
            state @ (OperationState::Failed | OperationState::Canceled) => OperationStatus::Failed(
                operation_error(operation, &state, op.error.unwrap_or_default()),
            ),
        };
    }
    if let Ok(envelope) = serde_json::from_str::<ErrorResponse>(body) {
        return OperationStatus::Failed(operation_error(
            operation,
            &OperationState::Failed,
            envelope.error,
        ));
    }
    tracing::warn!("Unreadable status of {operation}, polling again: {}", body.trim());
    OperationStatus::InProgress
}

/// Interpret the status code of a `Location` poll: 200 and 204 mean done.
pub fn location_status(status: StatusCode) -> OperationStatus {
    if status == StatusCode::OK || status == StatusCode::NO_CONTENT {
        OperationStatus::Succeeded
    } else {
        OperationStatus::InProgress
    }
}

fn operation_error(operation: &str, state: &OperationState, error: ErrorBody) -> ProviderError {
    if error
        .codes()
        .iter()
        .any(|c| c.eq_ignore_ascii_case("SkuNotAvailable"))
    {
        return ProviderError::SkuNotAvailable(error.message);
    }
    ProviderError::OperationFailed {
        operation: operation.to_string(),
        state: format!("{state:?}"),
        message: if error.code.is_empty() {
            error.message
        } else {
            format!("{}: {}", error.code, error.message)
        },
    }
}

fn header(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(String::from)
}

fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    header(headers, RETRY_AFTER.as_str())
        .and_then(|v| v.parse::<u64>().ok())
        .map(Duration::from_secs)
}

/// Build the handle for a submitted request from its response headers.
pub fn operation_handle(operation: String, headers: &HeaderMap) -> OperationHandle {
    if let Some(url) = header(headers, ASYNC_OPERATION_HEADER) {
        return OperationHandle::polled(operation, url, StatusMonitor::AsyncOperation);
    }
    match header(headers, LOCATION.as_str()) {
        Some(url) => OperationHandle::polled(operation, url, StatusMonitor::Location),
        None => OperationHandle::completed(operation),
    }
}

fn last_segment(id: &str) -> &str {
    id.rsplit('/').next().unwrap_or(id)
}

/// Flatten an ARM VM into the provider-neutral snapshot.
pub fn vm_snapshot(vm: VirtualMachine, requested_name: &str) -> VmSnapshot {
    let props = vm.properties;
    let storage = props.storage_profile.unwrap_or_default();
    let disk_ref = |kind, name: Option<String>, lun, managed: Option<ManagedDiskParameters>| {
        let managed = managed.unwrap_or_default();
        let name = name
            .or_else(|| managed.id.as_deref().map(|id| last_segment(id).to_string()))
            .unwrap_or_default();
        DiskRef {
            kind,
            name,
            id: managed.id,
            lun,
            redundancy: managed.storage_account_type,
        }
    };
    let os_type = storage.os_disk.as_ref().and_then(|d| d.os_type.clone());
    let os_disk = storage
        .os_disk
        .map(|d| disk_ref(DiskKind::Os, d.name, None, d.managed_disk));
    let data_disks = storage
        .data_disks
        .into_iter()
        .map(|d| disk_ref(DiskKind::Data, d.name, Some(d.lun), d.managed_disk))
        .collect();

    let mut nics = props.network_profile.unwrap_or_default().network_interfaces;
    // Primary first; stable for the rest.
    nics.sort_by_key(|n| !n.properties.as_ref().and_then(|p| p.primary).unwrap_or(false));

    VmSnapshot {
        name: vm.name.unwrap_or_else(|| requested_name.to_string()),
        location: vm.location,
        zones: vm.zones.unwrap_or_default(),
        size: props.hardware_profile.and_then(|h| h.vm_size),
        os_type,
        os_disk,
        data_disks,
        nic_ids: nics.into_iter().map(|n| n.id).collect(),
    }
}

/// Attach-only create body: every disk by ID, never created fresh.
pub fn create_body(spec: &VmCreateSpec) -> VirtualMachine {
    let attach = |id: &str| ManagedDiskParameters {
        id: Some(id.to_string()),
        storage_account_type: None,
    };
    VirtualMachine {
        id: None,
        name: None,
        location: spec.location.clone(),
        zones: Some(vec![spec.zone.clone()]),
        properties: VirtualMachineProperties {
            hardware_profile: Some(HardwareProfile {
                vm_size: Some(spec.size.clone()),
            }),
            storage_profile: Some(StorageProfile {
                os_disk: Some(OsDisk {
                    os_type: Some(spec.os_type.as_str().to_string()),
                    name: None,
                    create_option: Some(ATTACH.to_string()),
                    managed_disk: Some(attach(&spec.os_disk_id)),
                }),
                data_disks: spec
                    .data_disks
                    .iter()
                    .map(|(lun, id)| DataDisk {
                        lun: *lun,
                        name: None,
                        create_option: Some(ATTACH.to_string()),
                        managed_disk: Some(attach(id)),
                    })
                    .collect(),
            }),
            network_profile: Some(NetworkProfile {
                network_interfaces: vec![NetworkInterfaceReference {
                    id: spec.nic_id.clone(),
                    properties: Some(NetworkInterfaceReferenceProperties {
                        primary: Some(true),
                    }),
                }],
            }),
            provisioning_state: None,
        },
    }
}
