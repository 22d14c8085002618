use axum::{
    body::Bytes,
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;
use std::path::PathBuf;
use crate::admin::ApiError;
use crate::generate::{CreateSiteRequest, GenerationResult, TemplateGenerator};
use crate::host::HostIdentity;
use crate::http::server::AppState;
use crate::reconcile::{DirectoryReconciler, ReconciliationReport};
use crate::registry::{Machine, SiteRecord, SiteRegistry};

#[derive(Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
}

#[derive(Debug, Default, Deserialize)]
pub struct ScanRequest {
    pub directory: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterMachineRequest {
    pub machine_name: String,
    pub local_ip_address: Option<Ipv4Addr>,
    #[serde(default)]
    pub url_for_404_api: Option<String>,
    #[serde(default)]
    pub user_home_dir: Option<PathBuf>,
    #[serde(default)]
    pub nginx_storage_path_options: Vec<PathBuf>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClearResponse {
    pub deleted_count: usize,
}

pub async fn get_status() -> Json<SystemStatus> {
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
    })
}

pub async fn get_machine_name(State(state): State<AppState>) -> Json<HostIdentity> {
    Json(state.host.as_ref().clone())
}

pub async fn list_machines(State(state): State<AppState>) -> Json<Vec<Machine>> {
    Json(state.machines.list())
}

pub async fn register_machine(
    State(state): State<AppState>,
    payload: Result<Json<RegisterMachineRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Machine>), ApiError> {
    let Json(request) = payload?;
    if request.machine_name.trim().is_empty() {
        return Err(ApiError::bad_request("machineName must not be empty"));
    }

    let mut machine = Machine::new(request.machine_name, request.local_ip_address);
    machine.url_for_404_api = request.url_for_404_api;
    machine.user_home_dir = request.user_home_dir;
    machine.nginx_storage_path_options = request.nginx_storage_path_options;

    let machines = state.machines.clone();
    let machine = tokio::task::spawn_blocking(move || machines.register(machine)).await??;
    Ok((StatusCode::CREATED, Json(machine)))
}

pub async fn list_sites(State(state): State<AppState>) -> Result<Json<Vec<SiteRecord>>, ApiError> {
    Ok(Json(state.sites.list_all()?))
}

pub async fn scan_sites(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<ReconciliationReport>, ApiError> {
    let request: ScanRequest = if body.iter().all(u8::is_ascii_whitespace) {
        ScanRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| ApiError::bad_request(format!("invalid scan request: {e}")))?
    };
    let directory = request
        .directory
        .unwrap_or_else(|| state.config.paths.scan_directory.clone());

    let host_address = state.host.local_ip_address;
    let report = tokio::task::spawn_blocking(move || {
        let reconciler = DirectoryReconciler::new(
            &*state.machines,
            &*state.sites,
            host_address,
        );
        reconciler.reconcile(&directory)
    })
    .await??;

    Ok(Json(report))
}

pub async fn create_config_file(
    State(state): State<AppState>,
    payload: Result<Json<CreateSiteRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<GenerationResult>), ApiError> {
    let Json(request) = payload?;
    let host_address = state.host.local_ip_address;
    let result = tokio::task::spawn_blocking(move || {
        let generator = TemplateGenerator::new(
            &*state.machines,
            &*state.sites,
            host_address,
            &state.config.paths,
        );
        generator.generate(&request)
    })
    .await??;

    Ok((StatusCode::CREATED, Json(result)))
}

pub async fn clear_sites(State(state): State<AppState>) -> Result<Json<ClearResponse>, ApiError> {
    let sites = state.sites.clone();
    let deleted_count = tokio::task::spawn_blocking(move || sites.delete_all()).await??;

    tracing::warn!(deleted_count, "Site registry cleared");
    Ok(Json(ClearResponse { deleted_count }))
}
