use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;

use crate::auth::{RequireApiKey, generate_password, generate_tenant_token};
use crate::error::Error;
use crate::server::AppState;
use crate::server::dto::{
    CreateTenantRequest, CreateTenantResponse, StatusResponse, UpdateKeysRequest,
    ValidateResponse,
};
use crate::server::response::{ApiError, ApiJson, StoreOptionExt, StoreResultExt};
use crate::server::validation::validate_username;
use crate::sftpgo::SftpgoUser;
use crate::types::{NewTenant, Tenant};

fn parse_tenant_id(raw: &str) -> Result<i64, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::bad_request("invalid id"))
}

fn load_tenant(state: &AppState, id: i64) -> Result<Tenant, ApiError> {
    state
        .store
        .get_tenant(id)
        .api_err("failed to look up tenant")?
        .or_not_found("tenant not found")
}

/// Provisions the SFTPGo user first; the registry row is only written once
/// SFTPGo has accepted it.
pub async fn create_tenant(
    _auth: RequireApiKey,
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<CreateTenantRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_username(&req.username)?;

    let existing = state
        .store
        .get_tenant_by_username(&req.username)
        .api_err("failed to check existing tenant")?;
    if existing.is_some() {
        return Err(ApiError::conflict("tenant already exists"));
    }

    let password = req
        .password
        .filter(|p| !p.is_empty())
        .unwrap_or_else(generate_password);
    let public_key = req.public_key.filter(|k| !k.trim().is_empty());
    let token = generate_tenant_token();
    let home_dir = state.data_dir.join(&token).to_string_lossy().into_owned();

    let user = SftpgoUser::new(
        &req.username,
        &password,
        &home_dir,
        public_key.as_deref(),
        &token,
        state.object_store.as_ref(),
    );
    state.sftpgo.create_user(&user).await.map_err(|e| {
        tracing::warn!(username = %req.username, "sftpgo create failed: {e}");
        ApiError::bad_gateway(format!("sftpgo: {e}"))
    })?;

    let new_tenant = NewTenant {
        token,
        username: req.username,
        password,
        public_key,
        home_dir,
        created_at: Utc::now(),
    };
    let tenant = match state.store.create_tenant(&new_tenant) {
        Ok(tenant) => tenant,
        Err(Error::AlreadyExists) => {
            tracing::error!(
                username = %new_tenant.username,
                "registry rejected tenant after sftpgo user was created; sftpgo user is orphaned"
            );
            return Err(ApiError::conflict(
                "tenant already exists; sftpgo user was created and must be removed manually",
            ));
        }
        Err(e) => {
            tracing::error!(
                username = %new_tenant.username,
                "registry write failed after sftpgo user was created; sftpgo user is orphaned: {e}"
            );
            return Err(ApiError::internal(
                "failed to store tenant; sftpgo user was created and must be removed manually",
            ));
        }
    };

    tracing::info!(id = tenant.id, username = %tenant.username, "provisioned tenant");

    let response = CreateTenantResponse {
        password: tenant.password.clone(),
        tenant_id: tenant.token.clone(),
        tenant,
    };
    Ok((StatusCode::CREATED, Json(response)))
}

pub async fn list_tenants(
    _auth: RequireApiKey,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Tenant>>, ApiError> {
    let tenants = state.store.list_tenants().api_err("failed to list tenants")?;
    Ok(Json(tenants))
}

pub async fn get_tenant(
    _auth: RequireApiKey,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Tenant>, ApiError> {
    let id = parse_tenant_id(&id)?;
    Ok(Json(load_tenant(&state, id)?))
}

/// Removes the registry row, then the SFTPGo user. A SFTPGo failure after the
/// row is gone is reported as 502 and not rolled back.
pub async fn delete_tenant(
    _auth: RequireApiKey,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<StatusResponse>, ApiError> {
    let id = parse_tenant_id(&id)?;
    let username = state
        .store
        .delete_tenant(id)
        .api_err_or_not_found("tenant not found", "failed to delete tenant")?;

    state.sftpgo.delete_user(&username).await.map_err(|e| {
        tracing::warn!(%username, "tenant deleted from registry but sftpgo delete failed: {e}");
        ApiError::bad_gateway(format!("deleted from registry but sftpgo failed: {e}"))
    })?;

    tracing::info!(id, %username, "deleted tenant");
    Ok(Json(StatusResponse::new("deleted")))
}

/// Reports whether SFTPGo knows the tenant's user and has it enabled. SFTPGo
/// errors are part of the answer, not a failure of this call.
pub async fn validate_tenant(
    _auth: RequireApiKey,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ValidateResponse>, ApiError> {
    let id = parse_tenant_id(&id)?;
    let tenant = load_tenant(&state, id)?;

    let response = match state.sftpgo.get_user(&tenant.username).await {
        Ok(user) => ValidateResponse::Checked {
            valid: user.is_enabled(),
            username: tenant.username,
        },
        Err(e) => ValidateResponse::Failed {
            valid: false,
            reason: e.to_string(),
        },
    };
    Ok(Json(response))
}

pub async fn update_tenant_keys(
    _auth: RequireApiKey,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<UpdateKeysRequest>,
) -> Result<Json<StatusResponse>, ApiError> {
    let id = parse_tenant_id(&id)?;
    if req.public_key.trim().is_empty() {
        return Err(ApiError::bad_request("public_key is required"));
    }
    let tenant = load_tenant(&state, id)?;

    state
        .store
        .update_tenant_public_key(id, &req.public_key)
        .api_err_or_not_found("tenant not found", "failed to update tenant key")?;

    let keys = [req.public_key];
    state
        .sftpgo
        .update_public_keys(&tenant.username, &keys)
        .await
        .map_err(|e| {
            tracing::warn!(username = %tenant.username, "registry key updated but sftpgo update failed: {e}");
            ApiError::bad_gateway(format!("registry updated but sftpgo failed: {e}"))
        })?;

    tracing::info!(id, username = %tenant.username, "rotated tenant public key");
    Ok(Json(StatusResponse::new("updated")))
}

pub async fn list_tenant_records(
    _auth: RequireApiKey,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_tenant_id(&id)?;
    let tenant = load_tenant(&state, id)?;

    let records = state
        .store
        .list_records(&tenant.token)
        .api_err("failed to list records")?;
    Ok(Json(records))
}
