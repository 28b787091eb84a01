use crate::{
    auth::AuthenticatedUser,
    entities::traspaso::TraspasoEstado,
    errors::ServiceError,
    services::transfers::{CreateTransferInput, TransferFilter, TransferRecord},
    ApiResponse, ApiResult, AppState, PaginatedResponse,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateTransferRequest {
    /// Asset to transfer
    pub bien_id: i32,
    /// Destination custodian
    pub receptor_id: i32,
    /// Free-text remarks
    #[validate(length(max = 500, message = "must be at most 500 characters"))]
    pub observaciones: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ResolveTransferRequest {
    /// Target state: "Aprobado" or "Rechazado"
    pub estado: String,
}

#[derive(Debug, Deserialize, Default, ToSchema)]
pub struct TransferListQuery {
    /// Page number (1-indexed)
    pub page: Option<u64>,
    /// Page size (max 100)
    pub limit: Option<u64>,
    /// Optional estado filter
    pub estado: Option<String>,
    /// Case-insensitive substring over asset name or origin custodian name
    pub buscar: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TransferSummary {
    pub id: i32,
    pub bien_id: i32,
    pub bien_nombre: String,
    pub emisor_id: i32,
    pub emisor: String,
    pub receptor_id: i32,
    pub receptor: String,
    pub estado: String,
    pub observaciones: Option<String>,
    pub fecha_solicitud: DateTime<Utc>,
}

impl From<TransferRecord> for TransferSummary {
    fn from(record: TransferRecord) -> Self {
        Self {
            id: record.traspaso.id,
            bien_id: record.traspaso.bien_id,
            bien_nombre: record.bien_nombre,
            emisor_id: record.traspaso.emisor_id,
            emisor: record.emisor_nombre,
            receptor_id: record.traspaso.receptor_id,
            receptor: record.receptor_nombre,
            estado: record.traspaso.estado.as_str().to_string(),
            observaciones: record.traspaso.observaciones,
            fecha_solicitud: record.traspaso.fecha_solicitud,
        }
    }
}

/// Open a transfer request
#[utoipa::path(
    post,
    path = "/api/v1/traspasos",
    summary = "Create transfer request",
    description = "Open a Pendiente transfer request from the acting user's custodian to the receptor",
    request_body = CreateTransferRequest,
    responses(
        (status = 201, description = "Transfer request created", body = ApiResponse<TransferSummary>),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 422, description = "Validation error", body = crate::errors::ErrorResponse),
        (status = 500, description = "Storage failure, rolled back", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn create_transfer(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(payload): Json<CreateTransferRequest>,
) -> Result<(StatusCode, Json<ApiResponse<TransferSummary>>), ServiceError> {
    payload.validate()?;

    let record = state
        .services
        .transfers
        .create_transfer(
            user.usuario_id,
            CreateTransferInput {
                bien_id: payload.bien_id,
                receptor_id: payload.receptor_id,
                observaciones: payload.observaciones,
            },
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(TransferSummary::from(record))),
    ))
}

/// Resolve a pending transfer request
#[utoipa::path(
    put,
    path = "/api/v1/traspasos/{id}/estado",
    summary = "Resolve transfer request",
    description = "Move a Pendiente request to Aprobado or Rechazado; approval hands custody over atomically",
    params(("id" = i32, Path, description = "Transfer request id")),
    request_body = ResolveTransferRequest,
    responses(
        (status = 200, description = "Transfer request resolved", body = ApiResponse<TransferSummary>),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 404, description = "Transfer request not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Already resolved", body = crate::errors::ErrorResponse),
        (status = 422, description = "Invalid target state", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn resolve_transfer(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<i32>,
    Json(payload): Json<ResolveTransferRequest>,
) -> ApiResult<TransferSummary> {
    let nuevo_estado = TraspasoEstado::parse_resolution(&payload.estado).ok_or_else(|| {
        ServiceError::ValidationError("estado: must be Aprobado or Rechazado".into())
    })?;

    state
        .services
        .transfers
        .resolve_transfer(id, nuevo_estado)
        .await?;

    // Re-read through the record path so the response carries display names.
    match state.services.transfers.get_transfer(id).await? {
        Some(record) => Ok(Json(ApiResponse::success(TransferSummary::from(record)))),
        None => Err(ServiceError::NotFound(format!("Traspaso {} not found", id))),
    }
}

/// List transfer requests
#[utoipa::path(
    get,
    path = "/api/v1/traspasos",
    summary = "List transfer requests",
    params(
        ("page" = Option<u64>, Query, description = "Page number (default: 1)"),
        ("limit" = Option<u64>, Query, description = "Items per page (default: 20, max: 100)"),
        ("estado" = Option<String>, Query, description = "Filter by estado"),
        ("buscar" = Option<String>, Query, description = "Substring over asset or origin custodian name"),
    ),
    responses(
        (status = 200, description = "Transfer requests retrieved", body = ApiResponse<PaginatedResponse<TransferSummary>>),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 422, description = "Invalid estado filter", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn list_transfers(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Query(query): Query<TransferListQuery>,
) -> ApiResult<PaginatedResponse<TransferSummary>> {
    let estado = match query.estado.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        None => None,
        Some(raw) => Some(TraspasoEstado::parse(raw).ok_or_else(|| {
            ServiceError::ValidationError(format!("estado: unknown state '{}'", raw))
        })?),
    };

    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(20).clamp(1, 100);

    let (records, total) = state
        .services
        .transfers
        .list_transfers(TransferFilter {
            estado,
            buscar: query.buscar,
            page,
            limit,
        })
        .await?;

    let items: Vec<TransferSummary> = records.into_iter().map(TransferSummary::from).collect();
    let total_pages = (total + limit - 1) / limit;

    Ok(Json(ApiResponse::success(PaginatedResponse {
        items,
        total,
        page,
        limit,
        total_pages,
    })))
}

/// Get a single transfer request
#[utoipa::path(
    get,
    path = "/api/v1/traspasos/{id}",
    summary = "Get transfer request",
    params(("id" = i32, Path, description = "Transfer request id")),
    responses(
        (status = 200, description = "Transfer request retrieved", body = ApiResponse<TransferSummary>),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 404, description = "Transfer request not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn get_transfer(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<i32>,
) -> ApiResult<TransferSummary> {
    match state.services.transfers.get_transfer(id).await? {
        Some(record) => Ok(Json(ApiResponse::success(TransferSummary::from(record)))),
        None => Err(ServiceError::NotFound(format!("Traspaso {} not found", id))),
    }
}
