use crate::{
    auth::AuthenticatedUser,
    entities::{bien, resguardo},
    errors::ServiceError,
    ApiResponse, ApiResult, AppState,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct AssignCustodyRequest {
    /// Custodian receiving the assets
    pub resguardante_id: i32,
    /// Asset ids to assign
    #[validate(length(min = 1, message = "at least one asset id is required"))]
    pub bienes: Vec<i32>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ReleaseCustodyRequest {
    /// Asset ids to release from their current custodian
    #[validate(length(min = 1, message = "at least one asset id is required"))]
    pub bienes: Vec<i32>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CustodyCountResponse {
    pub count: u64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BienSummary {
    pub id: i32,
    pub codigo: String,
    pub nombre: String,
    pub descripcion: Option<String>,
    pub valor: Decimal,
    pub oficina_id: i32,
    pub resguardante_id: Option<i32>,
}

impl From<bien::Model> for BienSummary {
    fn from(model: bien::Model) -> Self {
        Self {
            id: model.id,
            codigo: model.codigo,
            nombre: model.nombre,
            descripcion: model.descripcion,
            valor: model.valor,
            oficina_id: model.oficina_id,
            resguardante_id: model.resguardante_id,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ResguardoSummary {
    pub id: i32,
    pub bien_id: i32,
    pub resguardante_id: i32,
    pub departamento_id: i32,
    pub fecha_asignacion: DateTime<Utc>,
    pub fecha_devolucion: Option<DateTime<Utc>>,
}

impl From<resguardo::Model> for ResguardoSummary {
    fn from(model: resguardo::Model) -> Self {
        Self {
            id: model.id,
            bien_id: model.bien_id,
            resguardante_id: model.resguardante_id,
            departamento_id: model.departamento_id,
            fecha_asignacion: model.fecha_asignacion,
            fecha_devolucion: model.fecha_devolucion,
        }
    }
}

/// Assign a batch of assets to a custodian
#[utoipa::path(
    post,
    path = "/api/v1/resguardos/asignar",
    summary = "Assign custody",
    description = "Assign every listed asset to a custodian, appending one custody record per asset",
    request_body = AssignCustodyRequest,
    responses(
        (status = 201, description = "Assets assigned", body = ApiResponse<CustodyCountResponse>),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 422, description = "Validation error", body = crate::errors::ErrorResponse),
        (status = 500, description = "Storage failure, batch rolled back", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn bulk_assign(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Json(payload): Json<AssignCustodyRequest>,
) -> Result<(StatusCode, Json<ApiResponse<CustodyCountResponse>>), ServiceError> {
    payload.validate()?;

    let count = state
        .services
        .custody
        .bulk_assign(payload.resguardante_id, payload.bienes)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(CustodyCountResponse { count })),
    ))
}

/// Release a batch of assets from their current custodians
#[utoipa::path(
    post,
    path = "/api/v1/resguardos/liberar",
    summary = "Release custody",
    description = "Clear the current custodian of every listed asset; history records are timestamp-closed, never deleted",
    request_body = ReleaseCustodyRequest,
    responses(
        (status = 200, description = "Assets released", body = ApiResponse<CustodyCountResponse>),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 422, description = "Validation error", body = crate::errors::ErrorResponse),
        (status = 500, description = "Storage failure, batch rolled back", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn bulk_release(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Json(payload): Json<ReleaseCustodyRequest>,
) -> ApiResult<CustodyCountResponse> {
    payload.validate()?;

    let count = state.services.custody.bulk_release(payload.bienes).await?;

    Ok(Json(ApiResponse::success(CustodyCountResponse { count })))
}

/// Assets currently held by a custodian
#[utoipa::path(
    get,
    path = "/api/v1/resguardantes/{id}/bienes",
    summary = "List a custodian's assets",
    params(("id" = i32, Path, description = "Custodian id")),
    responses(
        (status = 200, description = "Assets retrieved", body = ApiResponse<Vec<BienSummary>>),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 404, description = "Custodian not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn custodian_assets(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<i32>,
) -> ApiResult<Vec<BienSummary>> {
    let bienes = state.services.custody.assets_for_custodian(id).await?;
    let items = bienes.into_iter().map(BienSummary::from).collect();
    Ok(Json(ApiResponse::success(items)))
}

/// Custody history of an asset, newest first
#[utoipa::path(
    get,
    path = "/api/v1/bienes/{id}/resguardos",
    summary = "Asset custody history",
    params(("id" = i32, Path, description = "Asset id")),
    responses(
        (status = 200, description = "History retrieved", body = ApiResponse<Vec<ResguardoSummary>>),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 404, description = "Asset not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn asset_custody_history(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<i32>,
) -> ApiResult<Vec<ResguardoSummary>> {
    let resguardos = state.services.custody.custody_history(id).await?;
    let items = resguardos.into_iter().map(ResguardoSummary::from).collect();
    Ok(Json(ApiResponse::success(items)))
}
