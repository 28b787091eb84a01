use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Inventario API",
        version = "0.3.0",
        description = r#"
# Institutional Asset Inventory API

Backend for tracking institutional assets (bienes), assigning custody
(resguardos) to custodians (resguardantes), and routing transfer requests
(traspasos) through an approval workflow with real-time notifications.

## Authentication

All endpoints require a bearer token issued by the identity service:

```
Authorization: Bearer <token>
```

## Error Handling

Errors use a consistent JSON body with appropriate HTTP status codes:

```json
{
  "error": "Unprocessable Entity",
  "message": "Validation error: bienes: asset 99 does not exist",
  "request_id": "req-abc123",
  "timestamp": "2025-11-12T00:00:00Z"
}
```
        "#,
        contact(
            name = "Dirección de Sistemas",
            email = "sistemas@inventario.example"
        ),
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development")
    ),
    tags(
        (name = "Traspasos", description = "Transfer request workflow"),
        (name = "Resguardos", description = "Custody ledger operations"),
        (name = "Health", description = "Health check endpoints")
    ),
    paths(
        // Transfer workflow
        crate::handlers::transfers::create_transfer,
        crate::handlers::transfers::resolve_transfer,
        crate::handlers::transfers::list_transfers,
        crate::handlers::transfers::get_transfer,

        // Custody ledger
        crate::handlers::custody::bulk_assign,
        crate::handlers::custody::bulk_release,
        crate::handlers::custody::custodian_assets,
        crate::handlers::custody::asset_custody_history,
    ),
    components(
        schemas(
            // Common types
            crate::ApiResponse<serde_json::Value>,
            crate::PaginatedResponse<serde_json::Value>,

            // Transfer types
            crate::handlers::transfers::CreateTransferRequest,
            crate::handlers::transfers::ResolveTransferRequest,
            crate::handlers::transfers::TransferSummary,

            // Custody types
            crate::handlers::custody::AssignCustodyRequest,
            crate::handlers::custody::ReleaseCustodyRequest,
            crate::handlers::custody::CustodyCountResponse,
            crate::handlers::custody::BienSummary,
            crate::handlers::custody::ResguardoSummary,

            // Error types
            crate::errors::ErrorResponse
        )
    )
)]
pub struct ApiDocV1;

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDocV1::openapi())
        .config(utoipa_swagger_ui::Config::from("/api-docs/openapi.json").try_it_out_enabled(true))
}
