//! Integration tests for the transfer approval workflow.
//!
//! Covers request creation, state-machine guards, the custody handoff on
//! approval, notification broadcast contracts and the read side.

mod common;

use axum::http::Method;
use chrono::Utc;
use common::{fixtures, response_json, TestApp};
use inventario_api::{
    entities::{bien, resguardo, traspaso, traspaso::TraspasoEstado},
    events::fecha_larga,
};
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};
use serde_json::json;

async fn traspaso_by_id(app: &TestApp, id: i32) -> traspaso::Model {
    traspaso::Entity::find_by_id(id)
        .one(app.state.db.as_ref())
        .await
        .expect("query traspaso")
        .expect("traspaso exists")
}

async fn traspaso_count(app: &TestApp) -> u64 {
    traspaso::Entity::find()
        .count(app.state.db.as_ref())
        .await
        .expect("count traspasos")
}

async fn create_transfer(app: &TestApp, bien_id: i32, receptor_id: i32) -> i32 {
    let response = app
        .request(
            Method::POST,
            "/api/v1/traspasos",
            Some(json!({ "bien_id": bien_id, "receptor_id": receptor_id })),
        )
        .await;
    assert_eq!(response.status(), 201);
    let body = response_json(response).await;
    body["data"]["id"].as_i64().unwrap() as i32
}

// ==================== Create ====================

#[tokio::test]
async fn create_transfer_persists_pending_request_and_broadcasts() {
    let mut app = TestApp::new().await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/traspasos",
            Some(json!({
                "bien_id": fixtures::BIEN_IMPRESORA,
                "receptor_id": fixtures::RESGUARDANTE_MARCO,
                "observaciones": "office move",
            })),
        )
        .await;

    assert_eq!(response.status(), 201);
    let body = response_json(response).await;
    assert!(body["success"].as_bool().unwrap());

    let data = &body["data"];
    assert_eq!(data["estado"], "Pendiente");
    assert_eq!(data["bien_nombre"], "Impresora láser");
    assert_eq!(data["emisor"], "Laura Cruz");
    assert_eq!(data["receptor"], "Marco Pérez");
    assert_eq!(data["observaciones"], "office move");
    let id = data["id"].as_i64().unwrap() as i32;

    let persisted = traspaso_by_id(&app, id).await;
    assert_eq!(persisted.estado, TraspasoEstado::Pendiente);
    assert_eq!(persisted.emisor_id, fixtures::RESGUARDANTE_LAURA);
    assert_eq!(persisted.receptor_id, fixtures::RESGUARDANTE_MARCO);

    // Exactly one TraspasoCreado broadcast, matching the persisted record.
    let message = app.next_broadcast().await;
    assert_eq!(message.channel, "traspasos");
    assert_eq!(message.event, "TraspasoCreado");
    assert_eq!(message.payload["id"], id);
    assert_eq!(message.payload["bien_nombre"], "Impresora láser");
    assert_eq!(message.payload["emisor"], "Laura Cruz");
    assert_eq!(message.payload["receptor"], "Marco Pérez");
    assert_eq!(message.payload["estado"], "Pendiente");
    assert_eq!(message.payload["fecha"], fecha_larga(&Utc::now()));
    app.assert_no_more_broadcasts().await;
}

#[tokio::test]
async fn create_transfer_to_own_custodian_fails() {
    let mut app = TestApp::new().await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/traspasos",
            Some(json!({
                "bien_id": fixtures::BIEN_IMPRESORA,
                "receptor_id": fixtures::RESGUARDANTE_LAURA,
            })),
        )
        .await;

    assert_eq!(response.status(), 422);
    let body = response_json(response).await;
    assert!(body["message"]
        .as_str()
        .unwrap()
        .contains("origin and destination custodians must differ"));

    assert_eq!(traspaso_count(&app).await, 0);
    app.assert_no_more_broadcasts().await;
}

#[tokio::test]
async fn create_transfer_with_missing_asset_fails() {
    let mut app = TestApp::new().await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/traspasos",
            Some(json!({ "bien_id": 9999, "receptor_id": fixtures::RESGUARDANTE_MARCO })),
        )
        .await;

    assert_eq!(response.status(), 422);
    assert_eq!(traspaso_count(&app).await, 0);
    app.assert_no_more_broadcasts().await;
}

#[tokio::test]
async fn create_transfer_with_missing_receptor_fails() {
    let app = TestApp::new().await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/traspasos",
            Some(json!({ "bien_id": fixtures::BIEN_IMPRESORA, "receptor_id": 9999 })),
        )
        .await;

    assert_eq!(response.status(), 422);
    assert_eq!(traspaso_count(&app).await, 0);
}

#[tokio::test]
async fn create_transfer_requires_a_linked_custodian() {
    let app = TestApp::new().await;

    let response = app
        .request_with_token(
            Method::POST,
            "/api/v1/traspasos",
            Some(json!({
                "bien_id": fixtures::BIEN_IMPRESORA,
                "receptor_id": fixtures::RESGUARDANTE_MARCO,
            })),
            Some(app.token_for(fixtures::USUARIO_ADMIN)),
        )
        .await;

    assert_eq!(response.status(), 422);
    let body = response_json(response).await;
    assert!(body["message"]
        .as_str()
        .unwrap()
        .contains("not linked to a custodian"));
}

// ==================== Resolve ====================

#[tokio::test]
async fn resolve_with_unknown_state_fails_and_leaves_record_pending() {
    let mut app = TestApp::new().await;
    let id = create_transfer(&app, fixtures::BIEN_IMPRESORA, fixtures::RESGUARDANTE_MARCO).await;
    let _created = app.next_broadcast().await;

    for estado in ["Completado", "Pendiente", "aprobado", ""] {
        let response = app
            .request(
                Method::PUT,
                &format!("/api/v1/traspasos/{}/estado", id),
                Some(json!({ "estado": estado })),
            )
            .await;
        assert_eq!(response.status(), 422, "estado {:?} must be rejected", estado);
    }

    assert_eq!(
        traspaso_by_id(&app, id).await.estado,
        TraspasoEstado::Pendiente
    );
    app.assert_no_more_broadcasts().await;
}

#[tokio::test]
async fn approve_persists_state_broadcasts_and_hands_custody_over() {
    let mut app = TestApp::new().await;
    let id = create_transfer(&app, fixtures::BIEN_IMPRESORA, fixtures::RESGUARDANTE_MARCO).await;
    let _created = app.next_broadcast().await;

    let response = app
        .request(
            Method::PUT,
            &format!("/api/v1/traspasos/{}/estado", id),
            Some(json!({ "estado": "Aprobado" })),
        )
        .await;

    assert_eq!(response.status(), 200);
    let body = response_json(response).await;
    assert_eq!(body["data"]["estado"], "Aprobado");

    assert_eq!(
        traspaso_by_id(&app, id).await.estado,
        TraspasoEstado::Aprobado
    );

    // Custody moved to the receptor atomically with the state change.
    let bien_row = bien::Entity::find_by_id(fixtures::BIEN_IMPRESORA)
        .one(app.state.db.as_ref())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(bien_row.resguardante_id, Some(fixtures::RESGUARDANTE_MARCO));

    let records = resguardo::Entity::find()
        .filter(resguardo::Column::BienId.eq(fixtures::BIEN_IMPRESORA))
        .all(app.state.db.as_ref())
        .await
        .unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].resguardante_id, fixtures::RESGUARDANTE_MARCO);
    assert_eq!(records[0].departamento_id, fixtures::DEP_ADMINISTRACION);

    // Exactly one TraspasoActualizado broadcast with the contract payload.
    let message = app.next_broadcast().await;
    assert_eq!(message.event, "TraspasoActualizado");
    assert_eq!(message.payload, json!({ "id": id, "estado": "Aprobado" }));
    app.assert_no_more_broadcasts().await;
}

#[tokio::test]
async fn reject_persists_state_without_moving_custody() {
    let mut app = TestApp::new().await;
    let id = create_transfer(&app, fixtures::BIEN_IMPRESORA, fixtures::RESGUARDANTE_MARCO).await;
    let _created = app.next_broadcast().await;

    let response = app
        .request(
            Method::PUT,
            &format!("/api/v1/traspasos/{}/estado", id),
            Some(json!({ "estado": "Rechazado" })),
        )
        .await;

    assert_eq!(response.status(), 200);
    assert_eq!(
        traspaso_by_id(&app, id).await.estado,
        TraspasoEstado::Rechazado
    );

    let bien_row = bien::Entity::find_by_id(fixtures::BIEN_IMPRESORA)
        .one(app.state.db.as_ref())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(bien_row.resguardante_id, None);

    let message = app.next_broadcast().await;
    assert_eq!(message.event, "TraspasoActualizado");
    assert_eq!(message.payload["estado"], "Rechazado");
}

#[tokio::test]
async fn resolving_a_terminal_request_again_conflicts() {
    let mut app = TestApp::new().await;
    let id = create_transfer(&app, fixtures::BIEN_IMPRESORA, fixtures::RESGUARDANTE_MARCO).await;
    let _created = app.next_broadcast().await;

    let response = app
        .request(
            Method::PUT,
            &format!("/api/v1/traspasos/{}/estado", id),
            Some(json!({ "estado": "Rechazado" })),
        )
        .await;
    assert_eq!(response.status(), 200);
    let _updated = app.next_broadcast().await;

    // Second resolution must not silently succeed.
    let response = app
        .request(
            Method::PUT,
            &format!("/api/v1/traspasos/{}/estado", id),
            Some(json!({ "estado": "Aprobado" })),
        )
        .await;

    assert_eq!(response.status(), 409);
    let body = response_json(response).await;
    assert!(body["message"].as_str().unwrap().contains("already resolved"));

    assert_eq!(
        traspaso_by_id(&app, id).await.estado,
        TraspasoEstado::Rechazado
    );
    app.assert_no_more_broadcasts().await;
}

#[tokio::test]
async fn resolving_an_unknown_request_is_404() {
    let app = TestApp::new().await;

    let response = app
        .request(
            Method::PUT,
            "/api/v1/traspasos/9999/estado",
            Some(json!({ "estado": "Aprobado" })),
        )
        .await;

    assert_eq!(response.status(), 404);
}

// ==================== Read side ====================

#[tokio::test]
async fn get_transfer_returns_display_names() {
    let app = TestApp::new().await;
    let id = create_transfer(&app, fixtures::BIEN_LAPTOP, fixtures::RESGUARDANTE_SOFIA).await;

    let response = app
        .request(Method::GET, &format!("/api/v1/traspasos/{}", id), None)
        .await;

    assert_eq!(response.status(), 200);
    let body = response_json(response).await;
    assert_eq!(body["data"]["bien_nombre"], "Laptop de desarrollo");
    assert_eq!(body["data"]["emisor"], "Laura Cruz");
    assert_eq!(body["data"]["receptor"], "Sofía Ramos");
}

#[tokio::test]
async fn get_unknown_transfer_is_404() {
    let app = TestApp::new().await;

    let response = app
        .request(Method::GET, "/api/v1/traspasos/9999", None)
        .await;

    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn list_filters_by_estado() {
    let app = TestApp::new().await;
    let first = create_transfer(&app, fixtures::BIEN_IMPRESORA, fixtures::RESGUARDANTE_MARCO).await;
    let second = create_transfer(&app, fixtures::BIEN_LAPTOP, fixtures::RESGUARDANTE_SOFIA).await;

    let response = app
        .request(
            Method::PUT,
            &format!("/api/v1/traspasos/{}/estado", first),
            Some(json!({ "estado": "Aprobado" })),
        )
        .await;
    assert_eq!(response.status(), 200);

    let response = app
        .request(Method::GET, "/api/v1/traspasos?estado=Pendiente", None)
        .await;
    assert_eq!(response.status(), 200);
    let body = response_json(response).await;
    assert_eq!(body["data"]["total"], 1);
    assert_eq!(body["data"]["items"][0]["id"], second);

    let response = app
        .request(Method::GET, "/api/v1/traspasos?estado=Aprobado", None)
        .await;
    let body = response_json(response).await;
    assert_eq!(body["data"]["total"], 1);
    assert_eq!(body["data"]["items"][0]["id"], first);

    // Unknown estado values are rejected, not silently ignored.
    let response = app
        .request(Method::GET, "/api/v1/traspasos?estado=Terminado", None)
        .await;
    assert_eq!(response.status(), 422);
}

#[tokio::test]
async fn list_matches_substring_case_insensitively() {
    let app = TestApp::new().await;
    let impresora =
        create_transfer(&app, fixtures::BIEN_IMPRESORA, fixtures::RESGUARDANTE_MARCO).await;
    let _laptop = create_transfer(&app, fixtures::BIEN_LAPTOP, fixtures::RESGUARDANTE_SOFIA).await;

    // Asset-name match.
    let response = app
        .request(Method::GET, "/api/v1/traspasos?buscar=IMPRESORA", None)
        .await;
    let body = response_json(response).await;
    assert_eq!(body["data"]["total"], 1);
    assert_eq!(body["data"]["items"][0]["id"], impresora);

    // Origin-name match hits every request Laura opened.
    let response = app
        .request(Method::GET, "/api/v1/traspasos?buscar=laura", None)
        .await;
    let body = response_json(response).await;
    assert_eq!(body["data"]["total"], 2);

    // No match.
    let response = app
        .request(Method::GET, "/api/v1/traspasos?buscar=inexistente", None)
        .await;
    let body = response_json(response).await;
    assert_eq!(body["data"]["total"], 0);
}

#[tokio::test]
async fn list_paginates_newest_first() {
    let app = TestApp::new().await;
    for receptor in [
        fixtures::RESGUARDANTE_MARCO,
        fixtures::RESGUARDANTE_SOFIA,
        fixtures::RESGUARDANTE_MARCO,
    ] {
        create_transfer(&app, fixtures::BIEN_IMPRESORA, receptor).await;
    }

    let response = app
        .request(Method::GET, "/api/v1/traspasos?page=1&limit=2", None)
        .await;
    let body = response_json(response).await;
    assert_eq!(body["data"]["total"], 3);
    assert_eq!(body["data"]["total_pages"], 2);
    assert_eq!(body["data"]["items"].as_array().unwrap().len(), 2);

    let response = app
        .request(Method::GET, "/api/v1/traspasos?page=2&limit=2", None)
        .await;
    let body = response_json(response).await;
    assert_eq!(body["data"]["items"].as_array().unwrap().len(), 1);
}

// ==================== Auth boundary ====================

#[tokio::test]
async fn transfer_operations_require_a_bearer_token() {
    let app = TestApp::new().await;

    let response = app
        .request_unauthenticated(
            Method::POST,
            "/api/v1/traspasos",
            Some(json!({
                "bien_id": fixtures::BIEN_IMPRESORA,
                "receptor_id": fixtures::RESGUARDANTE_MARCO,
            })),
        )
        .await;

    assert_eq!(response.status(), 401);
    assert_eq!(traspaso_count(&app).await, 0);
}
