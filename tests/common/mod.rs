use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, Response},
    Router,
};
use inventario_api::{
    auth,
    broadcast::{BroadcastMessage, InMemoryBroadcaster},
    config::AppConfig,
    db,
    entities::{bien, departamento, oficina, resguardante, usuario},
    events::{self, EventSender},
    handlers::AppServices,
    logging, AppState,
};
use rust_decimal_macros::dec;
use sea_orm::{ActiveModelTrait, Set};
use serde_json::Value;
use tempfile::TempDir;
use tokio::sync::{broadcast, mpsc};
use tower::ServiceExt;

const TEST_SECRET: &str = "a_test_secret_key_that_is_long_enough!";

/// Seeded fixture ids, kept explicit so assertions read naturally.
pub mod fixtures {
    pub const DEP_ADMINISTRACION: i32 = 1;
    pub const DEP_TECNOLOGIA: i32 = 2;
    pub const OFICINA_101: i32 = 1;
    pub const OFICINA_202: i32 = 2;

    pub const USUARIO_LAURA: i32 = 1;
    pub const USUARIO_MARCO: i32 = 2;
    /// Account with no linked custodian.
    pub const USUARIO_ADMIN: i32 = 3;

    pub const RESGUARDANTE_LAURA: i32 = 1;
    pub const RESGUARDANTE_MARCO: i32 = 2;
    pub const RESGUARDANTE_SOFIA: i32 = 3;

    pub const BIEN_IMPRESORA: i32 = 1;
    pub const BIEN_PROYECTOR: i32 = 2;
    pub const BIEN_LAPTOP: i32 = 3;
}

/// Helper harness backed by a throwaway SQLite database and an in-memory
/// broadcaster whose messages the tests can inspect.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    broadcast_rx: broadcast::Receiver<BroadcastMessage>,
    _event_task: tokio::task::JoinHandle<()>,
    _db_dir: TempDir,
}

impl TestApp {
    /// Construct a new test application with fresh, seeded database state.
    pub async fn new() -> Self {
        let db_dir = TempDir::new().expect("temp dir for sqlite db");
        let db_path = db_dir.path().join("inventario_test.db");
        let database_url = format!("sqlite://{}?mode=rwc", db_path.display());

        let mut cfg = AppConfig::new(
            database_url,
            "redis://127.0.0.1:6379".to_string(),
            TEST_SECRET.to_string(),
            3600,
            "127.0.0.1".to_string(),
            18_080,
            "test".to_string(),
        );
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");

        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let db_arc = Arc::new(pool);
        seed(&db_arc).await;

        let broadcaster = Arc::new(InMemoryBroadcaster::default());
        let broadcast_rx = broadcaster.subscribe();

        let (event_tx, event_rx) = mpsc::channel(64);
        let event_sender = EventSender::new(event_tx);
        let event_task = tokio::spawn(events::process_events(
            event_rx,
            broadcaster.clone(),
            cfg.broadcast_channel.clone(),
        ));

        let services = AppServices::new(
            db_arc.clone(),
            Arc::new(event_sender.clone()),
            logging::discard_logger(),
        );

        let state = AppState {
            db: db_arc,
            config: cfg,
            event_sender,
            services,
            broadcaster,
        };

        let router = Router::new()
            .nest("/api/v1", inventario_api::api_v1_routes())
            .layer(axum::middleware::from_fn(
                inventario_api::middleware_helpers::request_id::request_id_middleware,
            ))
            .with_state(state.clone());

        Self {
            router,
            state,
            broadcast_rx,
            _event_task: event_task,
            _db_dir: db_dir,
        }
    }

    /// Bearer token for the given seeded usuario.
    pub fn token_for(&self, usuario_id: i32) -> String {
        auth::issue_token(usuario_id, None, TEST_SECRET, 3600).expect("token")
    }

    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Response<Body> {
        self.request_with_token(
            method,
            path,
            body,
            Some(self.token_for(fixtures::USUARIO_LAURA)),
        )
        .await
    }

    pub async fn request_unauthenticated(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Response<Body> {
        self.request_with_token(method, path, body, None).await
    }

    pub async fn request_with_token(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        token: Option<String>,
    ) -> Response<Body> {
        let mut builder = Request::builder().method(method).uri(path);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {}", token));
        }

        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .expect("request"),
            None => builder.body(Body::empty()).expect("request"),
        };

        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router response")
    }

    /// Awaits the next broadcast message, failing the test if none arrives.
    pub async fn next_broadcast(&mut self) -> BroadcastMessage {
        tokio::time::timeout(Duration::from_secs(2), self.broadcast_rx.recv())
            .await
            .expect("timed out waiting for a broadcast")
            .expect("broadcast channel closed")
    }

    /// Asserts that no further broadcast arrives within a short grace period.
    pub async fn assert_no_more_broadcasts(&mut self) {
        tokio::time::sleep(Duration::from_millis(100)).await;
        match self.broadcast_rx.try_recv() {
            Err(broadcast::error::TryRecvError::Empty) => {}
            Ok(message) => panic!("unexpected broadcast: {:?}", message),
            Err(other) => panic!("broadcast channel in unexpected state: {:?}", other),
        }
    }
}

pub async fn response_json(response: Response<Body>) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("response body bytes");
    serde_json::from_slice(&bytes).expect("json response")
}

async fn seed(db: &Arc<sea_orm::DatabaseConnection>) {
    let db = db.as_ref();

    departamento::ActiveModel {
        id: Set(fixtures::DEP_ADMINISTRACION),
        nombre: Set("Administración".into()),
    }
    .insert(db)
    .await
    .expect("seed departamento");

    departamento::ActiveModel {
        id: Set(fixtures::DEP_TECNOLOGIA),
        nombre: Set("Tecnología".into()),
    }
    .insert(db)
    .await
    .expect("seed departamento");

    oficina::ActiveModel {
        id: Set(fixtures::OFICINA_101),
        nombre: Set("Oficina 101".into()),
        departamento_id: Set(fixtures::DEP_ADMINISTRACION),
    }
    .insert(db)
    .await
    .expect("seed oficina");

    oficina::ActiveModel {
        id: Set(fixtures::OFICINA_202),
        nombre: Set("Oficina 202".into()),
        departamento_id: Set(fixtures::DEP_TECNOLOGIA),
    }
    .insert(db)
    .await
    .expect("seed oficina");

    for (id, nombre, email) in [
        (fixtures::USUARIO_LAURA, "Laura Cruz", "laura@inventario.test"),
        (fixtures::USUARIO_MARCO, "Marco Pérez", "marco@inventario.test"),
        (fixtures::USUARIO_ADMIN, "Admin", "admin@inventario.test"),
    ] {
        usuario::ActiveModel {
            id: Set(id),
            nombre: Set(nombre.into()),
            email: Set(email.into()),
            password_hash: Set("not-a-real-hash".into()),
            ..Default::default()
        }
        .insert(db)
        .await
        .expect("seed usuario");
    }

    for (id, nombre, departamento_id, usuario_id) in [
        (
            fixtures::RESGUARDANTE_LAURA,
            "Laura Cruz",
            fixtures::DEP_ADMINISTRACION,
            Some(fixtures::USUARIO_LAURA),
        ),
        (
            fixtures::RESGUARDANTE_MARCO,
            "Marco Pérez",
            fixtures::DEP_TECNOLOGIA,
            Some(fixtures::USUARIO_MARCO),
        ),
        (
            fixtures::RESGUARDANTE_SOFIA,
            "Sofía Ramos",
            fixtures::DEP_ADMINISTRACION,
            None,
        ),
    ] {
        resguardante::ActiveModel {
            id: Set(id),
            nombre: Set(nombre.into()),
            departamento_id: Set(departamento_id),
            usuario_id: Set(usuario_id),
        }
        .insert(db)
        .await
        .expect("seed resguardante");
    }

    for (id, codigo, nombre, oficina_id, valor) in [
        (
            fixtures::BIEN_IMPRESORA,
            "INV-0001",
            "Impresora láser",
            fixtures::OFICINA_101,
            dec!(4500.00),
        ),
        (
            fixtures::BIEN_PROYECTOR,
            "INV-0002",
            "Proyector",
            fixtures::OFICINA_101,
            dec!(12000.00),
        ),
        (
            fixtures::BIEN_LAPTOP,
            "INV-0003",
            "Laptop de desarrollo",
            fixtures::OFICINA_202,
            dec!(28000.00),
        ),
    ] {
        bien::ActiveModel {
            id: Set(id),
            codigo: Set(codigo.into()),
            nombre: Set(nombre.into()),
            descripcion: Set(None),
            valor: Set(valor),
            oficina_id: Set(oficina_id),
            resguardante_id: Set(None),
            ..Default::default()
        }
        .insert(db)
        .await
        .expect("seed bien");
    }
}
