use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::broadcast::Broadcaster;

/// Payload broadcast when a transfer request is created. Field names and
/// value formats are part of the client contract; do not rename.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TraspasoCreadoPayload {
    pub id: i32,
    pub bien_nombre: String,
    pub emisor: String,
    pub receptor: String,
    pub estado: String,
    pub fecha: String,
}

/// Payload broadcast when a transfer request changes state.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TraspasoActualizadoPayload {
    pub id: i32,
    pub estado: String,
}

// Define the various events that can occur in the system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    // Transfer workflow events (broadcast to clients)
    TraspasoCreado(TraspasoCreadoPayload),
    TraspasoActualizado(TraspasoActualizadoPayload),

    // Custody ledger events (logged, not broadcast)
    ResguardosAsignados {
        resguardante_id: i32,
        bienes: Vec<i32>,
    },
    ResguardosLiberados {
        bienes: Vec<i32>,
    },
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    /// Creates a new EventSender
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously. The send blocks until the forwarding
    /// task has accepted the event, so a returned Ok means hand-off happened.
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }
}

const MESES: [&str; 12] = [
    "enero",
    "febrero",
    "marzo",
    "abril",
    "mayo",
    "junio",
    "julio",
    "agosto",
    "septiembre",
    "octubre",
    "noviembre",
    "diciembre",
];

/// Formats a timestamp the way the client renders request dates,
/// e.g. "6 de agosto de 2026".
pub fn fecha_larga(fecha: &DateTime<Utc>) -> String {
    format!(
        "{} de {} de {}",
        fecha.day(),
        MESES[fecha.month0() as usize],
        fecha.year()
    )
}

// Forward incoming events to the broadcaster. Broadcast failures are logged
// and swallowed: the state change they describe is already committed.
pub async fn process_events(mut rx: mpsc::Receiver<Event>, broadcaster: Arc<dyn Broadcaster>, channel: String) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        match event {
            Event::TraspasoCreado(payload) => {
                let id = payload.id;
                match serde_json::to_value(&payload) {
                    Ok(value) => {
                        if let Err(e) = broadcaster.publish(&channel, "TraspasoCreado", value).await
                        {
                            error!(
                                "Failed to broadcast TraspasoCreado: traspaso_id={}, error={}",
                                id, e
                            );
                        }
                    }
                    Err(e) => error!("Failed to serialize TraspasoCreado payload: {}", e),
                }
            }
            Event::TraspasoActualizado(payload) => {
                let id = payload.id;
                match serde_json::to_value(&payload) {
                    Ok(value) => {
                        if let Err(e) = broadcaster
                            .publish(&channel, "TraspasoActualizado", value)
                            .await
                        {
                            error!(
                                "Failed to broadcast TraspasoActualizado: traspaso_id={}, error={}",
                                id, e
                            );
                        }
                    }
                    Err(e) => error!("Failed to serialize TraspasoActualizado payload: {}", e),
                }
            }
            Event::ResguardosAsignados {
                resguardante_id,
                bienes,
            } => {
                info!(
                    "Custody assigned: resguardante_id={}, bienes={:?}",
                    resguardante_id, bienes
                );
            }
            Event::ResguardosLiberados { bienes } => {
                info!("Custody released: bienes={:?}", bienes);
            }
        }
    }

    warn!("Event processing loop has ended");
}
