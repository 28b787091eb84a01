use crate::{
    db::DbPool,
    entities::{
        bien::{self, Entity as Bien},
        resguardante::{self, Entity as Resguardante},
        resguardo,
        traspaso::{self, Entity as Traspaso, TraspasoEstado},
    },
    errors::ServiceError,
    events::{fecha_larga, Event, EventSender, TraspasoActualizadoPayload, TraspasoCreadoPayload},
    services::custody::{close_open_resguardo, resolve_departamento, unwrap_transaction_error},
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use slog::Logger;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, instrument};

/// Input for opening a transfer request. The origin custodian is resolved
/// from the acting user, not taken from the caller.
#[derive(Debug, Clone)]
pub struct CreateTransferInput {
    pub bien_id: i32,
    pub receptor_id: i32,
    pub observaciones: Option<String>,
}

/// Filter for the transfer list read side.
#[derive(Debug, Clone, Default)]
pub struct TransferFilter {
    pub estado: Option<TraspasoEstado>,
    pub buscar: Option<String>,
    pub page: u64,
    pub limit: u64,
}

/// A transfer request with the display names the client renders.
#[derive(Debug, Clone)]
pub struct TransferRecord {
    pub traspaso: traspaso::Model,
    pub bien_nombre: String,
    pub emisor_nombre: String,
    pub receptor_nombre: String,
}

/// Transfer workflow: owns the traspaso state machine. Requests are created
/// `Pendiente` and resolved exactly once to `Aprobado` or `Rechazado`;
/// approval hands custody over through the ledger write path.
#[derive(Clone)]
pub struct TransferService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
    logger: Logger,
}

impl TransferService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>, logger: Logger) -> Self {
        Self {
            db_pool,
            event_sender,
            logger,
        }
    }

    /// Opens a transfer request from the acting user's custodian to the
    /// receptor. Emits `TraspasoCreado` after the insert commits.
    #[instrument(skip(self))]
    pub async fn create_transfer(
        &self,
        acting_usuario_id: i32,
        input: CreateTransferInput,
    ) -> Result<TransferRecord, ServiceError> {
        let db = self.db_pool.as_ref();

        let emisor = Resguardante::find()
            .filter(resguardante::Column::UsuarioId.eq(acting_usuario_id))
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| {
                ServiceError::ValidationError(
                    "emisor: acting user is not linked to a custodian".into(),
                )
            })?;

        let bien_row = Bien::find_by_id(input.bien_id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| {
                ServiceError::ValidationError(format!(
                    "bien_id: asset {} does not exist",
                    input.bien_id
                ))
            })?;

        let receptor = Resguardante::find_by_id(input.receptor_id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| {
                ServiceError::ValidationError(format!(
                    "receptor_id: custodian {} does not exist",
                    input.receptor_id
                ))
            })?;

        if receptor.id == emisor.id {
            return Err(ServiceError::ValidationError(
                "receptor_id: origin and destination custodians must differ".into(),
            ));
        }

        let now = Utc::now();
        let inserted = traspaso::ActiveModel {
            bien_id: Set(input.bien_id),
            emisor_id: Set(emisor.id),
            receptor_id: Set(receptor.id),
            estado: Set(TraspasoEstado::Pendiente),
            observaciones: Set(input.observaciones),
            fecha_solicitud: Set(now),
            ..Default::default()
        }
        .insert(db)
        .await
        .map_err(ServiceError::db_error)?;

        slog::info!(self.logger, "transfer request created";
            "traspaso_id" => inserted.id,
            "bien_id" => inserted.bien_id,
            "emisor_id" => inserted.emisor_id,
            "receptor_id" => inserted.receptor_id,
        );

        // Emission runs strictly after the committed insert. A failed
        // hand-off is logged; the request already succeeded.
        let payload = TraspasoCreadoPayload {
            id: inserted.id,
            bien_nombre: bien_row.nombre.clone(),
            emisor: emisor.nombre.clone(),
            receptor: receptor.nombre.clone(),
            estado: inserted.estado.as_str().to_string(),
            fecha: fecha_larga(&inserted.fecha_solicitud),
        };
        if let Err(e) = self.event_sender.send(Event::TraspasoCreado(payload)).await {
            error!(
                "Failed to send TraspasoCreado event for traspaso {}: {}",
                inserted.id, e
            );
        }

        Ok(TransferRecord {
            traspaso: inserted,
            bien_nombre: bien_row.nombre,
            emisor_nombre: emisor.nombre,
            receptor_nombre: receptor.nombre,
        })
    }

    /// Resolves a pending transfer to a terminal state. Approval performs the
    /// custody handoff in the same transaction as the state write; a traspaso
    /// that is already terminal is rejected with a conflict.
    #[instrument(skip(self))]
    pub async fn resolve_transfer(
        &self,
        traspaso_id: i32,
        nuevo_estado: TraspasoEstado,
    ) -> Result<traspaso::Model, ServiceError> {
        if !nuevo_estado.is_terminal() {
            return Err(ServiceError::ValidationError(
                "estado: must be Aprobado or Rechazado".into(),
            ));
        }

        let db = self.db_pool.as_ref();
        let target = nuevo_estado.clone();
        let updated = db
            .transaction::<_, traspaso::Model, ServiceError>(move |txn| {
                Box::pin(async move {
                    let existing = Traspaso::find_by_id(traspaso_id)
                        .one(txn)
                        .await
                        .map_err(ServiceError::db_error)?
                        .ok_or_else(|| {
                            ServiceError::NotFound(format!("Traspaso {} not found", traspaso_id))
                        })?;

                    if existing.estado.is_terminal() {
                        return Err(ServiceError::Conflict(format!(
                            "Traspaso {} was already resolved ({})",
                            traspaso_id, existing.estado
                        )));
                    }

                    let bien_id = existing.bien_id;
                    let receptor_id = existing.receptor_id;

                    let mut active: traspaso::ActiveModel = existing.into();
                    active.estado = Set(target.clone());
                    let updated = active.update(txn).await.map_err(ServiceError::db_error)?;

                    if target == TraspasoEstado::Aprobado {
                        let bien_row = Bien::find_by_id(bien_id)
                            .one(txn)
                            .await
                            .map_err(ServiceError::db_error)?
                            .ok_or_else(|| {
                                ServiceError::db_error(format!(
                                    "traspaso {} references missing bien {}",
                                    traspaso_id, bien_id
                                ))
                            })?;

                        let now = Utc::now();
                        let departamento_id =
                            resolve_departamento(txn, bien_id, bien_row.oficina_id).await?;

                        close_open_resguardo(txn, bien_id, now).await?;

                        resguardo::ActiveModel {
                            bien_id: Set(bien_id),
                            resguardante_id: Set(receptor_id),
                            departamento_id: Set(departamento_id),
                            fecha_asignacion: Set(now),
                            fecha_devolucion: Set(None),
                            ..Default::default()
                        }
                        .insert(txn)
                        .await
                        .map_err(ServiceError::db_error)?;

                        let mut bien_row: bien::ActiveModel = bien_row.into();
                        bien_row.resguardante_id = Set(Some(receptor_id));
                        bien_row.update(txn).await.map_err(ServiceError::db_error)?;
                    }

                    Ok(updated)
                })
            })
            .await
            .map_err(unwrap_transaction_error)?;

        slog::info!(self.logger, "transfer request resolved";
            "traspaso_id" => updated.id,
            "estado" => updated.estado.as_str(),
        );

        let payload = TraspasoActualizadoPayload {
            id: updated.id,
            estado: updated.estado.as_str().to_string(),
        };
        if let Err(e) = self
            .event_sender
            .send(Event::TraspasoActualizado(payload))
            .await
        {
            error!(
                "Failed to send TraspasoActualizado event for traspaso {}: {}",
                updated.id, e
            );
        }

        Ok(updated)
    }

    /// Gets a transfer request with display names, if it exists.
    #[instrument(skip(self))]
    pub async fn get_transfer(
        &self,
        traspaso_id: i32,
    ) -> Result<Option<TransferRecord>, ServiceError> {
        let db = self.db_pool.as_ref();

        let Some(row) = Traspaso::find_by_id(traspaso_id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
        else {
            return Ok(None);
        };

        let records = self.with_display_names(vec![row]).await?;
        Ok(records.into_iter().next())
    }

    /// Lists transfer requests, newest first, optionally filtered by estado
    /// and by a case-insensitive substring over the asset name or the origin
    /// custodian name.
    #[instrument(skip(self))]
    pub async fn list_transfers(
        &self,
        filter: TransferFilter,
    ) -> Result<(Vec<TransferRecord>, u64), ServiceError> {
        let db = self.db_pool.as_ref();

        let mut query = Traspaso::find().order_by_desc(traspaso::Column::FechaSolicitud);
        if let Some(estado) = &filter.estado {
            query = query.filter(traspaso::Column::Estado.eq(estado.clone()));
        }

        let rows = query.all(db).await.map_err(ServiceError::db_error)?;
        let mut records = self.with_display_names(rows).await?;

        if let Some(needle) = filter
            .buscar
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
        {
            let needle = needle.to_lowercase();
            records.retain(|record| {
                record.bien_nombre.to_lowercase().contains(&needle)
                    || record.emisor_nombre.to_lowercase().contains(&needle)
            });
        }

        let total = records.len() as u64;
        let page = filter.page.max(1);
        let limit = filter.limit.clamp(1, 100);
        let records = records
            .into_iter()
            .skip(((page - 1) * limit) as usize)
            .take(limit as usize)
            .collect();

        Ok((records, total))
    }

    /// Batch-resolves the asset and custodian names the client renders.
    async fn with_display_names(
        &self,
        rows: Vec<traspaso::Model>,
    ) -> Result<Vec<TransferRecord>, ServiceError> {
        let db = self.db_pool.as_ref();

        let bien_ids: Vec<i32> = rows.iter().map(|r| r.bien_id).collect();
        let resguardante_ids: Vec<i32> = rows
            .iter()
            .flat_map(|r| [r.emisor_id, r.receptor_id])
            .collect();

        let bienes: HashMap<i32, String> = Bien::find()
            .filter(bien::Column::Id.is_in(bien_ids))
            .all(db)
            .await
            .map_err(ServiceError::db_error)?
            .into_iter()
            .map(|b| (b.id, b.nombre))
            .collect();

        let resguardantes: HashMap<i32, String> = Resguardante::find()
            .filter(resguardante::Column::Id.is_in(resguardante_ids))
            .all(db)
            .await
            .map_err(ServiceError::db_error)?
            .into_iter()
            .map(|r| (r.id, r.nombre))
            .collect();

        Ok(rows
            .into_iter()
            .map(|traspaso| {
                let bien_nombre = bienes.get(&traspaso.bien_id).cloned().unwrap_or_default();
                let emisor_nombre = resguardantes
                    .get(&traspaso.emisor_id)
                    .cloned()
                    .unwrap_or_default();
                let receptor_nombre = resguardantes
                    .get(&traspaso.receptor_id)
                    .cloned()
                    .unwrap_or_default();
                TransferRecord {
                    traspaso,
                    bien_nombre,
                    emisor_nombre,
                    receptor_nombre,
                }
            })
            .collect())
    }
}
