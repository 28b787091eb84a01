use crate::{
    db::DbPool,
    entities::{
        bien::{self, Entity as Bien},
        oficina::Entity as Oficina,
        resguardante::Entity as Resguardante,
        resguardo::{self, Entity as Resguardo},
    },
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseTransaction, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionError, TransactionTrait,
};
use slog::Logger;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{error, instrument};

/// Custody ledger: the authoritative mapping from asset to current custodian
/// and the append-only history of that mapping. Nothing else writes
/// `bienes.resguardante_id` or inserts `resguardos` rows.
#[derive(Clone)]
pub struct CustodyService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
    logger: Logger,
}

impl CustodyService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>, logger: Logger) -> Self {
        Self {
            db_pool,
            event_sender,
            logger,
        }
    }

    /// Assigns every listed asset to the given custodian, appending one
    /// custody record per asset with the department resolved through the
    /// asset's office. All-or-nothing: one invalid id rolls the batch back.
    #[instrument(skip(self))]
    pub async fn bulk_assign(
        &self,
        resguardante_id: i32,
        bien_ids: Vec<i32>,
    ) -> Result<u64, ServiceError> {
        let bien_ids = dedupe_ids(bien_ids);
        if bien_ids.is_empty() {
            return Err(ServiceError::ValidationError(
                "bienes: at least one asset id is required".into(),
            ));
        }

        let db = self.db_pool.as_ref();
        let ids = bien_ids.clone();
        let count = db
            .transaction::<_, u64, ServiceError>(move |txn| {
                Box::pin(async move {
                    Resguardante::find_by_id(resguardante_id)
                        .one(txn)
                        .await
                        .map_err(ServiceError::db_error)?
                        .ok_or_else(|| {
                            ServiceError::ValidationError(format!(
                                "resguardante_id: custodian {} does not exist",
                                resguardante_id
                            ))
                        })?;

                    let now = Utc::now();
                    let mut count = 0u64;

                    for bien_id in ids {
                        let bien_row = Bien::find_by_id(bien_id)
                            .one(txn)
                            .await
                            .map_err(ServiceError::db_error)?
                            .ok_or_else(|| {
                                ServiceError::ValidationError(format!(
                                    "bienes: asset {} does not exist",
                                    bien_id
                                ))
                            })?;

                        let departamento_id =
                            resolve_departamento(txn, bien_id, bien_row.oficina_id).await?;

                        resguardo::ActiveModel {
                            bien_id: Set(bien_id),
                            resguardante_id: Set(resguardante_id),
                            departamento_id: Set(departamento_id),
                            fecha_asignacion: Set(now),
                            fecha_devolucion: Set(None),
                            ..Default::default()
                        }
                        .insert(txn)
                        .await
                        .map_err(ServiceError::db_error)?;

                        let mut bien_row: bien::ActiveModel = bien_row.into();
                        bien_row.resguardante_id = Set(Some(resguardante_id));
                        bien_row.update(txn).await.map_err(ServiceError::db_error)?;

                        count += 1;
                    }

                    Ok(count)
                })
            })
            .await
            .map_err(unwrap_transaction_error)?;

        slog::info!(self.logger, "custody assigned";
            "resguardante_id" => resguardante_id,
            "count" => count,
        );

        if let Err(e) = self
            .event_sender
            .send(Event::ResguardosAsignados {
                resguardante_id,
                bienes: bien_ids,
            })
            .await
        {
            error!("Failed to send custody-assigned event: {}", e);
        }

        Ok(count)
    }

    /// Releases every listed asset from its current custodian. The matching
    /// open custody record is timestamp-closed, never deleted.
    #[instrument(skip(self))]
    pub async fn bulk_release(&self, bien_ids: Vec<i32>) -> Result<u64, ServiceError> {
        let bien_ids = dedupe_ids(bien_ids);
        if bien_ids.is_empty() {
            return Err(ServiceError::ValidationError(
                "bienes: at least one asset id is required".into(),
            ));
        }

        let db = self.db_pool.as_ref();
        let ids = bien_ids.clone();
        let count = db
            .transaction::<_, u64, ServiceError>(move |txn| {
                Box::pin(async move {
                    let now = Utc::now();
                    let mut count = 0u64;

                    for bien_id in ids {
                        let bien_row = Bien::find_by_id(bien_id)
                            .one(txn)
                            .await
                            .map_err(ServiceError::db_error)?
                            .ok_or_else(|| {
                                ServiceError::ValidationError(format!(
                                    "bienes: asset {} does not exist",
                                    bien_id
                                ))
                            })?;

                        close_open_resguardo(txn, bien_id, now).await?;

                        let mut bien_row: bien::ActiveModel = bien_row.into();
                        bien_row.resguardante_id = Set(None);
                        bien_row.update(txn).await.map_err(ServiceError::db_error)?;

                        count += 1;
                    }

                    Ok(count)
                })
            })
            .await
            .map_err(unwrap_transaction_error)?;

        slog::info!(self.logger, "custody released"; "count" => count);

        if let Err(e) = self
            .event_sender
            .send(Event::ResguardosLiberados { bienes: bien_ids })
            .await
        {
            error!("Failed to send custody-released event: {}", e);
        }

        Ok(count)
    }

    /// Assets currently held by a custodian.
    #[instrument(skip(self))]
    pub async fn assets_for_custodian(
        &self,
        resguardante_id: i32,
    ) -> Result<Vec<bien::Model>, ServiceError> {
        let db = self.db_pool.as_ref();

        Resguardante::find_by_id(resguardante_id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Resguardante {} not found", resguardante_id))
            })?;

        Bien::find()
            .filter(bien::Column::ResguardanteId.eq(resguardante_id))
            .order_by_asc(bien::Column::Codigo)
            .all(db)
            .await
            .map_err(ServiceError::db_error)
    }

    /// Custody history for an asset, newest first.
    #[instrument(skip(self))]
    pub async fn custody_history(&self, bien_id: i32) -> Result<Vec<resguardo::Model>, ServiceError> {
        let db = self.db_pool.as_ref();

        Bien::find_by_id(bien_id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound(format!("Bien {} not found", bien_id)))?;

        Resguardo::find()
            .filter(resguardo::Column::BienId.eq(bien_id))
            .order_by_desc(resguardo::Column::FechaAsignacion)
            .all(db)
            .await
            .map_err(ServiceError::db_error)
    }
}

/// Resolves the department an assignment is stamped with, through the
/// asset's current office.
pub(crate) async fn resolve_departamento(
    txn: &DatabaseTransaction,
    bien_id: i32,
    oficina_id: i32,
) -> Result<i32, ServiceError> {
    let oficina_row = Oficina::find_by_id(oficina_id)
        .one(txn)
        .await
        .map_err(ServiceError::db_error)?
        .ok_or_else(|| {
            ServiceError::db_error(format!(
                "bien {} references missing oficina {}",
                bien_id, oficina_id
            ))
        })?;

    Ok(oficina_row.departamento_id)
}

/// Timestamp-closes the latest open custody record for an asset, if any.
pub(crate) async fn close_open_resguardo(
    txn: &DatabaseTransaction,
    bien_id: i32,
    at: chrono::DateTime<Utc>,
) -> Result<(), ServiceError> {
    let open = Resguardo::find()
        .filter(resguardo::Column::BienId.eq(bien_id))
        .filter(resguardo::Column::FechaDevolucion.is_null())
        .order_by_desc(resguardo::Column::FechaAsignacion)
        .one(txn)
        .await
        .map_err(ServiceError::db_error)?;

    if let Some(open) = open {
        let mut open: resguardo::ActiveModel = open.into();
        open.fecha_devolucion = Set(Some(at));
        open.update(txn).await.map_err(ServiceError::db_error)?;
    }

    Ok(())
}

pub(crate) fn unwrap_transaction_error(err: TransactionError<ServiceError>) -> ServiceError {
    match err {
        TransactionError::Connection(db_err) => ServiceError::db_error(db_err),
        TransactionError::Transaction(service_err) => service_err,
    }
}

/// Keeps the first occurrence of each id; the operations take sets.
fn dedupe_ids(ids: Vec<i32>) -> Vec<i32> {
    let mut seen = HashSet::new();
    ids.into_iter().filter(|id| seen.insert(*id)).collect()
}
