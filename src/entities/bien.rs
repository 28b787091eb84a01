use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{entity::prelude::*, ActiveValue::Set};
use serde::{Deserialize, Serialize};

/// A tracked physical asset. `resguardante_id` is the current-custodian
/// pointer and is written only by the custody ledger.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "bienes")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub codigo: String,
    pub nombre: String,
    pub descripcion: Option<String>,
    pub valor: Decimal,
    pub oficina_id: i32,
    pub resguardante_id: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::oficina::Entity",
        from = "Column::OficinaId",
        to = "super::oficina::Column::Id"
    )]
    Oficina,
    #[sea_orm(
        belongs_to = "super::resguardante::Entity",
        from = "Column::ResguardanteId",
        to = "super::resguardante::Column::Id"
    )]
    Resguardante,
    #[sea_orm(has_many = "super::resguardo::Entity")]
    Resguardos,
    #[sea_orm(has_many = "super::traspaso::Entity")]
    Traspasos,
}

impl Related<super::oficina::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Oficina.def()
    }
}

impl Related<super::resguardante::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Resguardante.def()
    }
}

impl Related<super::resguardo::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Resguardos.def()
    }
}

impl Related<super::traspaso::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Traspasos.def()
    }
}

#[async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C: ConnectionTrait>(self, _db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        let mut active_model = self;

        let now = Utc::now();

        if insert {
            active_model.created_at = Set(now);
        }

        active_model.updated_at = Set(Some(now));

        Ok(active_model)
    }
}
