use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{entity::prelude::*, ActiveValue::Set};
use serde::{Deserialize, Serialize};

/// Enum representing the possible states of a transfer request. Wire values
/// are Spanish; they are part of the client contract.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum TraspasoEstado {
    #[sea_orm(string_value = "Pendiente")]
    Pendiente,
    #[sea_orm(string_value = "Aprobado")]
    Aprobado,
    #[sea_orm(string_value = "Rechazado")]
    Rechazado,
}

impl TraspasoEstado {
    pub fn as_str(&self) -> &'static str {
        match self {
            TraspasoEstado::Pendiente => "Pendiente",
            TraspasoEstado::Aprobado => "Aprobado",
            TraspasoEstado::Rechazado => "Rechazado",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, TraspasoEstado::Pendiente)
    }

    /// Parses any of the three states, e.g. for list filters.
    pub fn parse(value: &str) -> Option<TraspasoEstado> {
        match value {
            "Pendiente" => Some(TraspasoEstado::Pendiente),
            "Aprobado" => Some(TraspasoEstado::Aprobado),
            "Rechazado" => Some(TraspasoEstado::Rechazado),
            _ => None,
        }
    }

    /// Parses a resolution target. Only the two terminal states are valid
    /// input to a resolve operation.
    pub fn parse_resolution(value: &str) -> Option<TraspasoEstado> {
        match Self::parse(value) {
            Some(TraspasoEstado::Pendiente) | None => None,
            terminal => terminal,
        }
    }
}

impl std::fmt::Display for TraspasoEstado {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A request to move custody of one asset between two custodians.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "traspasos")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub bien_id: i32,
    pub emisor_id: i32,
    pub receptor_id: i32,
    pub estado: TraspasoEstado,
    pub observaciones: Option<String>,
    pub fecha_solicitud: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::bien::Entity",
        from = "Column::BienId",
        to = "super::bien::Column::Id"
    )]
    Bien,
    #[sea_orm(
        belongs_to = "super::resguardante::Entity",
        from = "Column::EmisorId",
        to = "super::resguardante::Column::Id"
    )]
    Emisor,
    #[sea_orm(
        belongs_to = "super::resguardante::Entity",
        from = "Column::ReceptorId",
        to = "super::resguardante::Column::Id"
    )]
    Receptor,
}

impl Related<super::bien::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Bien.def()
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
