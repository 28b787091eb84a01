use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Immutable historical fact of a custody assignment. The department is
/// stamped from the asset's office at assignment time. Release never deletes
/// a record; it closes the latest open one through `fecha_devolucion`.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "resguardos")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub bien_id: i32,
    pub resguardante_id: i32,
    pub departamento_id: i32,
    pub fecha_asignacion: DateTime<Utc>,
    pub fecha_devolucion: Option<DateTime<Utc>>,
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
        from = "Column::ResguardanteId",
        to = "super::resguardante::Column::Id"
    )]
    Resguardante,
    #[sea_orm(
        belongs_to = "super::departamento::Entity",
        from = "Column::DepartamentoId",
        to = "super::departamento::Column::Id"
    )]
    Departamento,
}

impl Related<super::bien::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Bien.def()
    }
}

impl Related<super::resguardante::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Resguardante.def()
    }
}

impl Related<super::departamento::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Departamento.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
