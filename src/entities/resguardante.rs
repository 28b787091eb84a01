use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A person accountable for assets. Optionally linked to the system user
/// account that acts on their behalf.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "resguardantes")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub nombre: String,
    pub departamento_id: i32,
    pub usuario_id: Option<i32>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::departamento::Entity",
        from = "Column::DepartamentoId",
        to = "super::departamento::Column::Id"
    )]
    Departamento,
    #[sea_orm(
        belongs_to = "super::usuario::Entity",
        from = "Column::UsuarioId",
        to = "super::usuario::Column::Id"
    )]
    Usuario,
    #[sea_orm(has_many = "super::bien::Entity")]
    Bienes,
    #[sea_orm(has_many = "super::resguardo::Entity")]
    Resguardos,
}

impl Related<super::departamento::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Departamento.def()
    }
}

impl Related<super::usuario::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Usuario.def()
    }
}

impl Related<super::bien::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Bienes.def()
    }
}

impl Related<super::resguardo::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Resguardos.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
