use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// An office inside a department. Custody records stamp the department
/// resolved through the asset's office at assignment time.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "oficinas")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub nombre: String,
    pub departamento_id: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::departamento::Entity",
        from = "Column::DepartamentoId",
        to = "super::departamento::Column::Id"
    )]
    Departamento,
    #[sea_orm(has_many = "super::bien::Entity")]
    Bienes,
}

impl Related<super::departamento::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Departamento.def()
    }
}

impl Related<super::bien::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Bienes.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
