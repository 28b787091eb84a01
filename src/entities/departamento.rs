use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "departamentos")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub nombre: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::oficina::Entity")]
    Oficinas,
    #[sea_orm(has_many = "super::resguardante::Entity")]
    Resguardantes,
}

impl Related<super::oficina::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Oficinas.def()
    }
}

impl Related<super::resguardante::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Resguardantes.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
