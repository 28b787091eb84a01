use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240115_000001_create_catalog_tables::Migration),
            Box::new(m20240115_000002_create_usuarios_tables::Migration),
            Box::new(m20240115_000003_create_resguardantes_table::Migration),
            Box::new(m20240115_000004_create_bienes_table::Migration),
            Box::new(m20240115_000005_create_resguardos_table::Migration),
            Box::new(m20240115_000006_create_traspasos_table::Migration),
        ]
    }
}

// Migration implementations

mod m20240115_000001_create_catalog_tables {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240115_000001_create_catalog_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Departamentos::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Departamentos::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Departamentos::Nombre).string().not_null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Oficinas::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Oficinas::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Oficinas::Nombre).string().not_null())
                        .col(
                            ColumnDef::new(Oficinas::DepartamentoId)
                                .integer()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_oficinas_departamento")
                                .from(Oficinas::Table, Oficinas::DepartamentoId)
                                .to(Departamentos::Table, Departamentos::Id),
                        )
                        .to_owned(),
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Oficinas::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Departamentos::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum Departamentos {
        Table,
        Id,
        Nombre,
    }

    #[derive(DeriveIden)]
    pub(super) enum Oficinas {
        Table,
        Id,
        Nombre,
        DepartamentoId,
    }
}

mod m20240115_000002_create_usuarios_tables {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240115_000002_create_usuarios_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Usuarios::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Usuarios::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Usuarios::Nombre).string().not_null())
                        .col(
                            ColumnDef::new(Usuarios::Email)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Usuarios::PasswordHash).string().not_null())
                        .col(
                            ColumnDef::new(Usuarios::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Usuarios::UpdatedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Sesiones::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Sesiones::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Sesiones::UsuarioId).integer().not_null())
                        .col(ColumnDef::new(Sesiones::TokenHash).string().not_null())
                        .col(
                            ColumnDef::new(Sesiones::ExpiresAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Sesiones::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_sesiones_usuario")
                                .from(Sesiones::Table, Sesiones::UsuarioId)
                                .to(Usuarios::Table, Usuarios::Id),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_sesiones_expires_at")
                        .table(Sesiones::Table)
                        .col(Sesiones::ExpiresAt)
                        .to_owned(),
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Sesiones::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Usuarios::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum Usuarios {
        Table,
        Id,
        Nombre,
        Email,
        PasswordHash,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    pub(super) enum Sesiones {
        Table,
        Id,
        UsuarioId,
        TokenHash,
        ExpiresAt,
        CreatedAt,
    }
}

mod m20240115_000003_create_resguardantes_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240115_000003_create_resguardantes_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Resguardantes::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Resguardantes::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Resguardantes::Nombre).string().not_null())
                        .col(
                            ColumnDef::new(Resguardantes::DepartamentoId)
                                .integer()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Resguardantes::UsuarioId).integer().null())
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_resguardantes_departamento")
                                .from(Resguardantes::Table, Resguardantes::DepartamentoId)
                                .to(
                                    super::m20240115_000001_create_catalog_tables::Departamentos::Table,
                                    super::m20240115_000001_create_catalog_tables::Departamentos::Id,
                                ),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_resguardantes_usuario")
                                .from(Resguardantes::Table, Resguardantes::UsuarioId)
                                .to(
                                    super::m20240115_000002_create_usuarios_tables::Usuarios::Table,
                                    super::m20240115_000002_create_usuarios_tables::Usuarios::Id,
                                ),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_resguardantes_usuario_id")
                        .table(Resguardantes::Table)
                        .col(Resguardantes::UsuarioId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Resguardantes::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum Resguardantes {
        Table,
        Id,
        Nombre,
        DepartamentoId,
        UsuarioId,
    }
}

mod m20240115_000004_create_bienes_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240115_000004_create_bienes_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Bienes::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Bienes::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(Bienes::Codigo)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Bienes::Nombre).string().not_null())
                        .col(ColumnDef::new(Bienes::Descripcion).string().null())
                        .col(
                            ColumnDef::new(Bienes::Valor)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(Bienes::OficinaId).integer().not_null())
                        .col(ColumnDef::new(Bienes::ResguardanteId).integer().null())
                        .col(
                            ColumnDef::new(Bienes::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Bienes::UpdatedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_bienes_oficina")
                                .from(Bienes::Table, Bienes::OficinaId)
                                .to(
                                    super::m20240115_000001_create_catalog_tables::Oficinas::Table,
                                    super::m20240115_000001_create_catalog_tables::Oficinas::Id,
                                ),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_bienes_resguardante")
                                .from(Bienes::Table, Bienes::ResguardanteId)
                                .to(
                                    super::m20240115_000003_create_resguardantes_table::Resguardantes::Table,
                                    super::m20240115_000003_create_resguardantes_table::Resguardantes::Id,
                                ),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_bienes_resguardante_id")
                        .table(Bienes::Table)
                        .col(Bienes::ResguardanteId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Bienes::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum Bienes {
        Table,
        Id,
        Codigo,
        Nombre,
        Descripcion,
        Valor,
        OficinaId,
        ResguardanteId,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240115_000005_create_resguardos_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240115_000005_create_resguardos_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Resguardos::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Resguardos::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Resguardos::BienId).integer().not_null())
                        .col(
                            ColumnDef::new(Resguardos::ResguardanteId)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Resguardos::DepartamentoId)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Resguardos::FechaAsignacion)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Resguardos::FechaDevolucion)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_resguardos_bien")
                                .from(Resguardos::Table, Resguardos::BienId)
                                .to(
                                    super::m20240115_000004_create_bienes_table::Bienes::Table,
                                    super::m20240115_000004_create_bienes_table::Bienes::Id,
                                ),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_resguardos_resguardante")
                                .from(Resguardos::Table, Resguardos::ResguardanteId)
                                .to(
                                    super::m20240115_000003_create_resguardantes_table::Resguardantes::Table,
                                    super::m20240115_000003_create_resguardantes_table::Resguardantes::Id,
                                ),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_resguardos_bien_id")
                        .table(Resguardos::Table)
                        .col(Resguardos::BienId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_resguardos_resguardante_id")
                        .table(Resguardos::Table)
                        .col(Resguardos::ResguardanteId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Resguardos::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum Resguardos {
        Table,
        Id,
        BienId,
        ResguardanteId,
        DepartamentoId,
        FechaAsignacion,
        FechaDevolucion,
    }
}

mod m20240115_000006_create_traspasos_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240115_000006_create_traspasos_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Traspasos::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Traspasos::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Traspasos::BienId).integer().not_null())
                        .col(ColumnDef::new(Traspasos::EmisorId).integer().not_null())
                        .col(ColumnDef::new(Traspasos::ReceptorId).integer().not_null())
                        .col(
                            ColumnDef::new(Traspasos::Estado)
                                .string_len(16)
                                .not_null(),
                        )
                        .col(ColumnDef::new(Traspasos::Observaciones).string().null())
                        .col(
                            ColumnDef::new(Traspasos::FechaSolicitud)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Traspasos::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Traspasos::UpdatedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_traspasos_bien")
                                .from(Traspasos::Table, Traspasos::BienId)
                                .to(
                                    super::m20240115_000004_create_bienes_table::Bienes::Table,
                                    super::m20240115_000004_create_bienes_table::Bienes::Id,
                                ),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_traspasos_emisor")
                                .from(Traspasos::Table, Traspasos::EmisorId)
                                .to(
                                    super::m20240115_000003_create_resguardantes_table::Resguardantes::Table,
                                    super::m20240115_000003_create_resguardantes_table::Resguardantes::Id,
                                ),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_traspasos_receptor")
                                .from(Traspasos::Table, Traspasos::ReceptorId)
                                .to(
                                    super::m20240115_000003_create_resguardantes_table::Resguardantes::Table,
                                    super::m20240115_000003_create_resguardantes_table::Resguardantes::Id,
                                ),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_traspasos_estado")
                        .table(Traspasos::Table)
                        .col(Traspasos::Estado)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Traspasos::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum Traspasos {
        Table,
        Id,
        BienId,
        EmisorId,
        ReceptorId,
        Estado,
        Observaciones,
        FechaSolicitud,
        CreatedAt,
        UpdatedAt,
    }
}
