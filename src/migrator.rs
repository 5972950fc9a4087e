use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_jobs_table::Migration),
            Box::new(m20240101_000002_create_equipment_table::Migration),
            Box::new(m20240101_000003_create_calibrations_table::Migration),
            Box::new(m20240101_000004_create_notifications_table::Migration),
        ]
    }
}

// Migration implementations

mod m20240101_000001_create_jobs_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000001_create_jobs_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Jobs::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Jobs::Id).uuid().not_null().primary_key())
                        .col(ColumnDef::new(Jobs::Status).string().not_null())
                        .col(ColumnDef::new(Jobs::Scope).string().not_null())
                        .col(ColumnDef::new(Jobs::Priority).string().not_null())
                        .col(ColumnDef::new(Jobs::StartDate).date().not_null())
                        .col(ColumnDef::new(Jobs::EndDate).date().not_null())
                        .col(ColumnDef::new(Jobs::StartTime).time().null())
                        .col(ColumnDef::new(Jobs::EndTime).time().null())
                        .col(ColumnDef::new(Jobs::Workers).json().not_null())
                        .col(ColumnDef::new(Jobs::CustomerId).string().not_null())
                        .col(ColumnDef::new(Jobs::LocationId).string().null())
                        .col(ColumnDef::new(Jobs::Equipments).json().not_null())
                        .col(
                            ColumnDef::new(Jobs::IsReturnedEquipment)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(ColumnDef::new(Jobs::RequestedBy).string().null())
                        .col(ColumnDef::new(Jobs::Remarks).text().null())
                        .col(ColumnDef::new(Jobs::StartBy).string().null())
                        .col(
                            ColumnDef::new(Jobs::StartByAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(ColumnDef::new(Jobs::EndBy).string().null())
                        .col(
                            ColumnDef::new(Jobs::EndByAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(Jobs::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Jobs::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_jobs_status")
                        .table(Jobs::Table)
                        .col(Jobs::Status)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Jobs::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub enum Jobs {
        Table,
        Id,
        Status,
        Scope,
        Priority,
        StartDate,
        EndDate,
        StartTime,
        EndTime,
        Workers,
        CustomerId,
        LocationId,
        Equipments,
        IsReturnedEquipment,
        RequestedBy,
        Remarks,
        StartBy,
        StartByAt,
        EndBy,
        EndByAt,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240101_000002_create_equipment_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000002_create_equipment_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Equipment::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Equipment::Id)
                                .uuid()
                                .not_null()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Equipment::Name).string().not_null())
                        .col(ColumnDef::new(Equipment::SerialNo).string().null())
                        .col(
                            ColumnDef::new(Equipment::Qty)
                                .integer()
                                .not_null()
                                .default(0)
                                .check(Expr::col(Equipment::Qty).gte(0)),
                        )
                        .col(
                            ColumnDef::new(Equipment::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Equipment::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Equipment::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub enum Equipment {
        Table,
        Id,
        Name,
        SerialNo,
        Qty,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240101_000003_create_calibrations_table {

    use super::m20240101_000001_create_jobs_table::Jobs;
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000003_create_calibrations_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Calibrations::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Calibrations::Id)
                                .uuid()
                                .not_null()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Calibrations::JobId).uuid().not_null())
                        .col(
                            ColumnDef::new(Calibrations::EquipmentDescription)
                                .string()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Calibrations::CertificateNo).string().null())
                        .col(ColumnDef::new(Calibrations::DateCalibrated).date().not_null())
                        .col(
                            ColumnDef::new(Calibrations::DueDateRequested)
                                .string()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Calibrations::DueDateDuration).integer().null())
                        .col(ColumnDef::new(Calibrations::DueDate).date().null())
                        .col(ColumnDef::new(Calibrations::Status).string().not_null())
                        .col(
                            ColumnDef::new(Calibrations::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_calibrations_job_id")
                                .from(Calibrations::Table, Calibrations::JobId)
                                .to(Jobs::Table, Jobs::Id)
                                .on_delete(ForeignKeyAction::Restrict)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_calibrations_job_id")
                        .table(Calibrations::Table)
                        .col(Calibrations::JobId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Calibrations::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Calibrations {
        Table,
        Id,
        JobId,
        EquipmentDescription,
        CertificateNo,
        DateCalibrated,
        DueDateRequested,
        DueDateDuration,
        DueDate,
        Status,
        CreatedAt,
    }
}

mod m20240101_000004_create_notifications_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000004_create_notifications_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Notifications::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Notifications::Id)
                                .uuid()
                                .not_null()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Notifications::Module).string().not_null())
                        .col(ColumnDef::new(Notifications::Target).json().not_null())
                        .col(ColumnDef::new(Notifications::Title).string().not_null())
                        .col(ColumnDef::new(Notifications::Message).text().not_null())
                        .col(ColumnDef::new(Notifications::Data).json().not_null())
                        .col(
                            ColumnDef::new(Notifications::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Notifications::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Notifications {
        Table,
        Id,
        Module,
        Target,
        Title,
        Message,
        Data,
        CreatedAt,
    }
}
