use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_stock_items_table::Migration),
            Box::new(m20240101_000002_create_stock_movements_table::Migration),
            Box::new(m20240101_000003_create_purchase_orders_tables::Migration),
            Box::new(m20240101_000004_create_sale_transactions_table::Migration),
        ]
    }
}

// Migration implementations

mod m20240101_000001_create_stock_items_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000001_create_stock_items_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(StockItems::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(StockItems::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockItems::ProductCode)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(
                            ColumnDef::new(StockItems::ProductKey)
                                .uuid()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(StockItems::Name).string().not_null())
                        .col(
                            ColumnDef::new(StockItems::QuantityOnHand)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockItems::ReorderThreshold)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockItems::TotalReceived)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockItems::TotalDispatched)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockItems::UnitPrice)
                                .decimal_len(12, 2)
                                .not_null(),
                        )
                        .col(ColumnDef::new(StockItems::Status).string().not_null())
                        .col(ColumnDef::new(StockItems::IsActive).boolean().not_null())
                        .col(
                            ColumnDef::new(StockItems::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockItems::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(StockItems::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum StockItems {
        Table,
        Id,
        ProductCode,
        ProductKey,
        Name,
        QuantityOnHand,
        ReorderThreshold,
        TotalReceived,
        TotalDispatched,
        UnitPrice,
        Status,
        IsActive,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240101_000002_create_stock_movements_table {

    use sea_orm_migration::prelude::*;

    use super::m20240101_000001_create_stock_items_table::StockItems;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000002_create_stock_movements_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(StockMovements::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(StockMovements::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockMovements::StockItemId)
                                .uuid()
                                .not_null(),
                        )
                        .col(ColumnDef::new(StockMovements::PurchaseOrderId).uuid())
                        .col(ColumnDef::new(StockMovements::PurchaseOrderLineId).uuid())
                        .col(ColumnDef::new(StockMovements::Kind).string().not_null())
                        .col(ColumnDef::new(StockMovements::Quantity).integer().not_null())
                        .col(
                            ColumnDef::new(StockMovements::QuantityBefore)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockMovements::QuantityAfter)
                                .integer()
                                .not_null(),
                        )
                        .col(ColumnDef::new(StockMovements::Comment).string())
                        .col(ColumnDef::new(StockMovements::Actor).string().not_null())
                        .col(
                            ColumnDef::new(StockMovements::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_stock_movements_stock_item")
                                .from(StockMovements::Table, StockMovements::StockItemId)
                                .to(StockItems::Table, StockItems::Id),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_stock_movements_stock_item_id")
                        .table(StockMovements::Table)
                        .col(StockMovements::StockItemId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_stock_movements_po_line_id")
                        .table(StockMovements::Table)
                        .col(StockMovements::PurchaseOrderLineId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(StockMovements::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum StockMovements {
        Table,
        Id,
        StockItemId,
        PurchaseOrderId,
        PurchaseOrderLineId,
        Kind,
        Quantity,
        QuantityBefore,
        QuantityAfter,
        Comment,
        Actor,
        CreatedAt,
    }
}

mod m20240101_000003_create_purchase_orders_tables {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000003_create_purchase_orders_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(PurchaseOrders::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(PurchaseOrders::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PurchaseOrders::OrderNumber)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(PurchaseOrders::SupplierId).uuid().not_null())
                        .col(ColumnDef::new(PurchaseOrders::Status).string().not_null())
                        .col(ColumnDef::new(PurchaseOrders::Notes).string())
                        .col(ColumnDef::new(PurchaseOrders::CreatedBy).string().not_null())
                        .col(
                            ColumnDef::new(PurchaseOrders::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PurchaseOrders::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(PurchaseOrderLines::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(PurchaseOrderLines::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PurchaseOrderLines::PurchaseOrderId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PurchaseOrderLines::ProductKey)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PurchaseOrderLines::ProductName)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PurchaseOrderLines::QuantityOrdered)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PurchaseOrderLines::QuantityReceived)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PurchaseOrderLines::UnitPrice)
                                .decimal_len(12, 2)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PurchaseOrderLines::LineTotal)
                                .decimal_len(12, 2)
                                .not_null(),
                        )
                        .col(ColumnDef::new(PurchaseOrderLines::Status).string().not_null())
                        .col(ColumnDef::new(PurchaseOrderLines::ReceivingDocument).string())
                        .col(
                            ColumnDef::new(PurchaseOrderLines::OrderedDate)
                                .date()
                                .not_null(),
                        )
                        .col(ColumnDef::new(PurchaseOrderLines::ExpectedDate).date())
                        .col(
                            ColumnDef::new(PurchaseOrderLines::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PurchaseOrderLines::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_purchase_order_lines_order")
                                .from(
                                    PurchaseOrderLines::Table,
                                    PurchaseOrderLines::PurchaseOrderId,
                                )
                                .to(PurchaseOrders::Table, PurchaseOrders::Id),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_purchase_order_lines_order_id")
                        .table(PurchaseOrderLines::Table)
                        .col(PurchaseOrderLines::PurchaseOrderId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(PurchaseOrderLines::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(PurchaseOrders::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum PurchaseOrders {
        Table,
        Id,
        OrderNumber,
        SupplierId,
        Status,
        Notes,
        CreatedBy,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    pub(super) enum PurchaseOrderLines {
        Table,
        Id,
        PurchaseOrderId,
        ProductKey,
        ProductName,
        QuantityOrdered,
        QuantityReceived,
        UnitPrice,
        LineTotal,
        Status,
        ReceivingDocument,
        OrderedDate,
        ExpectedDate,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240101_000004_create_sale_transactions_table {

    use sea_orm_migration::prelude::*;

    use super::m20240101_000001_create_stock_items_table::StockItems;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000004_create_sale_transactions_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(SaleTransactions::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(SaleTransactions::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(SaleTransactions::StockItemId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(SaleTransactions::BuyerName)
                                .string()
                                .not_null(),
                        )
                        .col(ColumnDef::new(SaleTransactions::BuyerContact).string())
                        .col(
                            ColumnDef::new(SaleTransactions::Quantity)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(SaleTransactions::TotalPrice)
                                .decimal_len(12, 2)
                                .not_null(),
                        )
                        .col(ColumnDef::new(SaleTransactions::Status).string().not_null())
                        .col(
                            ColumnDef::new(SaleTransactions::CreatedBy)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(SaleTransactions::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(SaleTransactions::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_sale_transactions_stock_item")
                                .from(SaleTransactions::Table, SaleTransactions::StockItemId)
                                .to(StockItems::Table, StockItems::Id),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_sale_transactions_stock_item_id")
                        .table(SaleTransactions::Table)
                        .col(SaleTransactions::StockItemId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(SaleTransactions::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum SaleTransactions {
        Table,
        Id,
        StockItemId,
        BuyerName,
        BuyerContact,
        Quantity,
        TotalPrice,
        Status,
        CreatedBy,
        CreatedAt,
        UpdatedAt,
    }
}
