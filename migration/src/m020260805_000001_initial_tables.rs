use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 创建 activities 表
        manager
            .create_table(
                Table::create()
                    .table(Activity::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Activity::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Activity::UserId).big_integer().not_null())
                    .col(ColumnDef::new(Activity::Code).string_len(128).not_null())
                    .col(ColumnDef::new(Activity::Name).string_len(128).not_null())
                    .col(ColumnDef::new(Activity::Description).text().null())
                    .col(ColumnDef::new(Activity::StartAt).big_integer().not_null())
                    .col(ColumnDef::new(Activity::EndAt).big_integer().not_null())
                    .col(ColumnDef::new(Activity::PayEndAt).big_integer().not_null())
                    .col(ColumnDef::new(Activity::Price).big_integer().not_null())
                    .col(ColumnDef::new(Activity::TotalCount).big_integer().null())
                    .col(
                        ColumnDef::new(Activity::Status)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Activity::DiscountLevel)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Activity::FinalPrice).big_integer().not_null())
                    .col(
                        ColumnDef::new(Activity::LinkCount)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Activity::RegisteredCount)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Activity::BuyCount)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Activity::PreorderItemCount)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Activity::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Activity::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // 活动编码在同一用户下唯一
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_activity_user_code")
                    .table(Activity::Table)
                    .col(Activity::UserId)
                    .col(Activity::Code)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_activity_status")
                    .table(Activity::Table)
                    .col(Activity::Status)
                    .to_owned(),
            )
            .await?;

        // 创建 discounts 表
        manager
            .create_table(
                Table::create()
                    .table(Discount::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Discount::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Discount::ActivityId).big_integer().not_null())
                    .col(ColumnDef::new(Discount::Level).integer().not_null())
                    .col(ColumnDef::new(Discount::PeopleCount).big_integer().not_null())
                    .col(ColumnDef::new(Discount::Percent).integer().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_discount_activity")
                            .from(Discount::Table, Discount::ActivityId)
                            .to(Activity::Table, Activity::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_discount_activity")
                    .table(Discount::Table)
                    .col(Discount::ActivityId)
                    .to_owned(),
            )
            .await?;

        // 创建 activity_images / activity_videos 表
        manager
            .create_table(
                Table::create()
                    .table(ActivityImage::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ActivityImage::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ActivityImage::ActivityId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ActivityImage::FileName)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(ColumnDef::new(ActivityImage::Position).integer().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_activity_image_activity")
                            .from(ActivityImage::Table, ActivityImage::ActivityId)
                            .to(Activity::Table, Activity::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ActivityVideo::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ActivityVideo::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ActivityVideo::ActivityId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ActivityVideo::FileName)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(ColumnDef::new(ActivityVideo::Position).integer().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_activity_video_activity")
                            .from(ActivityVideo::Table, ActivityVideo::ActivityId)
                            .to(Activity::Table, Activity::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // 创建 publishes 表
        manager
            .create_table(
                Table::create()
                    .table(Publish::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Publish::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Publish::ActivityId).big_integer().not_null())
                    .col(ColumnDef::new(Publish::MachineId).big_integer().not_null())
                    .col(
                        ColumnDef::new(Publish::LinkCount)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Publish::Published)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_publish_activity")
                            .from(Publish::Table, Publish::ActivityId)
                            .to(Activity::Table, Activity::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_publish_activity")
                    .table(Publish::Table)
                    .col(Publish::ActivityId)
                    .to_owned(),
            )
            .await?;

        // 创建 customers 表
        manager
            .create_table(
                Table::create()
                    .table(Customer::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Customer::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Customer::Phone).string_len(32).not_null())
                    .col(ColumnDef::new(Customer::Name).string_len(128).null())
                    .col(ColumnDef::new(Customer::Email).string_len(128).null())
                    .col(ColumnDef::new(Customer::Address).string_len(255).null())
                    .col(
                        ColumnDef::new(Customer::CreatedAt)
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
                    .name("idx_customer_phone")
                    .table(Customer::Table)
                    .col(Customer::Phone)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // 创建 orders 表（历史订单不随活动删除，发布被删时由应用层保证不孤立）
        manager
            .create_table(
                Table::create()
                    .table(Order::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Order::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Order::PublishId).big_integer().not_null())
                    .col(ColumnDef::new(Order::CustomerId).big_integer().not_null())
                    .col(
                        ColumnDef::new(Order::PreCount)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Order::BuyCount)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Order::TotalPrice)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Order::Status).integer().not_null().default(0))
                    .col(
                        ColumnDef::new(Order::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_order_customer")
                            .from(Order::Table, Order::CustomerId)
                            .to(Customer::Table, Customer::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_order_publish")
                    .table(Order::Table)
                    .col(Order::PublishId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_order_customer")
                    .table(Order::Table)
                    .col(Order::CustomerId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Order::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Customer::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Publish::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ActivityVideo::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ActivityImage::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Discount::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Activity::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Activity {
    #[sea_orm(iden = "activities")]
    Table,
    Id,
    UserId,
    Code,
    Name,
    Description,
    StartAt,
    EndAt,
    PayEndAt,
    Price,
    TotalCount,
    Status,
    DiscountLevel,
    FinalPrice,
    LinkCount,
    RegisteredCount,
    BuyCount,
    PreorderItemCount,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Discount {
    #[sea_orm(iden = "discounts")]
    Table,
    Id,
    ActivityId,
    Level,
    PeopleCount,
    Percent,
}

#[derive(DeriveIden)]
enum ActivityImage {
    #[sea_orm(iden = "activity_images")]
    Table,
    Id,
    ActivityId,
    FileName,
    Position,
}

#[derive(DeriveIden)]
enum ActivityVideo {
    #[sea_orm(iden = "activity_videos")]
    Table,
    Id,
    ActivityId,
    FileName,
    Position,
}

#[derive(DeriveIden)]
enum Publish {
    #[sea_orm(iden = "publishes")]
    Table,
    Id,
    ActivityId,
    MachineId,
    LinkCount,
    Published,
}

#[derive(DeriveIden)]
enum Customer {
    #[sea_orm(iden = "customers")]
    Table,
    Id,
    Phone,
    Name,
    Email,
    Address,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Order {
    #[sea_orm(iden = "orders")]
    Table,
    Id,
    PublishId,
    CustomerId,
    PreCount,
    BuyCount,
    TotalPrice,
    Status,
    CreatedAt,
}
