use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "activities")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub user_id: i64,
    pub code: String,
    pub name: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    pub start_at: i64,
    pub end_at: i64,
    pub pay_end_at: i64,
    pub price: i64,
    pub total_count: Option<i64>,
    pub status: i32,
    pub discount_level: i32,
    pub final_price: i64,
    pub link_count: i64,
    pub registered_count: i64,
    pub buy_count: i64,
    pub preorder_item_count: i64,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::discount::Entity")]
    Discount,
    #[sea_orm(has_many = "super::publish::Entity")]
    Publish,
    #[sea_orm(has_many = "super::activity_image::Entity")]
    ActivityImage,
    #[sea_orm(has_many = "super::activity_video::Entity")]
    ActivityVideo,
}

impl Related<super::discount::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Discount.def()
    }
}

impl Related<super::publish::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Publish.def()
    }
}

impl Related<super::activity_image::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ActivityImage.def()
    }
}

impl Related<super::activity_video::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ActivityVideo.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
