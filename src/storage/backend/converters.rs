//! sea-orm Model 与领域模型之间的转换

use migration::entities::{activity, activity_image, activity_video, customer, discount, order, publish};
use sea_orm::ActiveValue::{NotSet, Set};

use crate::errors::{Result, TuangouError};
use crate::storage::models::{
    Activity, ActivityStatus, Customer, Discount, MediaFile, Order, OrderStatus, Publish,
};

pub fn activity_status_from_i32(value: i32) -> Result<ActivityStatus> {
    ActivityStatus::from_repr(value)
        .ok_or_else(|| TuangouError::database_operation(format!("未知活动状态: {}", value)))
}

pub fn order_status_from_i32(value: i32) -> Result<OrderStatus> {
    OrderStatus::from_repr(value)
        .ok_or_else(|| TuangouError::database_operation(format!("未知订单状态: {}", value)))
}

pub fn discount_to_domain(model: discount::Model) -> Discount {
    Discount {
        id: model.id,
        level: model.level,
        people_count: model.people_count,
        percent: model.percent,
    }
}

pub fn media_to_domain(file_name: String, position: i32) -> MediaFile {
    MediaFile {
        file_name,
        position,
    }
}

pub fn activity_to_domain(
    model: activity::Model,
    discounts: Vec<discount::Model>,
    images: Vec<activity_image::Model>,
    videos: Vec<activity_video::Model>,
) -> Result<Activity> {
    Ok(Activity {
        id: model.id,
        user_id: model.user_id,
        code: model.code,
        name: model.name,
        description: model.description,
        start_at: model.start_at,
        end_at: model.end_at,
        pay_end_at: model.pay_end_at,
        price: model.price,
        total_count: model.total_count,
        status: activity_status_from_i32(model.status)?,
        discount_level: model.discount_level,
        final_price: model.final_price,
        link_count: model.link_count,
        registered_count: model.registered_count,
        buy_count: model.buy_count,
        preorder_item_count: model.preorder_item_count,
        discounts: discounts.into_iter().map(discount_to_domain).collect(),
        images: images
            .into_iter()
            .map(|m| media_to_domain(m.file_name, m.position))
            .collect(),
        videos: videos
            .into_iter()
            .map(|m| media_to_domain(m.file_name, m.position))
            .collect(),
        created_at: model.created_at,
    })
}

/// 活动主表的 ActiveModel（不含子表）
pub fn activity_to_active_model(act: &Activity, is_new: bool) -> activity::ActiveModel {
    let now = chrono::Utc::now();
    activity::ActiveModel {
        id: if is_new { NotSet } else { Set(act.id) },
        user_id: Set(act.user_id),
        code: Set(act.code.clone()),
        name: Set(act.name.clone()),
        description: Set(act.description.clone()),
        start_at: Set(act.start_at),
        end_at: Set(act.end_at),
        pay_end_at: Set(act.pay_end_at),
        price: Set(act.price),
        total_count: Set(act.total_count),
        status: Set(act.status as i32),
        discount_level: Set(act.discount_level),
        final_price: Set(act.final_price),
        link_count: Set(act.link_count),
        registered_count: Set(act.registered_count),
        buy_count: Set(act.buy_count),
        preorder_item_count: Set(act.preorder_item_count),
        created_at: if is_new { Set(now) } else { NotSet },
        updated_at: Set(now),
    }
}

pub fn publish_to_domain(model: publish::Model) -> Publish {
    Publish {
        id: model.id,
        activity_id: model.activity_id,
        machine_id: model.machine_id,
        link_count: model.link_count,
        published: model.published,
    }
}

pub fn order_to_domain(model: order::Model) -> Result<Order> {
    Ok(Order {
        id: model.id,
        publish_id: model.publish_id,
        customer_id: model.customer_id,
        pre_count: model.pre_count,
        buy_count: model.buy_count,
        total_price: model.total_price,
        status: order_status_from_i32(model.status)?,
        created_at: model.created_at,
    })
}

pub fn order_to_active_model(ord: &Order, is_new: bool) -> order::ActiveModel {
    order::ActiveModel {
        id: if is_new { NotSet } else { Set(ord.id) },
        publish_id: Set(ord.publish_id),
        customer_id: Set(ord.customer_id),
        pre_count: Set(ord.pre_count),
        buy_count: Set(ord.buy_count),
        total_price: Set(ord.total_price),
        status: Set(ord.status as i32),
        created_at: if is_new {
            Set(chrono::Utc::now())
        } else {
            NotSet
        },
    }
}

pub fn customer_to_domain(model: customer::Model) -> Customer {
    Customer {
        id: model.id,
        phone: model.phone,
        name: model.name,
        email: model.email,
        address: model.address,
    }
}
