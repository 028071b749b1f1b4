//! sea-orm backed [`Store`] implementation

mod converters;

use std::collections::HashMap;

use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectOptions, Database, DatabaseConnection, EntityTrait,
    JoinType, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, RelationTrait,
    TransactionTrait,
};
use sea_orm::ActiveValue::{NotSet, Set};
use tracing::{info, warn};

use migration::entities::{activity, activity_image, activity_video, customer, discount, order, publish};
use migration::{Migrator, MigratorTrait};

use crate::errors::{Result, TuangouError};
use crate::storage::models::{
    Activity, ActivityCounters, ActivityStatus, Customer, Order, OrderFilter, Publish,
};
use crate::storage::Store;

#[derive(Clone)]
pub struct SeaOrmStore {
    db: DatabaseConnection,
    backend_name: String,
}

impl SeaOrmStore {
    pub async fn new(database_url: &str, backend_name: &str) -> Result<Self> {
        if database_url.is_empty() {
            return Err(TuangouError::database_config("DATABASE__URL 未设置".to_string()));
        }

        // 根据不同数据库类型配置连接选项
        let db = if backend_name == "sqlite" {
            Self::connect_sqlite(database_url).await?
        } else {
            Self::connect_generic(database_url, backend_name).await?
        };

        let store = SeaOrmStore {
            db,
            backend_name: backend_name.to_string(),
        };

        // 运行迁移
        store.run_migrations().await?;

        warn!("{} store initialized.", store.backend_name.to_uppercase());
        Ok(store)
    }

    /// 连接 SQLite 数据库（带自动创建和性能优化）
    async fn connect_sqlite(database_url: &str) -> Result<DatabaseConnection> {
        use sea_orm::SqlxSqliteConnector;
        use sea_orm::sqlx::SqlitePool;
        use sea_orm::sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqliteSynchronous};
        use std::str::FromStr;

        let opt = SqliteConnectOptions::from_str(database_url)
            .map_err(|e| TuangouError::database_config(format!("SQLite URL 解析失败: {}", e)))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(std::time::Duration::from_secs(5));

        let pool = SqlitePool::connect_with(opt).await.map_err(|e| {
            TuangouError::database_connection(format!("无法连接到 SQLite 数据库: {}", e))
        })?;

        Ok(SqlxSqliteConnector::from_sqlx_sqlite_pool(pool))
    }

    /// 连接通用数据库（MySQL/PostgreSQL）
    async fn connect_generic(database_url: &str, backend_name: &str) -> Result<DatabaseConnection> {
        let mut opt = ConnectOptions::new(database_url.to_owned());
        opt.max_connections(100)
            .min_connections(5)
            .connect_timeout(std::time::Duration::from_secs(8))
            .acquire_timeout(std::time::Duration::from_secs(8))
            .idle_timeout(std::time::Duration::from_secs(8))
            .sqlx_logging(false);

        Database::connect(opt).await.map_err(|e| {
            TuangouError::database_connection(format!(
                "无法连接到 {} 数据库: {}",
                backend_name.to_uppercase(),
                e
            ))
        })
    }

    async fn run_migrations(&self) -> Result<()> {
        Migrator::up(&self.db, None)
            .await
            .map_err(|e| TuangouError::database_operation(format!("迁移失败: {}", e)))?;

        info!("Database migrations completed");
        Ok(())
    }

    /// 读取活动的折扣阶层与图片、影片清单
    async fn load_activity(&self, model: activity::Model) -> Result<Activity> {
        let discounts = discount::Entity::find()
            .filter(discount::Column::ActivityId.eq(model.id))
            .order_by_asc(discount::Column::Level)
            .all(&self.db)
            .await?;
        let images = activity_image::Entity::find()
            .filter(activity_image::Column::ActivityId.eq(model.id))
            .order_by_asc(activity_image::Column::Position)
            .all(&self.db)
            .await?;
        let videos = activity_video::Entity::find()
            .filter(activity_video::Column::ActivityId.eq(model.id))
            .order_by_asc(activity_video::Column::Position)
            .all(&self.db)
            .await?;
        converters::activity_to_domain(model, discounts, images, videos)
    }

    async fn load_activities(&self, models: Vec<activity::Model>) -> Result<Vec<Activity>> {
        let mut result = Vec::with_capacity(models.len());
        for model in models {
            result.push(self.load_activity(model).await?);
        }
        Ok(result)
    }
}

#[async_trait]
impl Store for SeaOrmStore {
    async fn find_activity(&self, id: i64) -> Result<Option<Activity>> {
        match activity::Entity::find_by_id(id).one(&self.db).await? {
            Some(model) => Ok(Some(self.load_activity(model).await?)),
            None => Ok(None),
        }
    }

    async fn find_activity_by_code(&self, user_id: i64, code: &str) -> Result<Option<Activity>> {
        let model = activity::Entity::find()
            .filter(activity::Column::UserId.eq(user_id))
            .filter(activity::Column::Code.eq(code))
            .one(&self.db)
            .await?;
        match model {
            Some(model) => Ok(Some(self.load_activity(model).await?)),
            None => Ok(None),
        }
    }

    async fn list_activities(
        &self,
        user_id: i64,
        status: Option<ActivityStatus>,
    ) -> Result<Vec<Activity>> {
        let mut query = activity::Entity::find().filter(activity::Column::UserId.eq(user_id));
        if let Some(status) = status {
            query = query.filter(activity::Column::Status.eq(status as i32));
        }
        let models = query
            .order_by_desc(activity::Column::CreatedAt)
            .all(&self.db)
            .await?;
        self.load_activities(models).await
    }

    async fn list_user_activities_excluding(
        &self,
        user_id: i64,
        status: ActivityStatus,
    ) -> Result<Vec<Activity>> {
        let models = activity::Entity::find()
            .filter(activity::Column::UserId.eq(user_id))
            .filter(activity::Column::Status.ne(status as i32))
            .order_by_desc(activity::Column::CreatedAt)
            .all(&self.db)
            .await?;
        self.load_activities(models).await
    }

    async fn list_activities_excluding(&self, status: ActivityStatus) -> Result<Vec<Activity>> {
        let models = activity::Entity::find()
            .filter(activity::Column::Status.ne(status as i32))
            .all(&self.db)
            .await?;
        self.load_activities(models).await
    }

    async fn save_activity(&self, act: Activity) -> Result<Activity> {
        let txn = self.db.begin().await?;
        let is_new = act.id == 0;

        let model = if is_new {
            converters::activity_to_active_model(&act, true).insert(&txn).await?
        } else {
            converters::activity_to_active_model(&act, false).update(&txn).await?
        };
        let activity_id = model.id;

        // 子表整表替换
        discount::Entity::delete_many()
            .filter(discount::Column::ActivityId.eq(activity_id))
            .exec(&txn)
            .await?;
        activity_image::Entity::delete_many()
            .filter(activity_image::Column::ActivityId.eq(activity_id))
            .exec(&txn)
            .await?;
        activity_video::Entity::delete_many()
            .filter(activity_video::Column::ActivityId.eq(activity_id))
            .exec(&txn)
            .await?;

        for tier in &act.discounts {
            discount::ActiveModel {
                id: NotSet,
                activity_id: Set(activity_id),
                level: Set(tier.level),
                people_count: Set(tier.people_count),
                percent: Set(tier.percent),
            }
            .insert(&txn)
            .await?;
        }
        for image in &act.images {
            activity_image::ActiveModel {
                id: NotSet,
                activity_id: Set(activity_id),
                file_name: Set(image.file_name.clone()),
                position: Set(image.position),
            }
            .insert(&txn)
            .await?;
        }
        for video in &act.videos {
            activity_video::ActiveModel {
                id: NotSet,
                activity_id: Set(activity_id),
                file_name: Set(video.file_name.clone()),
                position: Set(video.position),
            }
            .insert(&txn)
            .await?;
        }

        txn.commit().await?;

        self.find_activity(activity_id)
            .await?
            .ok_or_else(|| TuangouError::database_operation("activity disappeared after save"))
    }

    async fn save_statuses(&self, updates: &[(i64, ActivityStatus)]) -> Result<()> {
        if updates.is_empty() {
            return Ok(());
        }
        let txn = self.db.begin().await?;
        for (id, status) in updates {
            activity::ActiveModel {
                id: Set(*id),
                status: Set(*status as i32),
                updated_at: Set(chrono::Utc::now()),
                ..Default::default()
            }
            .update(&txn)
            .await?;
        }
        txn.commit().await?;
        Ok(())
    }

    async fn save_counters(&self, activity_id: i64, counters: &ActivityCounters) -> Result<()> {
        activity::ActiveModel {
            id: Set(activity_id),
            link_count: Set(counters.link_count),
            registered_count: Set(counters.registered_count),
            buy_count: Set(counters.buy_count),
            preorder_item_count: Set(counters.preorder_item_count),
            updated_at: Set(chrono::Utc::now()),
            ..Default::default()
        }
        .update(&self.db)
        .await?;
        Ok(())
    }

    async fn save_pricing(
        &self,
        activity_id: i64,
        discount_level: i32,
        final_price: i64,
    ) -> Result<()> {
        activity::ActiveModel {
            id: Set(activity_id),
            discount_level: Set(discount_level),
            final_price: Set(final_price),
            updated_at: Set(chrono::Utc::now()),
            ..Default::default()
        }
        .update(&self.db)
        .await?;
        Ok(())
    }

    async fn delete_activity(&self, id: i64) -> Result<()> {
        // 订单不设级联，历史订单保留
        activity::Entity::delete_by_id(id).exec(&self.db).await?;
        Ok(())
    }

    async fn find_publish(&self, id: i64) -> Result<Option<Publish>> {
        Ok(publish::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .map(converters::publish_to_domain))
    }

    async fn find_publishes_with_orders(
        &self,
        activity_id: i64,
    ) -> Result<Vec<(Publish, Vec<Order>)>> {
        let publishes = publish::Entity::find()
            .filter(publish::Column::ActivityId.eq(activity_id))
            .all(&self.db)
            .await?;
        let publish_ids: Vec<i64> = publishes.iter().map(|p| p.id).collect();

        let mut orders_by_publish: HashMap<i64, Vec<Order>> = HashMap::new();
        if !publish_ids.is_empty() {
            let orders = order::Entity::find()
                .filter(order::Column::PublishId.is_in(publish_ids))
                .all(&self.db)
                .await?;
            for model in orders {
                let ord = converters::order_to_domain(model)?;
                orders_by_publish.entry(ord.publish_id).or_default().push(ord);
            }
        }

        Ok(publishes
            .into_iter()
            .map(converters::publish_to_domain)
            .map(|p| {
                let orders = orders_by_publish.remove(&p.id).unwrap_or_default();
                (p, orders)
            })
            .collect())
    }

    async fn recount_publish_orders(&self, publish_id: i64) -> Result<i64> {
        let count = order::Entity::find()
            .filter(order::Column::PublishId.eq(publish_id))
            .count(&self.db)
            .await? as i64;

        publish::ActiveModel {
            id: Set(publish_id),
            link_count: Set(count),
            ..Default::default()
        }
        .update(&self.db)
        .await?;

        Ok(count)
    }

    async fn list_machine_publishes(&self, machine_id: i64) -> Result<Vec<(Publish, Activity)>> {
        let rows = publish::Entity::find()
            .filter(publish::Column::MachineId.eq(machine_id))
            .filter(publish::Column::Published.eq(true))
            .find_also_related(activity::Entity)
            .all(&self.db)
            .await?;

        let mut result = Vec::with_capacity(rows.len());
        for (publish_model, activity_model) in rows {
            let publish = converters::publish_to_domain(publish_model);
            let activity_model = activity_model.ok_or_else(|| {
                TuangouError::database_operation(format!("publish {} has no activity", publish.id))
            })?;
            result.push((publish, self.load_activity(activity_model).await?));
        }
        Ok(result)
    }

    async fn create_order(&self, ord: Order) -> Result<Order> {
        let model = converters::order_to_active_model(&ord, true)
            .insert(&self.db)
            .await?;
        converters::order_to_domain(model)
    }

    async fn find_order(&self, id: i64) -> Result<Option<Order>> {
        match order::Entity::find_by_id(id).one(&self.db).await? {
            Some(model) => Ok(Some(converters::order_to_domain(model)?)),
            None => Ok(None),
        }
    }

    async fn save_order(&self, ord: &Order) -> Result<()> {
        converters::order_to_active_model(ord, false)
            .update(&self.db)
            .await?;
        Ok(())
    }

    async fn list_orders(&self, filter: OrderFilter) -> Result<Vec<Order>> {
        let mut query = order::Entity::find()
            .join(JoinType::InnerJoin, order::Relation::Publish.def())
            .join(JoinType::InnerJoin, publish::Relation::Activity.def());

        if let Some(user_id) = filter.user_id {
            query = query.filter(activity::Column::UserId.eq(user_id));
        }
        if let Some(activity_id) = filter.activity_id {
            query = query.filter(publish::Column::ActivityId.eq(activity_id));
        }
        if let Some(machine_id) = filter.machine_id {
            query = query.filter(publish::Column::MachineId.eq(machine_id));
        }
        if let Some(status) = filter.status {
            query = query.filter(order::Column::Status.eq(status as i32));
        }

        let models = query
            .order_by_desc(order::Column::CreatedAt)
            .all(&self.db)
            .await?;
        models.into_iter().map(converters::order_to_domain).collect()
    }

    async fn find_orders_with_customers(
        &self,
        activity_id: i64,
    ) -> Result<Vec<(Order, Customer)>> {
        let rows = order::Entity::find()
            .join(JoinType::InnerJoin, order::Relation::Publish.def())
            .filter(publish::Column::ActivityId.eq(activity_id))
            .find_also_related(customer::Entity)
            .all(&self.db)
            .await?;

        let mut result = Vec::with_capacity(rows.len());
        for (order_model, customer_model) in rows {
            let ord = converters::order_to_domain(order_model)?;
            let cust = customer_model.ok_or_else(|| {
                TuangouError::database_operation(format!("order {} has no customer", ord.id))
            })?;
            result.push((ord, converters::customer_to_domain(cust)));
        }
        Ok(result)
    }

    async fn find_customer(&self, id: i64) -> Result<Option<Customer>> {
        Ok(customer::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .map(converters::customer_to_domain))
    }

    async fn find_or_create_customer(&self, phone: &str) -> Result<Customer> {
        if let Some(model) = customer::Entity::find()
            .filter(customer::Column::Phone.eq(phone))
            .one(&self.db)
            .await?
        {
            return Ok(converters::customer_to_domain(model));
        }

        let model = customer::ActiveModel {
            id: NotSet,
            phone: Set(phone.to_string()),
            name: Set(None),
            email: Set(None),
            address: Set(None),
            created_at: Set(chrono::Utc::now()),
        }
        .insert(&self.db)
        .await?;
        Ok(converters::customer_to_domain(model))
    }

    async fn save_customer(&self, cust: &Customer) -> Result<()> {
        customer::ActiveModel {
            id: Set(cust.id),
            phone: Set(cust.phone.clone()),
            name: Set(cust.name.clone()),
            email: Set(cust.email.clone()),
            address: Set(cust.address.clone()),
            ..Default::default()
        }
        .update(&self.db)
        .await?;
        Ok(())
    }
}
