//! Periodic activity maintenance
//!
//! Advances time-driven statuses and refolds cached counters on a fixed
//! interval. The recompute reuses the same fold as the admission path,
//! so any counter drift from a missed incremental update heals on the
//! next tick.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::time::{sleep, Duration};
use tracing::{debug, warn};

use crate::services::activity_service::ActivityService;
use crate::storage::models::ActivityStatus;
use crate::storage::Store;

pub struct StatusScheduler {
    store: Arc<dyn Store>,
    activities: Arc<ActivityService>,
    interval: Duration,
    // 防止 tick 重入
    running: AtomicBool,
}

impl StatusScheduler {
    pub fn new(
        store: Arc<dyn Store>,
        activities: Arc<ActivityService>,
        interval: Duration,
    ) -> Self {
        Self {
            store,
            activities,
            interval,
            running: AtomicBool::new(false),
        }
    }

    /// 启动后台轮询任务（作为异步方法运行）
    pub async fn start_background_task(&self) {
        loop {
            sleep(self.interval).await;

            debug!("StatusScheduler: tick");
            self.tick().await;
        }
    }

    pub async fn tick(&self) {
        if self.running.swap(true, Ordering::SeqCst) {
            debug!("StatusScheduler: tick already in progress, skipping");
            return;
        }

        if let Err(e) = self.activities.advance_all().await {
            warn!("StatusScheduler: advancing activity statuses failed: {}", e);
        }

        match self
            .store
            .list_activities_excluding(ActivityStatus::End)
            .await
        {
            Ok(activities) => {
                for activity in activities {
                    if let Err(e) = self.activities.recompute_counters(activity.id).await {
                        warn!(
                            "StatusScheduler: recomputing counters for activity {} failed: {}",
                            activity.id, e
                        );
                    }
                }
            }
            Err(e) => warn!("StatusScheduler: listing activities failed: {}", e),
        }

        self.running.store(false, Ordering::SeqCst);
        debug!("StatusScheduler: tick completed");
    }
}
