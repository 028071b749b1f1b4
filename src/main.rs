use std::sync::Arc;

use actix_web::{web, App, HttpServer};
use tracing::info;

use tuangou::api::services::{activity, health, order};
use tuangou::config::AppConfig;
use tuangou::notify::{notify_channel, LogNotifier, NotifyDispatcher};
use tuangou::services::{ActivityService, OrderService, StatusScheduler};
use tuangou::storage::{SeaOrmStore, Store};
use tuangou::system::init_logging;
use tuangou::utils::{Clock, SystemClock};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load().unwrap_or_else(|e| {
        eprintln!("{}", e.format_simple());
        std::process::exit(1);
    });

    let _log_guard = init_logging(&config.logging);

    // 存储后端
    let store: Arc<dyn Store> = Arc::new(
        SeaOrmStore::new(&config.database.url, &config.database.backend)
            .await
            .unwrap_or_else(|e| {
                eprintln!("{}", e.format_simple());
                std::process::exit(1);
            }),
    );

    // 通知调度器
    let (notify_handle, notify_rx) = notify_channel();
    let dispatcher = NotifyDispatcher::new(notify_rx, Arc::new(LogNotifier));
    tokio::spawn(dispatcher.run());

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let activity_service = Arc::new(ActivityService::new(
        store.clone(),
        notify_handle.clone(),
        clock.clone(),
        config.pages.clone(),
        &config.pricing,
    ));
    let order_service = Arc::new(OrderService::new(
        store.clone(),
        activity_service.clone(),
        notify_handle,
        clock,
        config.pages.clone(),
    ));

    // 周期性状态推进与计数重算
    let scheduler = Arc::new(StatusScheduler::new(
        store.clone(),
        activity_service.clone(),
        std::time::Duration::from_secs(config.schedule.status_interval_secs),
    ));
    {
        let scheduler = scheduler.clone();
        tokio::spawn(async move { scheduler.start_background_task().await });
    }

    let bind_address = format!("{}:{}", config.server.host, config.server.port);
    info!("Starting server at http://{}", bind_address);

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(activity_service.clone()))
            .app_data(web::Data::new(order_service.clone()))
            .service(
                web::scope("/api")
                    .route("/activity", web::get().to(activity::get_activities))
                    .route("/activity", web::post().to(activity::post_activity))
                    .route("/activity/{id}", web::get().to(activity::get_activity))
                    .route("/activity/{id}", web::put().to(activity::put_activity))
                    .route("/activity/{id}", web::delete().to(activity::delete_activity))
                    .route(
                        "/activity/{id}/register-count",
                        web::get().to(activity::get_register_count),
                    )
                    .route("/order", web::get().to(order::get_orders))
                    .route("/order/{id}/status", web::put().to(order::put_order_status)),
            )
            .service(
                web::scope("/mobile")
                    .route(
                        "/machine/{id}/activities",
                        web::get().to(activity::get_machine_activities),
                    )
                    .route("/order", web::post().to(order::post_order))
                    .route("/order/{id}", web::get().to(order::get_order))
                    .route("/order/{id}/buy", web::post().to(order::post_checkout)),
            )
            .route("/health", web::get().to(health::health_check))
    })
    .bind(bind_address)?
    .run()
    .await
}
