use std::sync::Arc;

use chrono::TimeZone;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::events::NotifyEvent;
use super::transport::Notifier;

/// Consumes notification events and drives the transport. Runs as a
/// detached task; dropping every [`super::NotifyHandle`] ends the loop.
pub struct NotifyDispatcher {
    rx: mpsc::UnboundedReceiver<NotifyEvent>,
    notifier: Arc<dyn Notifier>,
}

impl NotifyDispatcher {
    pub fn new(rx: mpsc::UnboundedReceiver<NotifyEvent>, notifier: Arc<dyn Notifier>) -> Self {
        Self { rx, notifier }
    }

    pub async fn run(mut self) {
        while let Some(event) = self.rx.recv().await {
            self.deliver(event).await;
        }
        debug!("NotifyDispatcher: channel closed, exiting");
    }

    /// 发送失败只记录，不重试
    async fn deliver(&self, event: NotifyEvent) {
        match event {
            NotifyEvent::PreorderConfirmed {
                activity_name,
                start_at,
                end_at,
                pay_due_at,
                phone,
                link,
            } => {
                let text = format!(
                    "【{}】團購活動 {}-{} 進行中，您已完成預購，預計 {} 出貨。訂單詳情：{}",
                    activity_name,
                    format_month_day(start_at),
                    format_month_day(end_at),
                    format_month_day(pay_due_at),
                    link
                );
                if let Err(e) = self.notifier.send_sms(&phone, &text).await {
                    warn!("preorder SMS to {} failed: {}", phone, e);
                }
            }
            NotifyEvent::PriceDropped {
                activity_name,
                people_count,
                final_price,
                phone,
                link,
            } => {
                let text = format!(
                    "【{}】報名人數已達 {} 人，團購價調降為 {} 元。訂單詳情：{}",
                    activity_name, people_count, final_price, link
                );
                if let Err(e) = self.notifier.send_sms(&phone, &text).await {
                    warn!("price-drop SMS to {} failed: {}", phone, e);
                }
            }
            NotifyEvent::SaleClosed {
                activity_name,
                final_price,
                pay_end_at,
                send_due_at,
                check_code,
                link,
                phone,
            } => {
                let text = format!(
                    "【{}】團購已截止，成交價 {} 元，請於 {} 前完成付款，{} 起憑末四碼 {} 取貨。付款連結：{}",
                    activity_name,
                    final_price,
                    format_month_day(pay_end_at),
                    format_month_day(send_due_at),
                    check_code,
                    link
                );
                if let Err(e) = self.notifier.send_sms(&phone, &text).await {
                    warn!("sale-closed SMS to {} failed: {}", phone, e);
                }
            }
            NotifyEvent::PurchaseConfirmed {
                phone,
                email,
                activity_code,
                activity_name,
                buy_count,
                total_price,
                address,
                check_code,
                send_due_at,
                link,
            } => {
                let text = format!(
                    "【{}】購買成功，金額 {} 元，{} 起憑末四碼 {} 取貨。",
                    activity_name,
                    total_price,
                    format_month_day(send_due_at),
                    check_code
                );
                if let Err(e) = self.notifier.send_sms(&phone, &text).await {
                    warn!("purchase SMS to {} failed: {}", phone, e);
                }

                if let Some(email) = email.filter(|e| !e.is_empty()) {
                    let subject = format!("[{}] {} 購買確認", activity_code, activity_name);
                    let body = format!(
                        "您已成功購買【{}】x{}，金額 {} 元。\n寄送地址：{}\n訂單詳情：{}",
                        activity_name,
                        buy_count,
                        total_price,
                        address.as_deref().unwrap_or("-"),
                        link
                    );
                    if let Err(e) = self.notifier.send_email(&email, &subject, &body).await {
                        warn!("purchase email to {} failed: {}", email, e);
                    }
                }
            }
        }
    }
}

/// Unix 秒格式化为 MM/DD
fn format_month_day(epoch: i64) -> String {
    match chrono::Utc.timestamp_opt(epoch, 0) {
        chrono::LocalResult::Single(dt) => dt.format("%m/%d").to_string(),
        _ => "--/--".to_string(),
    }
}
