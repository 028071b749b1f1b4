use tokio::sync::mpsc;
use tracing::warn;

/// 通知事件，由核心流程发出，调度器负责渲染与发送
#[derive(Debug, Clone, PartialEq)]
pub enum NotifyEvent {
    /// 预购成功
    PreorderConfirmed {
        activity_name: String,
        start_at: i64,
        end_at: i64,
        pay_due_at: i64,
        phone: String,
        link: String,
    },
    /// 达到新阶层，价格下调
    PriceDropped {
        activity_name: String,
        people_count: i64,
        final_price: i64,
        phone: String,
        link: String,
    },
    /// 活动结束，通知补款购买
    SaleClosed {
        activity_name: String,
        final_price: i64,
        pay_end_at: i64,
        send_due_at: i64,
        check_code: String,
        link: String,
        phone: String,
    },
    /// 购买完成
    PurchaseConfirmed {
        phone: String,
        email: Option<String>,
        activity_code: String,
        activity_name: String,
        buy_count: i64,
        total_price: i64,
        address: Option<String>,
        check_code: String,
        send_due_at: i64,
        link: String,
    },
}

/// Cloneable sender half handed to the services. `emit` never fails from
/// the caller's point of view; a closed channel is logged and the event
/// dropped.
#[derive(Debug, Clone)]
pub struct NotifyHandle {
    tx: mpsc::UnboundedSender<NotifyEvent>,
}

impl NotifyHandle {
    pub fn emit(&self, event: NotifyEvent) {
        if self.tx.send(event).is_err() {
            warn!("notify channel closed, event dropped");
        }
    }
}

/// Build the handle/receiver pair wiring services to the dispatcher.
pub fn notify_channel() -> (NotifyHandle, mpsc::UnboundedReceiver<NotifyEvent>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (NotifyHandle { tx }, rx)
}
