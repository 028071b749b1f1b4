use async_trait::async_trait;
use tracing::info;

use crate::errors::Result;

/// SMS/email delivery transport. Implementations are expected to apply
/// their own timeouts; the dispatcher treats every failure as final.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_sms(&self, phone: &str, text: &str) -> Result<()>;

    async fn send_email(&self, to: &str, subject: &str, body: &str) -> Result<()>;
}

/// Default transport: writes the would-be message to the log. Useful in
/// development and as a stand-in until a real gateway is wired up.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send_sms(&self, phone: &str, text: &str) -> Result<()> {
        info!("SMS -> {}: {}", phone, text);
        Ok(())
    }

    async fn send_email(&self, to: &str, subject: &str, body: &str) -> Result<()> {
        info!("EMAIL -> {} [{}]: {}", to, subject, body);
        Ok(())
    }
}
