// Notifier plugin implementations
pub mod webhook;

pub use webhook::WebhookNotifier;
