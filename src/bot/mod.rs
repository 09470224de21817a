pub mod commands;
pub mod dispatcher;
pub mod format;
pub mod poller;
pub mod telegram;

pub use dispatcher::Dispatcher;
pub use poller::UpdatePoller;
pub use telegram::TelegramClient;
