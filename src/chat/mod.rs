pub mod feed;
pub mod send;
pub mod store;
pub mod view;
pub mod widget;

pub use feed::{ConnectionState, FeedController, Strategy};
pub use send::{ChatForm, NotificationPermission, Notifier, PipelineState, SendOutcome, SendPipeline};
pub use store::{ChatSink, ChatSinks, MessageStore};
pub use view::ChatView;
pub use widget::{SupportChat, WidgetPanel};
