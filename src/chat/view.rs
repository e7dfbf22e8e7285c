use askama::Template;

use crate::errors::SyncError;
use crate::models::ChatMessage;

pub const EMPTY_CHAT_TEXT: &str = "هنوز پیامی وجود ندارد. سلام کنید! 👋";

/// One message flattened for the template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageView {
    pub sender: String,
    pub created_at: String,
    pub text: String,
    pub css_class: &'static str,
}

impl From<&ChatMessage> for MessageView {
    fn from(m: &ChatMessage) -> Self {
        Self {
            sender: m.sender.clone(),
            created_at: m.created_at.clone(),
            text: m.text.clone(),
            css_class: if m.is_admin { "from-admin" } else { "from-user" },
        }
    }
}

/// What a chat sink should show, independent of any render target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatView {
    Empty,
    Messages(Vec<MessageView>),
}

impl ChatView {
    pub fn build(messages: &[ChatMessage]) -> Self {
        if messages.is_empty() {
            ChatView::Empty
        } else {
            ChatView::Messages(messages.iter().map(MessageView::from).collect())
        }
    }

    pub fn message_count(&self) -> usize {
        match self {
            ChatView::Empty => 0,
            ChatView::Messages(messages) => messages.len(),
        }
    }

    /// Renders escaped HTML. Every interpolated value goes through the
    /// template's HTML escaper, so message text never becomes markup.
    pub fn to_html(&self) -> Result<String, SyncError> {
        let messages = match self {
            ChatView::Empty => &[][..],
            ChatView::Messages(messages) => messages.as_slice(),
        };
        let tmpl = ChatMessagesTemplate { messages, empty_text: EMPTY_CHAT_TEXT };
        Ok(tmpl.render()?)
    }
}

#[derive(Template)]
#[template(path = "chat_messages.html")]
struct ChatMessagesTemplate<'a> {
    messages: &'a [MessageView],
    empty_text: &'a str,
}
