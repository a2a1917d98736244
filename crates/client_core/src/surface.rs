//! Seams between the controller and whatever renders the interface.

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::types::{PreviewImage, UserAction};

/// Output side of the interface. Implementations must be cheap and non-blocking;
/// `notify` is the blocking alert from the user's point of view only.
pub trait UiSurface: Send + Sync {
    fn set_upload_label(&self, label: &str);
    fn set_drop_highlight(&self, active: bool);
    fn open_file_picker(&self);
    fn show_preview(&self, image: PreviewImage);
    fn set_extracted_text(&self, text: &str);
    /// Current contents of the (user-editable) text region.
    fn extracted_text(&self) -> String;
    fn set_chat_output(&self, text: &str);
    fn notify(&self, message: &str);
}

/// Input side of the interface.
#[async_trait]
pub trait UiEventSource: Send {
    /// `None` once the interface is closed.
    async fn next_action(&mut self) -> Option<UserAction>;
}

#[async_trait]
impl UiEventSource for mpsc::UnboundedReceiver<UserAction> {
    async fn next_action(&mut self) -> Option<UserAction> {
        self.recv().await
    }
}
