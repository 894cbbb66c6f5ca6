pub mod clock;
mod coordinator;
mod detector;
mod errors;
mod host;
mod messages;
mod popup;
mod runtime;
mod settings;
pub mod testing;
mod types;
pub mod video_url;

pub use coordinator::{ContextMenuClick, Coordinator, CoordinatorParams};
pub use detector::{run_detector, DetectorConfig, PageSnapshot, VideoDetector};
pub use errors::*;
pub use host::{Badge, HostUi, Notification, TabId};
pub use messages::{Ack, Message, Response, SummarizeReply};
pub use popup::{
    resolve_summary_url, LoadingProgress, PopupCommand, PopupConfig, PopupController, PopupState,
    PopupView,
};
pub use runtime::{spawn_coordinator, CoordinatorClient, CoordinatorHandle, MessageSink};
pub use settings::{
    FileSettingsStore, MemorySettingsStore, Settings, SettingsStore, SettingsUpdate,
};
pub use types::*;
