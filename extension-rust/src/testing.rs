use crate::{Badge, BoxedError, HostUi, Notification, TabId};
use async_trait::async_trait;
use std::sync::Mutex;

#[derive(Default)]
struct RecordingHostState {
    badges: Vec<(TabId, Badge)>,
    popup_attempts: usize,
    notifications: Vec<Notification>,
    active_tab_url: Option<String>,
    refuse_popup: bool,
    fail_notifications: bool,
}

/// A host that records every UI call and can be told to refuse them.
#[derive(Default)]
pub struct RecordingHost {
    state: Mutex<RecordingHostState>,
}

impl RecordingHost {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `open_popup` fail, as hosts do without a user gesture.
    pub fn refuse_popup(&self, refuse: bool) -> &Self {
        self.lock().refuse_popup = refuse;
        self
    }

    pub fn fail_notifications(&self, fail: bool) -> &Self {
        self.lock().fail_notifications = fail;
        self
    }

    pub fn set_active_tab_url(&self, url: Option<&str>) -> &Self {
        self.lock().active_tab_url = url.map(str::to_string);
        self
    }

    pub fn badges(&self) -> Vec<(TabId, Badge)> {
        self.lock().badges.clone()
    }

    pub fn popup_attempts(&self) -> usize {
        self.lock().popup_attempts
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.lock().notifications.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, RecordingHostState> {
        self.state.lock().expect("host state poisoned")
    }
}

#[async_trait]
impl HostUi for RecordingHost {
    async fn set_badge(&self, tab_id: TabId, badge: Badge) -> Result<(), BoxedError> {
        self.lock().badges.push((tab_id, badge));
        Ok(())
    }

    async fn open_popup(&self) -> Result<(), BoxedError> {
        let mut state = self.lock();
        state.popup_attempts += 1;
        if state.refuse_popup {
            return Err("openPopup requires a user gesture".into());
        }
        Ok(())
    }

    async fn notify(&self, notification: Notification) -> Result<(), BoxedError> {
        let mut state = self.lock();
        if state.fail_notifications {
            return Err("notifications are disabled".into());
        }
        state.notifications.push(notification);
        Ok(())
    }

    async fn active_tab_url(&self) -> Result<Option<String>, BoxedError> {
        Ok(self.lock().active_tab_url.clone())
    }
}
