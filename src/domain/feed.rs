use std::collections::BTreeMap;

use serde::Serialize;

use super::detection::FrameLabels;
use super::summary::{aggregate, count_labels, SummaryEntry, SummaryLog};
use super::window::RecentWindow;

pub const HISTORY_CAPACITY: usize = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedStatus {
    Running,
    Paused,
}

/// Acción recibida en `/control/{action}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedAction {
    Pause,
    Resume,
    Reload,
    Unknown(String),
}

impl From<&str> for FeedAction {
    fn from(raw: &str) -> Self {
        match raw {
            "pause" => Self::Pause,
            "resume" => Self::Resume,
            "reload" => Self::Reload,
            other => Self::Unknown(other.to_string()),
        }
    }
}

/// Vista de solo lectura del estado del feed.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FeedSnapshot {
    pub status: FeedStatus,
    pub total_frames: u64,
    pub history_len: usize,
    pub current_items: BTreeMap<String, usize>,
}

/// Estado del feed: pausa, último frame, historial acotado y registro de resúmenes.
#[derive(Debug, Clone)]
pub struct FeedState {
    status: FeedStatus,
    current_items: FrameLabels,
    identified_items: RecentWindow<FrameLabels>,
    total_frames: u64,
    summary_log: SummaryLog,
}

impl Default for FeedState {
    fn default() -> Self {
        Self::new()
    }
}

impl FeedState {
    pub fn new() -> Self {
        Self {
            status: FeedStatus::Running,
            current_items: Vec::new(),
            identified_items: RecentWindow::with_capacity(HISTORY_CAPACITY),
            total_frames: 0,
            summary_log: SummaryLog::new(),
        }
    }

    pub fn status(&self) -> FeedStatus {
        self.status
    }

    pub fn is_paused(&self) -> bool {
        self.status == FeedStatus::Paused
    }

    pub fn total_frames(&self) -> u64 {
        self.total_frames
    }

    pub fn history(&self) -> &RecentWindow<FrameLabels> {
        &self.identified_items
    }

    pub fn summary_log(&self) -> &SummaryLog {
        &self.summary_log
    }

    /// Aplica una acción de control. Devuelve `false` si la acción es desconocida
    /// (se acepta igualmente sin efecto).
    ///
    /// `reload` reanuda y vacía el registro de resúmenes, pero conserva el
    /// historial por frame y `total_frames`.
    pub fn apply(&mut self, action: &FeedAction) -> bool {
        match action {
            FeedAction::Pause => self.status = FeedStatus::Paused,
            FeedAction::Resume => self.status = FeedStatus::Running,
            FeedAction::Reload => {
                self.status = FeedStatus::Running;
                self.summary_log.clear();
            }
            FeedAction::Unknown(_) => return false,
        }
        true
    }

    /// Registra las etiquetas de un frame procesado. En pausa no se toca nada.
    pub fn record_frame(&mut self, labels: FrameLabels) -> bool {
        if self.is_paused() {
            return false;
        }
        self.current_items = labels;
        self.identified_items.push_newest(self.current_items.clone());
        self.total_frames += 1;
        true
    }

    /// Atiende un sondeo: si no está en pausa y hay historial, resume la
    /// ventana y lo anota bajo el segundo `now`. Devuelve el registro completo.
    pub fn poll_summary(&mut self, now: &str) -> Vec<SummaryEntry> {
        if !self.is_paused() {
            if let Some(summary) = aggregate(self.identified_items.iter()) {
                self.summary_log.record_if_new(summary, now);
            }
        }
        self.summary_log.entries()
    }

    pub fn snapshot(&self) -> FeedSnapshot {
        FeedSnapshot {
            status: self.status,
            total_frames: self.total_frames,
            history_len: self.identified_items.len(),
            current_items: count_labels(&self.current_items),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(raw: &[&str]) -> FrameLabels {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn starts_running_and_empty() {
        let st = FeedState::new();
        assert_eq!(st.status(), FeedStatus::Running);
        assert_eq!(st.total_frames(), 0);
        assert!(st.history().is_empty());
        assert!(st.summary_log().is_empty());
    }

    #[test]
    fn parses_actions() {
        assert_eq!(FeedAction::from("pause"), FeedAction::Pause);
        assert_eq!(FeedAction::from("resume"), FeedAction::Resume);
        assert_eq!(FeedAction::from("reload"), FeedAction::Reload);
        assert_eq!(FeedAction::from("Pause"), FeedAction::Unknown("Pause".into()));
    }

    #[test]
    fn transitions() {
        let mut st = FeedState::new();
        assert!(st.apply(&FeedAction::Pause));
        assert!(st.is_paused());
        assert!(st.apply(&FeedAction::Resume));
        assert!(!st.is_paused());

        st.apply(&FeedAction::Pause);
        assert!(st.apply(&FeedAction::Reload));
        assert_eq!(st.status(), FeedStatus::Running);
    }

    #[test]
    fn unknown_action_is_a_noop() {
        let mut st = FeedState::new();
        st.apply(&FeedAction::Pause);
        assert!(!st.apply(&FeedAction::Unknown("stop".into())));
        assert!(st.is_paused());
    }

    #[test]
    fn record_frame_updates_counters_and_history() {
        let mut st = FeedState::new();
        assert!(st.record_frame(labels(&["Person", "Person", "Cup"])));
        assert!(st.record_frame(labels(&["Cup"])));
        assert_eq!(st.total_frames(), 2);
        assert_eq!(st.history().newest(), Some(&labels(&["Cup"])));

        let snap = st.snapshot();
        assert_eq!(snap.history_len, 2);
        assert_eq!(snap.current_items.get("Cup"), Some(&1));
        assert!(!snap.current_items.contains_key("Person"));
    }

    #[test]
    fn history_is_bounded() {
        let mut st = FeedState::new();
        for _ in 0..100 {
            st.record_frame(labels(&["Cat"]));
        }
        assert_eq!(st.history().len(), HISTORY_CAPACITY);
        assert_eq!(st.total_frames(), 100);
    }

    #[test]
    fn paused_state_is_frozen() {
        let mut st = FeedState::new();
        st.record_frame(labels(&["Dog"]));
        st.poll_summary("12:00:00");
        st.apply(&FeedAction::Pause);

        let before = st.snapshot();
        assert!(!st.record_frame(labels(&["Cat"])));
        let log = st.poll_summary("12:00:01");
        assert_eq!(st.snapshot(), before);
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].time, "12:00:00");
    }

    #[test]
    fn poll_without_frames_appends_nothing() {
        let mut st = FeedState::new();
        assert!(st.poll_summary("08:00:00").is_empty());
    }

    #[test]
    fn poll_appends_once_per_second() {
        let mut st = FeedState::new();
        st.record_frame(labels(&["Cat", "Dog"]));
        st.poll_summary("08:00:00");
        st.record_frame(labels(&["Dog"]));
        let log = st.poll_summary("08:00:00");
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].data.get("Cat"), Some(&1));

        let log = st.poll_summary("08:00:01");
        assert_eq!(log.len(), 2);
        assert_eq!(log[0].time, "08:00:01");
        // Cat 1/2 -> 0, Dog 2/2 -> 1
        assert_eq!(log[0].data.get("Cat"), Some(&0));
        assert_eq!(log[0].data.get("Dog"), Some(&1));
    }

    #[test]
    fn reload_clears_log_only() {
        let mut st = FeedState::new();
        st.record_frame(labels(&["Cat"]));
        st.record_frame(labels(&["Cat"]));
        st.poll_summary("08:00:00");
        st.apply(&FeedAction::Pause);

        st.apply(&FeedAction::Reload);
        assert!(st.summary_log().is_empty());
        assert_eq!(st.total_frames(), 2);
        assert_eq!(st.history().len(), 2);
        assert!(!st.is_paused());
    }
}
