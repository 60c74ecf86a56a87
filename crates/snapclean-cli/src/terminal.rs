//! Session observer that narrates progress on stderr.

use snapclean_models::{DetectedPerson, ProcessingStage};
use snapclean_session::{SessionObserver, SessionState};

#[derive(Debug, Default)]
pub struct TerminalObserver {
    last: Option<(ProcessingStage, u8, String)>,
}

impl TerminalObserver {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionObserver for TerminalObserver {
    fn on_status(&mut self, state: &SessionState) {
        let current = (state.stage(), state.progress(), state.message().to_string());
        if self.last.as_ref() == Some(&current) {
            return;
        }

        eprintln!("{}", render_status(state.stage(), state.progress(), state.message()));
        if state.stage() == ProcessingStage::Detect && state.progress() == 100 {
            for person in state.detections() {
                eprintln!("  {}", render_person(person));
            }
        }
        self.last = Some(current);
    }

    fn on_notice(&mut self, notice: &str) {
        eprintln!("! {}", notice);
    }
}

pub fn render_status(stage: ProcessingStage, progress: u8, message: &str) -> String {
    format!("[{:<8} {:>3}%] {}", stage.as_str(), progress, message)
}

pub fn render_person(person: &DetectedPerson) -> String {
    format!(
        "{} person {:>3}  at ({}, {}) {}x{}  confidence {:.0}%",
        if person.selected { "[x]" } else { "[ ]" },
        person.id,
        person.x,
        person.y,
        person.width,
        person.height,
        person.confidence * 100.0
    )
}
