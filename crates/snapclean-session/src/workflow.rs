//! Single-threaded driver for an editing session.
//!
//! [`Workflow`] owns a [`SessionState`], issues requests through an
//! [`EditingBackend`] and reports every change to a [`SessionObserver`].

use snapclean_models::ImagePayload;
use tracing::info;

use crate::backend::{BackendError, DetectionOutcome, EditingBackend};
use crate::error::{SessionError, SessionResult};
use crate::selection;
use crate::state::{DetectionTicket, SessionState};

/// Presentation hooks.
pub trait SessionObserver {
    /// Called after every state change.
    fn on_status(&mut self, _state: &SessionState) {}

    /// Called with a user-facing notice, e.g. a rejected action.
    fn on_notice(&mut self, _notice: &str) {}
}

/// Observer that ignores everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl SessionObserver for NoopObserver {}

pub struct Workflow<B, O = NoopObserver> {
    backend: B,
    observer: O,
    state: SessionState,
}

impl<B: EditingBackend> Workflow<B, NoopObserver> {
    pub fn new(backend: B) -> Self {
        Self::with_observer(backend, NoopObserver)
    }
}

impl<B: EditingBackend, O: SessionObserver> Workflow<B, O> {
    pub fn with_observer(backend: B, observer: O) -> Self {
        Self::with_state(backend, observer, SessionState::new())
    }

    pub fn with_state(backend: B, observer: O, state: SessionState) -> Self {
        Self {
            backend,
            observer,
            state,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn observer(&self) -> &O {
        &self.observer
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Start a session with `image` and run detection.
    ///
    /// A backend failure is recorded in the session status and also returned.
    pub async fn upload(
        &mut self,
        image: ImagePayload,
        file_name: impl Into<String>,
    ) -> SessionResult<()> {
        let ticket = match self.state.upload(image, file_name) {
            Ok(ticket) => ticket,
            Err(e) => return Err(self.reject(e)),
        };
        self.notify();

        info!(file_name = %self.state.file_name(), "Detecting people");
        let result = self.backend.detect(ticket.image()).await;
        self.finish_detection(ticket, result)
    }

    /// Re-run detection on the current image.
    pub async fn retry_detection(&mut self) -> SessionResult<()> {
        let ticket = match self.state.retry_detection() {
            Ok(ticket) => ticket,
            Err(e) => return Err(self.reject(e)),
        };
        self.notify();

        let result = self.backend.detect(ticket.image()).await;
        self.finish_detection(ticket, result)
    }

    fn finish_detection(
        &mut self,
        ticket: DetectionTicket,
        result: Result<DetectionOutcome, BackendError>,
    ) -> SessionResult<()> {
        match result {
            Ok(outcome) => {
                self.state.complete_detection(ticket, Ok(outcome))?;
                self.notify();
                Ok(())
            }
            Err(e) => {
                self.state.complete_detection(ticket, Err(e.to_string()))?;
                self.notify();
                Err(SessionError::Backend(e))
            }
        }
    }

    /// Flip the selection of one detected person.
    pub fn toggle(&mut self, person_id: &str) -> SessionResult<bool> {
        match selection::toggle(&mut self.state, person_id) {
            Ok(selected) => {
                self.notify();
                Ok(selected)
            }
            Err(e) => Err(self.reject(e)),
        }
    }

    pub fn set_selected(&mut self, person_id: &str, selected: bool) -> SessionResult<()> {
        match selection::set_selected(&mut self.state, person_id, selected) {
            Ok(()) => {
                self.notify();
                Ok(())
            }
            Err(e) => Err(self.reject(e)),
        }
    }

    pub fn select_all(&mut self) {
        selection::select_all(&mut self.state);
        self.notify();
    }

    pub fn deselect_all(&mut self) {
        selection::deselect_all(&mut self.state);
        self.notify();
    }

    /// Remove the selected people.
    ///
    /// With nobody selected this reports a notice and sends nothing.
    pub async fn remove_selected(&mut self) -> SessionResult<()> {
        let ticket = match self.state.begin_removal() {
            Ok(ticket) => ticket,
            Err(e) => return Err(self.reject(e)),
        };
        self.notify();

        info!(count = ticket.people().len(), "Removing selected people");
        let result = self.backend.remove(ticket.image(), ticket.people()).await;
        match result {
            Ok(outcome) => {
                self.state.complete_removal(ticket, Ok(outcome))?;
                self.notify();
                Ok(())
            }
            Err(e) => {
                self.state.complete_removal(ticket, Err(e.to_string()))?;
                self.notify();
                Err(SessionError::Backend(e))
            }
        }
    }

    /// Drop the result and return to selecting people.
    pub fn redo_selection(&mut self) -> SessionResult<()> {
        match self.state.redo_selection() {
            Ok(()) => {
                self.notify();
                Ok(())
            }
            Err(e) => Err(self.reject(e)),
        }
    }

    /// Discard the session.
    pub fn reset(&mut self) {
        self.state.reset();
        self.notify();
    }

    fn notify(&mut self) {
        self.observer.on_status(&self.state);
    }

    fn reject(&mut self, error: SessionError) -> SessionError {
        self.observer.on_notice(&error.to_string());
        error
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::predicate::always;
    use snapclean_models::{DetectedPerson, ProcessingStage, ProviderMode};

    use crate::backend::{MockEditingBackend, RemovalOutcome};

    /// Observer that records everything it is told.
    #[derive(Default)]
    struct Recorder {
        stages: Vec<(ProcessingStage, u8)>,
        notices: Vec<String>,
    }

    impl SessionObserver for Recorder {
        fn on_status(&mut self, state: &SessionState) {
            self.stages.push((state.stage(), state.progress()));
        }

        fn on_notice(&mut self, notice: &str) {
            self.notices.push(notice.to_string());
        }
    }

    fn image_a() -> ImagePayload {
        ImagePayload::from_bytes(b"image A", "image/jpeg")
    }

    fn three_people() -> DetectionOutcome {
        DetectionOutcome {
            people: vec![
                DetectedPerson::new("1", 120, 180, 95, 140, 0.94),
                DetectedPerson::new("2", 280, 160, 85, 125, 0.87),
                DetectedPerson::new("3", 450, 200, 75, 115, 0.92),
            ],
            message: "Detected 3 people in the image".to_string(),
            mode: ProviderMode::Demo,
        }
    }

    fn backend_with_detection() -> MockEditingBackend {
        let mut backend = MockEditingBackend::new();
        backend
            .expect_detect()
            .times(1)
            .returning(|_| Ok(three_people()));
        backend
    }

    #[tokio::test]
    async fn test_upload_runs_detection() {
        let mut workflow = Workflow::with_observer(backend_with_detection(), Recorder::default());
        workflow.upload(image_a(), "a.jpg").await.unwrap();

        let state = workflow.state();
        assert_eq!(state.stage(), ProcessingStage::Detect);
        assert_eq!(state.progress(), 100);
        assert_eq!(state.detections().len(), 3);
        assert!(state.detections().iter().all(|p| p.selected));
        assert_eq!(
            workflow.observer().stages,
            [(ProcessingStage::Detect, 30), (ProcessingStage::Detect, 100)]
        );
    }

    #[tokio::test]
    async fn test_toggle_then_remove_sends_only_selected() {
        let mut backend = backend_with_detection();
        backend
            .expect_remove()
            .withf(|image, people| {
                image == &image_a()
                    && people.iter().map(|p| p.id.as_str()).collect::<Vec<_>>() == ["1", "3"]
            })
            .times(1)
            .returning(|_, people| {
                Ok(RemovalOutcome {
                    image: ImagePayload::new("https://cdn.example.com/clean.jpg"),
                    message: format!("Successfully removed {} people from the image", people.len()),
                    mode: ProviderMode::Live,
                })
            });

        let mut workflow = Workflow::new(backend);
        workflow.upload(image_a(), "a.jpg").await.unwrap();

        assert!(!workflow.toggle("2").unwrap());
        let flags: Vec<_> = workflow.state().detections().iter().map(|p| p.selected).collect();
        assert_eq!(flags, [true, false, true]);

        workflow.remove_selected().await.unwrap();
        let state = workflow.state();
        assert_eq!(state.stage(), ProcessingStage::Complete);
        assert!(state.result_image().is_some());
        assert_eq!(state.message(), "Successfully removed 2 people from the image");
    }

    #[tokio::test]
    async fn test_remove_with_nobody_selected_sends_nothing() {
        let mut backend = backend_with_detection();
        backend.expect_remove().times(0);

        let mut workflow = Workflow::with_observer(backend, Recorder::default());
        workflow.upload(image_a(), "a.jpg").await.unwrap();
        for id in ["1", "2", "3"] {
            workflow.toggle(id).unwrap();
        }

        let err = workflow.remove_selected().await.unwrap_err();
        assert!(matches!(err, SessionError::NothingSelected));
        assert!(err.is_guard());
        assert_eq!(workflow.state().stage(), ProcessingStage::Detect);
        assert_eq!(
            workflow.observer().notices,
            ["Please select at least one person to remove"]
        );
    }

    #[tokio::test]
    async fn test_redo_selection_after_complete() {
        let mut backend = backend_with_detection();
        backend.expect_remove().with(always(), always()).times(1).returning(|image, _| {
            Ok(RemovalOutcome {
                image: image.clone(),
                message: "Demo mode: returned the original image unchanged (3 people selected)"
                    .to_string(),
                mode: ProviderMode::Demo,
            })
        });

        let mut workflow = Workflow::new(backend);
        workflow.upload(image_a(), "a.jpg").await.unwrap();
        workflow.remove_selected().await.unwrap();
        assert_eq!(workflow.state().result_image(), Some(&image_a()));

        workflow.redo_selection().unwrap();
        let state = workflow.state();
        assert!(state.result_image().is_none());
        assert_eq!(state.stage(), ProcessingStage::Detect);
        assert_eq!(state.progress(), 100);
        let ids: Vec<_> = state.detections().iter().map(|p| p.id.clone()).collect();
        assert_eq!(ids, ["1", "2", "3"]);
    }

    #[tokio::test]
    async fn test_backend_failure_updates_status_and_is_returned() {
        let mut backend = backend_with_detection();
        backend.expect_remove().times(1).returning(|_, _| {
            Err(BackendError::Rejected {
                status: 500,
                message: "Failed to process image".to_string(),
            })
        });

        let mut workflow = Workflow::new(backend);
        workflow.upload(image_a(), "a.jpg").await.unwrap();

        let err = workflow.remove_selected().await.unwrap_err();
        assert!(matches!(err, SessionError::Backend(_)));
        let state = workflow.state();
        assert_eq!(state.stage(), ProcessingStage::Process);
        assert_eq!(state.progress(), 100);
        assert_eq!(state.message(), "Processing failed. Please try again.");
        assert!(!state.is_processing());
    }

    #[tokio::test]
    async fn test_detection_failure_then_retry() {
        let mut backend = MockEditingBackend::new();
        let mut calls = 0;
        backend.expect_detect().times(2).returning(move |_| {
            calls += 1;
            if calls == 1 {
                Err(BackendError::InvalidResponse("truncated body".to_string()))
            } else {
                Ok(three_people())
            }
        });

        let mut workflow = Workflow::new(backend);
        assert!(workflow.upload(image_a(), "a.jpg").await.is_err());
        assert_eq!(workflow.state().message(), "Detection failed. Please try again.");

        workflow.retry_detection().await.unwrap();
        assert_eq!(workflow.state().detections().len(), 3);
    }

    #[tokio::test]
    async fn test_invalid_upload_is_a_notice() {
        let mut backend = MockEditingBackend::new();
        backend.expect_detect().times(0);

        let mut workflow = Workflow::with_observer(backend, Recorder::default());
        let err = workflow
            .upload(ImagePayload::from_bytes(b"text", "text/plain"), "notes.txt")
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::InvalidImage(_)));
        assert_eq!(workflow.observer().notices.len(), 1);
        assert_eq!(workflow.state().stage(), ProcessingStage::Upload);
    }

    #[tokio::test]
    async fn test_reset_returns_to_upload() {
        let mut workflow = Workflow::new(backend_with_detection());
        workflow.upload(image_a(), "a.jpg").await.unwrap();
        workflow.reset();
        assert_eq!(workflow.state().stage(), ProcessingStage::Upload);
        assert!(workflow.state().detections().is_empty());
    }
}
