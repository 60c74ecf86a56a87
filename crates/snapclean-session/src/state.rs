//! Editing session state machine.
//!
//! A [`SessionState`] is the single source of truth for one editing session.
//! Network work is split in two halves: a `begin` step that validates, moves
//! the stage forward and hands out a ticket, and a `complete_*` step that
//! consumes the ticket together with the response. Every ticket resolves
//! exactly one transition; tickets from before a reset are rejected.

use snapclean_models::{
    DetectedPerson, ImagePayload, ProcessingStage, StageStatus, MAX_UPLOAD_BYTES,
};
use tracing::{debug, warn};

use crate::backend::{DetectionOutcome, RemovalOutcome};
use crate::error::{RequestKind, SessionError, SessionResult};

const DETECTING_MESSAGE: &str = "Detecting people in the image...";
const DETECTION_FAILED_MESSAGE: &str = "Detection failed. Please try again.";
const REMOVING_MESSAGE: &str = "Removing selected people...";
const REMOVAL_FAILED_MESSAGE: &str = "Processing failed. Please try again.";
const UPLOAD_MESSAGE: &str = "Upload a photo to get started";

/// Permission to send one detection request.
#[derive(Debug)]
#[must_use = "a ticket must be completed for the session to leave its pending state"]
pub struct DetectionTicket {
    generation: u64,
    image: ImagePayload,
}

impl DetectionTicket {
    pub fn image(&self) -> &ImagePayload {
        &self.image
    }
}

/// Permission to send one removal request, with the selection snapshot.
#[derive(Debug)]
#[must_use = "a ticket must be completed for the session to leave its pending state"]
pub struct RemovalTicket {
    generation: u64,
    image: ImagePayload,
    people: Vec<DetectedPerson>,
}

impl RemovalTicket {
    pub fn image(&self) -> &ImagePayload {
        &self.image
    }

    /// Selected people, in detection order.
    pub fn people(&self) -> &[DetectedPerson] {
        &self.people
    }
}

/// State of one editing session (one uploaded image).
#[derive(Debug, Clone)]
pub struct SessionState {
    original_image: Option<ImagePayload>,
    file_name: String,
    detections: Vec<DetectedPerson>,
    status: StageStatus,
    result_image: Option<ImagePayload>,
    pending: Option<RequestKind>,
    generation: u64,
    max_upload_bytes: usize,
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionState {
    pub fn new() -> Self {
        Self::with_upload_limit(MAX_UPLOAD_BYTES)
    }

    pub fn with_upload_limit(max_upload_bytes: usize) -> Self {
        Self {
            original_image: None,
            file_name: String::new(),
            detections: Vec::new(),
            status: StageStatus::new(ProcessingStage::Upload, 0, UPLOAD_MESSAGE),
            result_image: None,
            pending: None,
            generation: 0,
            max_upload_bytes,
        }
    }

    pub fn original_image(&self) -> Option<&ImagePayload> {
        self.original_image.as_ref()
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn detections(&self) -> &[DetectedPerson] {
        &self.detections
    }

    pub(crate) fn detections_mut(&mut self) -> &mut [DetectedPerson] {
        &mut self.detections
    }

    pub fn status(&self) -> &StageStatus {
        &self.status
    }

    pub fn stage(&self) -> ProcessingStage {
        self.status.stage
    }

    pub fn progress(&self) -> u8 {
        self.status.progress
    }

    pub fn message(&self) -> &str {
        &self.status.message
    }

    /// Present if and only if the stage is `complete`.
    pub fn result_image(&self) -> Option<&ImagePayload> {
        self.result_image.as_ref()
    }

    /// Outstanding request, if any.
    pub fn pending(&self) -> Option<RequestKind> {
        self.pending
    }

    pub fn is_processing(&self) -> bool {
        self.pending.is_some()
    }

    pub fn selected_people(&self) -> Vec<DetectedPerson> {
        self.detections.iter().filter(|p| p.selected).cloned().collect()
    }

    pub fn selected_count(&self) -> usize {
        self.detections.iter().filter(|p| p.selected).count()
    }

    /// File name offered when saving the cleaned image.
    pub fn download_name(&self) -> Option<String> {
        self.result_image
            .as_ref()
            .map(|_| format!("cleaned_{}", self.file_name))
    }

    /// Whether removal can be triggered right now.
    pub fn can_remove(&self) -> bool {
        matches!(
            self.status.stage,
            ProcessingStage::Detect | ProcessingStage::Process
        ) && self.pending.is_none()
            && self.selected_count() > 0
    }

    /// Start a new session with `image`, discarding everything from the
    /// previous one, and request detection.
    pub fn upload(
        &mut self,
        image: ImagePayload,
        file_name: impl Into<String>,
    ) -> SessionResult<DetectionTicket> {
        image.validate_upload(self.max_upload_bytes)?;

        self.reset();
        self.original_image = Some(image.clone());
        self.file_name = file_name.into();
        debug!(file_name = %self.file_name, "Image uploaded");

        Ok(self.start_detection(image))
    }

    /// Run detection again on the current image.
    pub fn retry_detection(&mut self) -> SessionResult<DetectionTicket> {
        if self.status.stage != ProcessingStage::Detect {
            return Err(self.invalid("retry detection"));
        }
        if let Some(kind) = self.pending {
            return Err(SessionError::RequestInFlight(kind));
        }
        let image = self
            .original_image
            .clone()
            .ok_or_else(|| self.invalid("retry detection"))?;

        self.detections.clear();
        Ok(self.start_detection(image))
    }

    fn start_detection(&mut self, image: ImagePayload) -> DetectionTicket {
        self.status = StageStatus::new(ProcessingStage::Detect, 30, DETECTING_MESSAGE);
        self.pending = Some(RequestKind::Detection);
        self.check_invariants();

        DetectionTicket {
            generation: self.generation,
            image,
        }
    }

    /// Apply the response to a detection request.
    ///
    /// `Err` carries the failure detail for diagnostics; the user sees a
    /// generic message.
    pub fn complete_detection(
        &mut self,
        ticket: DetectionTicket,
        result: Result<DetectionOutcome, String>,
    ) -> SessionResult<()> {
        self.accept(ticket.generation, RequestKind::Detection)?;

        match result {
            Ok(outcome) => {
                self.detections = outcome.people;
                self.status = StageStatus::new(ProcessingStage::Detect, 100, outcome.message);
            }
            Err(detail) => {
                warn!("Detection failed: {}", detail);
                self.status =
                    StageStatus::new(ProcessingStage::Detect, 100, DETECTION_FAILED_MESSAGE);
            }
        }

        self.check_invariants();
        Ok(())
    }

    /// Request removal of the currently selected people.
    ///
    /// Fails without any state change when nobody is selected.
    pub fn begin_removal(&mut self) -> SessionResult<RemovalTicket> {
        if !matches!(
            self.status.stage,
            ProcessingStage::Detect | ProcessingStage::Process
        ) {
            return Err(self.invalid("remove people"));
        }
        if let Some(kind) = self.pending {
            return Err(SessionError::RequestInFlight(kind));
        }

        let people = self.selected_people();
        if people.is_empty() {
            return Err(SessionError::NothingSelected);
        }

        let image = self
            .original_image
            .clone()
            .ok_or_else(|| self.invalid("remove people"))?;

        self.status = StageStatus::new(ProcessingStage::Process, 0, REMOVING_MESSAGE);
        self.pending = Some(RequestKind::Removal);
        self.check_invariants();

        Ok(RemovalTicket {
            generation: self.generation,
            image,
            people,
        })
    }

    /// Apply the response to a removal request.
    pub fn complete_removal(
        &mut self,
        ticket: RemovalTicket,
        result: Result<RemovalOutcome, String>,
    ) -> SessionResult<()> {
        self.accept(ticket.generation, RequestKind::Removal)?;

        match result {
            Ok(outcome) => {
                self.result_image = Some(outcome.image);
                self.status = StageStatus::new(ProcessingStage::Complete, 100, outcome.message);
            }
            Err(detail) => {
                warn!("Removal failed: {}", detail);
                self.status =
                    StageStatus::new(ProcessingStage::Process, 100, REMOVAL_FAILED_MESSAGE);
            }
        }

        self.check_invariants();
        Ok(())
    }

    /// Discard the result and go back to choosing people.
    pub fn redo_selection(&mut self) -> SessionResult<()> {
        if self.status.stage != ProcessingStage::Complete {
            return Err(self.invalid("try a different selection"));
        }

        self.result_image = None;
        self.status = StageStatus::new(
            ProcessingStage::Detect,
            100,
            format!(
                "Found {} people. Select which ones to remove.",
                self.detections.len()
            ),
        );
        self.check_invariants();
        Ok(())
    }

    /// Discard all session data. Responses to requests issued before the
    /// reset are rejected as stale.
    pub fn reset(&mut self) {
        let generation = self.generation.wrapping_add(1);
        *self = Self {
            generation,
            ..Self::with_upload_limit(self.max_upload_bytes)
        };
    }

    fn accept(&mut self, generation: u64, kind: RequestKind) -> SessionResult<()> {
        if generation != self.generation {
            debug!(request = %kind, "Ignoring response from a previous session");
            return Err(SessionError::StaleResponse);
        }
        if self.pending != Some(kind) {
            return Err(SessionError::NoPendingRequest(kind));
        }
        self.pending = None;
        Ok(())
    }

    fn invalid(&self, action: &'static str) -> SessionError {
        SessionError::InvalidTransition {
            action,
            stage: self.status.stage,
        }
    }

    fn check_invariants(&self) {
        debug_assert_eq!(
            self.result_image.is_some(),
            self.status.stage == ProcessingStage::Complete,
            "result image must exist exactly in the complete stage"
        );
    }
}
