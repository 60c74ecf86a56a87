//! Selection of detected people for removal.
//!
//! These are pure state updates; nothing here touches the network.

use crate::error::{SessionError, SessionResult};
use crate::state::SessionState;

/// Flip the `selected` flag of the person with `person_id`.
///
/// Returns the new value. Other detections are untouched.
pub fn toggle(state: &mut SessionState, person_id: &str) -> SessionResult<bool> {
    let person = state
        .detections_mut()
        .iter_mut()
        .find(|p| p.id == person_id)
        .ok_or_else(|| SessionError::UnknownPerson(person_id.to_string()))?;

    person.selected = !person.selected;
    Ok(person.selected)
}

/// Set `selected` explicitly for one person.
pub fn set_selected(state: &mut SessionState, person_id: &str, selected: bool) -> SessionResult<()> {
    let person = state
        .detections_mut()
        .iter_mut()
        .find(|p| p.id == person_id)
        .ok_or_else(|| SessionError::UnknownPerson(person_id.to_string()))?;

    person.selected = selected;
    Ok(())
}

pub fn select_all(state: &mut SessionState) {
    for p in state.detections_mut() {
        p.selected = true;
    }
}

pub fn deselect_all(state: &mut SessionState) {
    for p in state.detections_mut() {
        p.selected = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use snapclean_models::{DetectedPerson, ImagePayload, ProviderMode};

    use crate::backend::DetectionOutcome;

    fn session() -> SessionState {
        let mut state = SessionState::new();
        let ticket = state
            .upload(ImagePayload::from_bytes(b"img", "image/png"), "p.png")
            .unwrap();
        let outcome = DetectionOutcome {
            people: vec![
                DetectedPerson::new("1", 0, 0, 10, 10, 0.9),
                DetectedPerson::new("2", 20, 0, 10, 10, 0.8),
                DetectedPerson::new("3", 40, 0, 10, 10, 0.7),
            ],
            message: "Detected 3 people in the image".to_string(),
            mode: ProviderMode::Demo,
        };
        state.complete_detection(ticket, Ok(outcome)).unwrap();
        state
    }

    fn flags(state: &SessionState) -> Vec<bool> {
        state.detections().iter().map(|p| p.selected).collect()
    }

    #[test]
    fn test_toggle_flips_only_target() {
        let mut state = session();
        assert_eq!(toggle(&mut state, "2").unwrap(), false);
        assert_eq!(flags(&state), [true, false, true]);
    }

    #[test]
    fn test_double_toggle_restores() {
        let mut state = session();
        for id in ["1", "2", "3"] {
            let before = flags(&state);
            toggle(&mut state, id).unwrap();
            toggle(&mut state, id).unwrap();
            assert_eq!(flags(&state), before);
        }
    }

    #[test]
    fn test_unknown_id_is_reported() {
        let mut state = session();
        let err = toggle(&mut state, "42").unwrap_err();
        assert!(matches!(err, SessionError::UnknownPerson(ref id) if id == "42"));
        assert_eq!(flags(&state), [true, true, true]);
    }

    #[test]
    fn test_toggle_before_detection() {
        let mut state = SessionState::new();
        assert!(toggle(&mut state, "1").is_err());
    }

    #[test]
    fn test_bulk_selection() {
        let mut state = session();
        deselect_all(&mut state);
        assert_eq!(state.selected_count(), 0);
        set_selected(&mut state, "3", true).unwrap();
        assert_eq!(flags(&state), [false, false, true]);
        select_all(&mut state);
        assert_eq!(state.selected_count(), 3);
    }
}
