//! Orchestration state for the capture -> generate -> regenerate flow

use crate::models::SessionSnapshot;

/// Edit instructions at or below this many characters behave as if no
/// instruction was given: the caller re-generates from the sketch alone.
pub const EDIT_INSTRUCTION_MIN_CHARS: usize = 10;

/// Which upstream call a regenerate request maps to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegenerateMode {
    /// Revision call carrying the edit instruction
    Revise,
    /// Plain generation from the sketch, ignoring the instruction
    FromSketch,
}

/// Picks the regenerate path for an edit instruction
pub fn regenerate_mode(edits: &str) -> RegenerateMode {
    if edits.chars().count() > EDIT_INSTRUCTION_MIN_CHARS {
        RegenerateMode::Revise
    } else {
        RegenerateMode::FromSketch
    }
}

/// UI-level phase of the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Captured,
    Generating,
    Ready,
    Regenerating,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::Captured => "captured",
            Phase::Generating => "generating",
            Phase::Ready => "ready",
            Phase::Regenerating => "regenerating",
        }
    }
}

/// The single orchestration state record. One sketch slot, one artifact
/// slot; every completed call replaces the artifact wholesale.
#[derive(Debug, Clone)]
pub struct SketchSession {
    sketch: Option<String>,
    artifact: Option<String>,
    vibe: String,
    phase: Phase,
}

impl Default for SketchSession {
    fn default() -> Self {
        Self {
            sketch: None,
            artifact: None,
            vibe: "React".to_string(),
            phase: Phase::Idle,
        }
    }
}

impl SketchSession {
    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn sketch(&self) -> Option<&str> {
        self.sketch.as_deref()
    }

    pub fn artifact(&self) -> Option<&str> {
        self.artifact.as_deref()
    }

    pub fn vibe(&self) -> &str {
        &self.vibe
    }

    pub fn set_vibe(&mut self, vibe: String) {
        self.vibe = vibe;
    }

    /// Stores a normalized sketch frame, replacing any previous one
    pub fn store_capture(&mut self, data_url: String) -> Result<(), String> {
        match self.phase {
            Phase::Generating | Phase::Regenerating => {
                Err("A generation call is in flight".to_string())
            }
            _ => {
                self.sketch = Some(data_url);
                self.phase = Phase::Captured;
                Ok(())
            }
        }
    }

    /// Drops the stored sketch and returns to idle
    pub fn discard_capture(&mut self) -> Result<(), String> {
        match self.phase {
            Phase::Generating | Phase::Regenerating => {
                Err("A generation call is in flight".to_string())
            }
            _ => {
                self.sketch = None;
                self.artifact = None;
                self.phase = Phase::Idle;
                Ok(())
            }
        }
    }

    /// Marks the initial generation call as in flight and hands back the
    /// sketch to send. Requires a captured sketch and no call in flight.
    pub fn begin_generation(&mut self) -> Result<String, String> {
        if matches!(self.phase, Phase::Generating | Phase::Regenerating) {
            return Err("A generation call is already in flight".to_string());
        }
        let sketch = self
            .sketch
            .clone()
            .ok_or_else(|| "No sketch captured".to_string())?;
        self.phase = Phase::Generating;
        Ok(sketch)
    }

    /// Marks a regenerate call as in flight. Requires an existing artifact.
    pub fn begin_regeneration(&mut self) -> Result<String, String> {
        if matches!(self.phase, Phase::Generating | Phase::Regenerating) {
            return Err("A generation call is already in flight".to_string());
        }
        if self.artifact.is_none() {
            return Err("Nothing to regenerate yet".to_string());
        }
        let sketch = self
            .sketch
            .clone()
            .ok_or_else(|| "No sketch captured".to_string())?;
        self.phase = Phase::Regenerating;
        Ok(sketch)
    }

    /// Stores a completed call's text, replacing the prior artifact wholesale
    pub fn complete_generation(&mut self, content: String) {
        self.artifact = Some(content);
        self.phase = Phase::Ready;
    }

    /// Resets the whole record back to idle
    pub fn reset(&mut self) {
        *self = SketchSession {
            vibe: self.vibe.clone(),
            ..SketchSession::default()
        };
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            phase: self.phase.as_str().to_string(),
            has_sketch: self.sketch.is_some(),
            sketch: self.sketch.clone(),
            artifact: self.artifact.clone(),
            vibe: self.vibe.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_edit_instruction_falls_back_to_generation() {
        assert_eq!(regenerate_mode(""), RegenerateMode::FromSketch);
        assert_eq!(regenerate_mode("tiny"), RegenerateMode::FromSketch);
        // exactly at the threshold still counts as "no instruction"
        assert_eq!(regenerate_mode("0123456789"), RegenerateMode::FromSketch);
    }

    #[test]
    fn long_edit_instruction_requests_revision() {
        // eleven characters, the smallest revision-worthy instruction
        assert_eq!(regenerate_mode("make it red"), RegenerateMode::Revise);
        assert_eq!(
            regenerate_mode("add a dark mode toggle to the header"),
            RegenerateMode::Revise
        );
    }

    #[test]
    fn capture_replaces_previous_sketch() {
        let mut session = SketchSession::default();
        session.store_capture("data:image/jpeg;base64,AAAA".into()).unwrap();
        session.store_capture("data:image/jpeg;base64,BBBB".into()).unwrap();
        assert_eq!(session.sketch(), Some("data:image/jpeg;base64,BBBB"));
        assert_eq!(session.phase(), Phase::Captured);
    }

    #[test]
    fn generation_requires_a_sketch() {
        let mut session = SketchSession::default();
        assert!(session.begin_generation().is_err());
        assert_eq!(session.phase(), Phase::Idle);
    }

    #[test]
    fn completed_call_replaces_artifact_wholesale() {
        let mut session = SketchSession::default();
        session.store_capture("data:image/jpeg;base64,AAAA".into()).unwrap();
        session.begin_generation().unwrap();
        session.complete_generation("function App() { return null }".into());
        assert_eq!(session.phase(), Phase::Ready);

        session.begin_regeneration().unwrap();
        assert_eq!(session.phase(), Phase::Regenerating);
        session.complete_generation("function App() { return 1 }".into());
        assert_eq!(session.artifact(), Some("function App() { return 1 }"));
        assert_eq!(session.phase(), Phase::Ready);
    }

    #[test]
    fn regeneration_requires_an_artifact() {
        let mut session = SketchSession::default();
        session.store_capture("data:image/jpeg;base64,AAAA".into()).unwrap();
        assert!(session.begin_regeneration().is_err());
        assert_eq!(session.phase(), Phase::Captured);
    }

    #[test]
    fn in_flight_call_blocks_new_work() {
        let mut session = SketchSession::default();
        session.store_capture("data:image/jpeg;base64,AAAA".into()).unwrap();
        session.begin_generation().unwrap();
        assert!(session.begin_generation().is_err());
        assert!(session.store_capture("data:image/jpeg;base64,BBBB".into()).is_err());
        // a failed call leaves the phase where it was; only reset moves on
        assert_eq!(session.phase(), Phase::Generating);
        session.reset();
        assert_eq!(session.phase(), Phase::Idle);
        assert!(session.sketch().is_none());
        assert!(session.artifact().is_none());
    }
}
