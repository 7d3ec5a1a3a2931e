/// Recording session state machine.
///
/// State transitions:
/// ```text
/// idle → capturing → finalizing → idle
/// ```
///
/// `Idle` is both the initial and the terminal state. `Capturing` tracks the
/// elapsed whole seconds of the countdown. `Finalizing` covers encoder flush
/// and the analysis submission; both success and failure return to `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordingState {
    Idle,
    Capturing { elapsed_secs: u32 },
    Finalizing,
}

impl RecordingState {
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    pub fn is_capturing(&self) -> bool {
        matches!(self, Self::Capturing { .. })
    }

    pub fn is_finalizing(&self) -> bool {
        matches!(self, Self::Finalizing)
    }

    /// Elapsed countdown seconds, if in a state that tracks them.
    pub fn elapsed_secs(&self) -> Option<u32> {
        match self {
            Self::Capturing { elapsed_secs } => Some(*elapsed_secs),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_predicates() {
        assert!(RecordingState::Idle.is_idle());
        assert!(RecordingState::Capturing { elapsed_secs: 3 }.is_capturing());
        assert!(RecordingState::Finalizing.is_finalizing());
        assert!(!RecordingState::Finalizing.is_capturing());
    }

    #[test]
    fn elapsed_only_while_capturing() {
        assert_eq!(
            RecordingState::Capturing { elapsed_secs: 7 }.elapsed_secs(),
            Some(7)
        );
        assert_eq!(RecordingState::Idle.elapsed_secs(), None);
        assert_eq!(RecordingState::Finalizing.elapsed_secs(), None);
    }
}
