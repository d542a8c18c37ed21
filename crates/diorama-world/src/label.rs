//! The single on-screen phase indicator.

use crate::cycle::DayPhase;

/// Text of the phase indicator, overwritten on every update.
#[derive(Debug, Clone, Default)]
pub struct PhaseLabel {
    text: String,
    phase: Option<DayPhase>,
}

impl PhaseLabel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the text with `Phase: <name>`. Returns `true` when the phase
    /// differs from the previous call.
    pub fn set(&mut self, phase: DayPhase) -> bool {
        self.text.clear();
        self.text.push_str("Phase: ");
        self.text.push_str(phase.name());
        let changed = self.phase != Some(phase);
        self.phase = Some(phase);
        changed
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn phase(&self) -> Option<DayPhase> {
        self.phase
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_until_first_set() {
        let label = PhaseLabel::new();
        assert_eq!(label.text(), "");
        assert_eq!(label.phase(), None);
    }

    #[test]
    fn test_overwrites_not_appends() {
        let mut label = PhaseLabel::new();
        assert!(label.set(DayPhase::Dawn));
        assert!(!label.set(DayPhase::Dawn));
        assert_eq!(label.text(), "Phase: Dawn");
        assert!(label.set(DayPhase::Afternoon));
        assert_eq!(label.text(), "Phase: Afternoon");
    }
}
