use exam_core::model::SectionKind;

/// Percentage shown once a session completes.
pub const COMPLETION_PERCENT: u8 = 100;

/// Monotone progress percentage for one exam attempt.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct ProgressMeter {
    percent: u8,
}

impl ProgressMeter {
    pub(crate) fn percent(self) -> u8 {
        self.percent
    }

    /// Move to the milestone of `section`; never moves backwards.
    pub(crate) fn enter_section(&mut self, section: SectionKind) {
        self.raise(section.milestone_percent());
    }

    pub(crate) fn complete(&mut self) {
        self.raise(COMPLETION_PERCENT);
    }

    fn raise(&mut self, value: u8) {
        self.percent = self.percent.max(value);
    }
}

/// Aggregated view of session progress, useful for UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionProgress {
    pub percent: u8,
    pub section_index: Option<usize>,
    pub section_count: usize,
    pub question_index: usize,
    pub question_count: usize,
    pub answered: usize,
    pub is_complete: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn follows_fixed_milestones() {
        let mut meter = ProgressMeter::default();
        assert_eq!(meter.percent(), 0);
        meter.enter_section(SectionKind::Reading);
        assert_eq!(meter.percent(), 50);
        meter.enter_section(SectionKind::Writing);
        assert_eq!(meter.percent(), 75);
        meter.complete();
        assert_eq!(meter.percent(), 100);
    }

    #[test]
    fn never_moves_backwards() {
        let mut meter = ProgressMeter::default();
        meter.enter_section(SectionKind::Speaking);
        meter.enter_section(SectionKind::Listening);
        assert_eq!(meter.percent(), 90);
    }
}
