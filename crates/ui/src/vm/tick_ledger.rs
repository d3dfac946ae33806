use services::ExamPhase;

/// Counts one-second ticks for a session that may be checked out on an
/// async call. Ticks are owed only while the session left the slot `Active`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TickLedger {
    owed: u32,
    was_active: bool,
}

impl TickLedger {
    /// Records one tick against what the slot holds (`None` while checked out)
    /// and returns how many ticks are due now. Zero means skip this tick.
    pub fn record(&mut self, phase: Option<ExamPhase>) -> u32 {
        match phase {
            Some(ExamPhase::Active) => {
                self.was_active = true;
                self.owed = self.owed.saturating_add(1);
                self.owed
            }
            Some(_) => {
                *self = Self::default();
                0
            }
            None => {
                if self.was_active {
                    self.owed = self.owed.saturating_add(1);
                }
                0
            }
        }
    }

    /// Call once the due ticks reached the session.
    pub fn settle(&mut self) {
        self.owed = 0;
    }

    #[must_use]
    pub fn owed(&self) -> u32 {
        self.owed
    }
}
