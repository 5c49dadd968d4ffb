/// The four panels of the ritual. Exactly one is visible at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RitualStep {
    #[default]
    Question,
    Blocks,
    Draw,
    Result,
}

impl RitualStep {
    pub const ALL: [RitualStep; 4] = [
        RitualStep::Question,
        RitualStep::Blocks,
        RitualStep::Draw,
        RitualStep::Result,
    ];

    pub fn title(self) -> &'static str {
        match self {
            RitualStep::Question => "誠心默念 · Ask",
            RitualStep::Blocks => "擲筊 · Throw the blocks",
            RitualStep::Draw => "求籤 · Draw a lot",
            RitualStep::Result => "籤詩 · Your lot",
        }
    }
}

/// Tracks which step panel is showing.
#[derive(Debug, Clone, Default)]
pub struct StepNavigator {
    current: RitualStep,
    round: u64,
}

impl StepNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> RitualStep {
        self.current
    }

    pub fn is_visible(&self, step: RitualStep) -> bool {
        self.current == step
    }

    /// Ritual round counter. Bumped every time the ritual returns to the
    /// question step, so delayed transitions from an earlier round can be
    /// recognised and dropped.
    pub fn round(&self) -> u64 {
        self.round
    }

    pub fn show(&mut self, step: RitualStep) {
        if self.current == step {
            return;
        }
        if step == RitualStep::Question {
            self.round += 1;
        }
        self.current = step;
    }
}
