//! Moon-block (筊杯) throwing.

use std::time::Duration;

/// How long the blocks tumble before they land.
pub const THROW_ANIMATION: Duration = Duration::from_millis(800);

/// Pause between an approving throw and the move to the draw step.
pub const ADVANCE_DELAY: Duration = Duration::from_millis(1500);

/// The face a single block lands on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockFace {
    /// Flat side up.
    FlatUp,
    /// Flat side down, rounded side showing.
    FlatDown,
}

impl BlockFace {
    fn from_bit(bit: u8) -> Self {
        if bit & 1 == 0 {
            BlockFace::FlatUp
        } else {
            BlockFace::FlatDown
        }
    }

    pub fn glyph(self) -> &'static str {
        match self {
            BlockFace::FlatUp => "◗",
            BlockFace::FlatDown => "◖",
        }
    }
}

/// Ritual reading of a pair of blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThrowOutcome {
    /// 聖杯: one up, one down. The deity approves.
    Sheng,
    /// 笑杯: both flat sides up. Ambiguous; state the question again.
    Xiao,
    /// 陰杯: both flat sides down. Rejected.
    Yin,
}

impl ThrowOutcome {
    pub fn classify(first: BlockFace, second: BlockFace) -> Self {
        match (first, second) {
            (BlockFace::FlatUp, BlockFace::FlatUp) => ThrowOutcome::Xiao,
            (BlockFace::FlatDown, BlockFace::FlatDown) => ThrowOutcome::Yin,
            _ => ThrowOutcome::Sheng,
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            ThrowOutcome::Sheng => "【聖杯】請抽籤",
            ThrowOutcome::Xiao => "【笑杯】再敘述一次您的問題",
            ThrowOutcome::Yin => "【陰杯】神明不允，請再次誠心祈求",
        }
    }

    /// Only an approving throw moves the ritual forward on its own.
    pub fn advances(self) -> bool {
        self == ThrowOutcome::Sheng
    }
}

/// The result of one throw: both faces plus their reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockThrow {
    pub faces: [BlockFace; 2],
    pub outcome: ThrowOutcome,
}

impl BlockThrow {
    pub fn from_faces(first: BlockFace, second: BlockFace) -> Self {
        Self {
            faces: [first, second],
            outcome: ThrowOutcome::classify(first, second),
        }
    }
}

/// Throw both blocks using OS entropy.
///
/// Each face is an independent fair bit. Falls back to the low bits of the
/// clock if the entropy source is unavailable, since a biased throw is
/// preferable to a ritual that cannot proceed.
pub fn throw_blocks() -> BlockThrow {
    let mut bytes = [0u8; 2];
    if let Err(err) = getrandom::fill(&mut bytes) {
        tracing::warn!(error = %err, "entropy source unavailable, using clock bits");
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|elapsed| elapsed.subsec_nanos())
            .unwrap_or_default();
        bytes = [(nanos >> 3) as u8, (nanos >> 11) as u8];
    }
    BlockThrow::from_faces(BlockFace::from_bit(bytes[0]), BlockFace::from_bit(bytes[1]))
}
