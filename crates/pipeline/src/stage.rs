//! The pipeline's linear state machine.
//!
//! Each [`Stage`] is tagged with the [`Fatality`] of a failure in that
//! stage. The orchestrator settles every failed stage through this tag;
//! the image stages are additionally pinned to `Fatal` at compile time
//! because a result cannot exist without the image.

/// One step of a pipeline run, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Enhance,
    SynthesizeImage,
    PersistImage,
    SynthesizeModel,
    PersistModel,
}

/// What a failure in a stage does to the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fatality {
    /// Recovered inside the stage with a fallback value.
    Absorbed,
    /// The run continues; the stage's output is omitted from the result.
    Degrading,
    /// The run aborts with an error.
    Fatal,
}

impl Stage {
    pub const fn fatality(self) -> Fatality {
        match self {
            Self::Enhance => Fatality::Absorbed,
            Self::SynthesizeImage | Self::PersistImage => Fatality::Fatal,
            Self::SynthesizeModel | Self::PersistModel => Fatality::Degrading,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Enhance => "enhance",
            Self::SynthesizeImage => "synthesize_image",
            Self::PersistImage => "persist_image",
            Self::SynthesizeModel => "synthesize_model",
            Self::PersistModel => "persist_model",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
