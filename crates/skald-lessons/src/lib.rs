mod knowledge;
mod lesson;
mod synth;

pub use knowledge::{knowledge_for, PatternKnowledge};
pub use lesson::{
    InterventionStat, Lesson, LessonsDatabase, LessonsStats, Severity, SynthesisRun,
    LESSONS_CAP, LESSONS_VERSION, SYNTHESIS_LOG_CAP,
};
pub use synth::{synthesize, SYNTHESIS_THRESHOLD};
