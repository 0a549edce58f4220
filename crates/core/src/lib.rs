pub mod engine;
pub mod error;
pub mod oracle;
pub mod participant;
pub mod state;
pub mod transcript;

pub use engine::{Phase, TurnEngine};
pub use error::SimulationError;
pub use oracle::{CannedOracle, OpenAICompatibleOracle, OracleError, TextOracle, TimeoutOracle};
pub use state::{Classroom, RunSummary, SimulationState};
pub use transcript::{MemoryTranscript, TranscriptEvent, TranscriptSink, WriterTranscript};
