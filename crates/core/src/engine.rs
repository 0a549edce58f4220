//! Turn Engine
//!
//! Drives one classroom simulation through a fixed cycle of phases:
//!
//! ```text
//! Init -> SelectStudent -> StudentAct -> TeacherRespond -> IncrementRound
//!              ^                                                 |
//!              +---------------- more rounds left ---------------+
//!                                                                 \-> Terminal
//! ```
//!
//! Exactly one participant is active at any time, and each phase finishes
//! mutating the [`SimulationState`] before the next one starts.

use crate::error::SimulationError;
use crate::oracle::TextOracle;
use crate::participant::{Speaker, Turn};
use crate::state::{Classroom, SimulationState};
use crate::transcript::{TranscriptEvent, TranscriptSink};
use rand::{SeedableRng, rngs::StdRng};
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// A position in the turn cycle. The acting phases read the student from
/// `SimulationState::selected_index`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    SelectStudent,
    StudentAct,
    TeacherRespond,
    IncrementRound,
    Terminal,
}

pub struct TurnEngine<S: TranscriptSink> {
    oracle: Arc<dyn TextOracle>,
    sink: S,
    rng: StdRng,
}

impl<S: TranscriptSink> TurnEngine<S> {
    /// Creates an engine whose random fallback is seeded from the OS.
    pub fn new(oracle: Arc<dyn TextOracle>, sink: S) -> Self {
        Self {
            oracle,
            sink,
            rng: StdRng::from_os_rng(),
        }
    }

    /// Makes the moderator's random fallback reproducible.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Runs a full simulation and returns the final state.
    ///
    /// Any error other than an unusable moderator answer aborts the run.
    #[instrument(name = "simulation", skip_all, fields(rounds = rounds))]
    pub async fn run(
        &mut self,
        classroom: Classroom,
        rounds: u32,
    ) -> Result<SimulationState, SimulationError> {
        let mut state = SimulationState::initialize(classroom, rounds, self.oracle.clone())?;
        info!(
            students = state.students.len(),
            teacher = %state.teacher.name(),
            "Simulation initialized"
        );

        let mut phase = Phase::SelectStudent;
        while phase != Phase::Terminal {
            phase = self.advance(&mut state, phase).await?;
        }
        info!(rounds = state.current_round, "Simulation finished");
        Ok(state)
    }

    /// Executes `phase` against `state` and returns the phase that follows.
    pub async fn advance(
        &mut self,
        state: &mut SimulationState,
        phase: Phase,
    ) -> Result<Phase, SimulationError> {
        debug!(?phase, round = state.current_round, "Entering phase");
        match phase {
            Phase::SelectStudent => {
                let student = state
                    .moderator
                    .select(
                        &state.students,
                        &state.last_message,
                        &state.lesson_plan,
                        &mut self.rng,
                    )
                    .await
                    .map_err(|source| SimulationError::Oracle {
                        speaker: "Moderator".to_string(),
                        source,
                    })?;
                state.selected_index = Some(student);
                info!(
                    round = state.current_round,
                    student = %state.students[student].name(),
                    "Student selected"
                );
                Ok(Phase::StudentAct)
            }
            Phase::StudentAct => {
                let student = selected_student(state)?;
                let turn = Turn {
                    last_message: &state.last_message,
                    lesson_plan: &state.lesson_plan,
                    addressee: None,
                };
                let speaker = &mut state.students[student];
                let text = speaker
                    .produce(&turn)
                    .await
                    .map_err(|source| SimulationError::Oracle {
                        speaker: speaker.name().to_string(),
                        source,
                    })?;
                let name = speaker.name().to_string();
                self.say(state, name, text)?;
                Ok(Phase::TeacherRespond)
            }
            Phase::TeacherRespond => {
                let student = selected_student(state)?;
                let turn = Turn {
                    last_message: &state.last_message,
                    lesson_plan: &state.lesson_plan,
                    addressee: Some(state.students[student].name()),
                };
                let text = state
                    .teacher
                    .produce(&turn)
                    .await
                    .map_err(|source| SimulationError::Oracle {
                        speaker: state.teacher.name().to_string(),
                        source,
                    })?;
                let name = state.teacher.name().to_string();
                self.say(state, name, text)?;
                Ok(Phase::IncrementRound)
            }
            Phase::IncrementRound => {
                state.current_round += 1;
                if state.is_finished() {
                    self.sink.emit(&TranscriptEvent::End)?;
                    Ok(Phase::Terminal)
                } else {
                    self.sink
                        .emit(&TranscriptEvent::RoundBoundary(state.current_round))?;
                    Ok(Phase::SelectStudent)
                }
            }
            Phase::Terminal => Ok(Phase::Terminal),
        }
    }

    /// Records an utterance as the latest message and emits it.
    fn say(
        &mut self,
        state: &mut SimulationState,
        speaker: String,
        text: String,
    ) -> Result<(), SimulationError> {
        let event = TranscriptEvent::Utterance { speaker, text };
        state.last_message = event.to_string();
        self.sink.emit(&event)?;
        Ok(())
    }
}

/// The moderator's pick for this round, checked against the roster.
fn selected_student(state: &SimulationState) -> Result<usize, SimulationError> {
    state
        .selected_index
        .filter(|&index| index < state.students.len())
        .ok_or(SimulationError::NoStudentSelected(state.selected_index))
}
