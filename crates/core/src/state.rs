//! Simulation State
//!
//! `SimulationState` is the one record every step of the turn engine reads and
//! writes. It is built exactly once from a [`Classroom`] and a round budget.

use crate::error::SimulationError;
use crate::oracle::TextOracle;
use crate::participant::{
    Moderator, ModeratorProfile, Student, StudentProfile, Teacher, TeacherProfile,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Seed data for one classroom: the people in it and what the lesson is about.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Classroom {
    pub lesson_plan: String,
    /// The teacher's first line, which opens the dialogue.
    pub opening_message: String,
    pub teacher: TeacherProfile,
    pub moderator: ModeratorProfile,
    pub students: Vec<StudentProfile>,
}

pub struct SimulationState {
    pub rounds: u32,
    pub current_round: u32,
    pub lesson_plan: String,
    pub last_message: String,
    /// The student picked by the moderator for the current round.
    pub selected_index: Option<usize>,
    pub students: Vec<Student>,
    pub teacher: Teacher,
    pub moderator: Moderator,
}

impl SimulationState {
    /// Validates the seed data and builds every participant around `oracle`.
    pub fn initialize(
        classroom: Classroom,
        rounds: u32,
        oracle: Arc<dyn TextOracle>,
    ) -> Result<Self, SimulationError> {
        if classroom.students.is_empty() {
            return Err(SimulationError::EmptyRoster);
        }
        if rounds == 0 {
            return Err(SimulationError::InvalidRounds);
        }
        if classroom.opening_message.trim().is_empty() {
            return Err(SimulationError::EmptyOpeningMessage);
        }

        let students = classroom
            .students
            .into_iter()
            .map(|profile| Student::new(profile, oracle.clone()))
            .collect();

        Ok(Self {
            rounds,
            current_round: 0,
            lesson_plan: classroom.lesson_plan,
            last_message: classroom.opening_message,
            selected_index: None,
            students,
            teacher: Teacher::new(classroom.teacher, oracle.clone()),
            moderator: Moderator::new(classroom.moderator, oracle),
        })
    }

    pub fn is_finished(&self) -> bool {
        self.current_round >= self.rounds
    }

    /// A serializable snapshot of the run's outcome.
    pub fn summary(&self) -> RunSummary {
        RunSummary {
            rounds: self.rounds,
            current_round: self.current_round,
            last_message: self.last_message.clone(),
            students: self
                .students
                .iter()
                .map(|s| StudentSummary {
                    name: s.profile().name.clone(),
                    history: s.history().to_vec(),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunSummary {
    pub rounds: u32,
    pub current_round: u32,
    pub last_message: String,
    pub students: Vec<StudentSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StudentSummary {
    pub name: String,
    pub history: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::CannedOracle;

    fn classroom(names: &[&str]) -> Classroom {
        Classroom {
            lesson_plan: "Fractions".to_string(),
            opening_message: "Welcome to Math class!".to_string(),
            teacher: TeacherProfile {
                name: "Prof".to_string(),
                subject: "Mathematics".to_string(),
                methodology: "negative punishment".to_string(),
                base_prompt: "You teach.".to_string(),
            },
            moderator: ModeratorProfile {
                base_prompt: "You moderate.".to_string(),
            },
            students: names
                .iter()
                .map(|name| StudentProfile {
                    name: name.to_string(),
                    age: 14,
                    profile: "curious".to_string(),
                    base_prompt: format!("You are {}.", name),
                })
                .collect(),
        }
    }

    #[test]
    fn test_initialize_sets_starting_values() {
        let state =
            SimulationState::initialize(classroom(&["A", "B"]), 3, Arc::new(CannedOracle::new("ok")))
                .unwrap();

        assert_eq!(state.rounds, 3);
        assert_eq!(state.current_round, 0);
        assert_eq!(state.last_message, "Welcome to Math class!");
        assert_eq!(state.selected_index, None);
        assert_eq!(state.students.len(), 2);
        assert!(state.students.iter().all(|s| s.history().is_empty()));
        assert!(!state.is_finished());
    }

    #[test]
    fn test_initialize_rejects_invalid_seed_data() {
        let oracle: Arc<dyn TextOracle> = Arc::new(CannedOracle::new("ok"));

        let err = SimulationState::initialize(classroom(&[]), 3, oracle.clone()).err();
        assert!(matches!(err, Some(SimulationError::EmptyRoster)));

        let err = SimulationState::initialize(classroom(&["A"]), 0, oracle.clone()).err();
        assert!(matches!(err, Some(SimulationError::InvalidRounds)));

        let mut silent = classroom(&["A"]);
        silent.opening_message = "   ".to_string();
        let err = SimulationState::initialize(silent, 3, oracle).err();
        assert!(matches!(err, Some(SimulationError::EmptyOpeningMessage)));
    }

    #[test]
    fn test_summary_serializes_histories() {
        let state =
            SimulationState::initialize(classroom(&["A"]), 1, Arc::new(CannedOracle::new("ok")))
                .unwrap();
        let json = serde_json::to_value(state.summary()).unwrap();

        assert_eq!(json["rounds"], 1);
        assert_eq!(json["current_round"], 0);
        assert_eq!(json["students"][0]["name"], "A");
        assert_eq!(json["students"][0]["history"], serde_json::json!([]));
    }

    #[test]
    fn test_classroom_deserializes_from_json() {
        let json = serde_json::to_string(&classroom(&["Ana", "Luis"])).unwrap();
        let parsed: Classroom = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.students[1].name, "Luis");
        assert_eq!(parsed.teacher.subject, "Mathematics");
    }
}
