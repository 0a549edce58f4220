//! Classroom Participants
//!
//! Students and the teacher speak; the moderator only decides who speaks next.
//! Each participant is built from serde-friendly seed data (a `*Profile`) plus
//! the oracle it will talk through, and builds its own prompt every turn.

use crate::oracle::{OracleError, TextOracle};
use async_trait::async_trait;
use rand::{Rng, rngs::StdRng};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

/// Instruction closing every moderator prompt.
pub const SELECTION_INSTRUCTION: &str =
    "Which of these students is most likely to respond suitably? Return only the index number.";

/// Seed data for a student.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StudentProfile {
    pub name: String,
    pub age: u8,
    /// Short personality descriptor shown to the moderator.
    pub profile: String,
    /// Fixed behavioral seed text placed at the top of every prompt.
    pub base_prompt: String,
}

/// Seed data for the teacher.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TeacherProfile {
    pub name: String,
    pub subject: String,
    pub methodology: String,
    pub base_prompt: String,
}

/// Seed data for the moderator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModeratorProfile {
    pub base_prompt: String,
}

/// What a speaker sees when asked for its next utterance.
#[derive(Debug, Clone, Copy)]
pub struct Turn<'a> {
    /// The most recent speaker-tagged message.
    pub last_message: &'a str,
    pub lesson_plan: &'a str,
    /// The student being answered, when the speaker is the teacher.
    pub addressee: Option<&'a str>,
}

/// A participant that produces one utterance per turn.
#[async_trait]
pub trait Speaker: Send {
    /// The name used to tag this speaker's lines in the transcript.
    fn name(&self) -> &str;

    /// Asks the oracle for this speaker's next utterance.
    async fn produce(&mut self, turn: &Turn<'_>) -> Result<String, OracleError>;
}

pub struct Student {
    profile: StudentProfile,
    history: Vec<String>,
    oracle: Arc<dyn TextOracle>,
}

impl Student {
    pub fn new(profile: StudentProfile, oracle: Arc<dyn TextOracle>) -> Self {
        Self {
            profile,
            history: Vec::new(),
            oracle,
        }
    }

    pub fn profile(&self) -> &StudentProfile {
        &self.profile
    }

    /// Everything this student has said so far, oldest first.
    pub fn history(&self) -> &[String] {
        &self.history
    }

    fn prompt(&self, turn: &Turn<'_>) -> String {
        format!(
            "{base}\n\
             Profile: {profile}. What you have said so far: {history:?}.\n\
             Lesson plan: {plan}\n\
             In class just now: \"{last}\"\n\
             You are {name}, a {age}-year-old student, and your classmates are listening. \
             Answer the way a real student would, briefly and believably.",
            base = self.profile.base_prompt,
            profile = self.profile.profile,
            history = self.history,
            plan = turn.lesson_plan,
            last = turn.last_message,
            name = self.profile.name,
            age = self.profile.age,
        )
    }
}

#[async_trait]
impl Speaker for Student {
    fn name(&self) -> &str {
        &self.profile.name
    }

    async fn produce(&mut self, turn: &Turn<'_>) -> Result<String, OracleError> {
        let prompt = self.prompt(turn);
        debug!(student = %self.profile.name, %prompt, "Student prompt");
        let utterance = self.oracle.generate(&prompt).await?;
        self.history.push(utterance.clone());
        Ok(utterance)
    }
}

pub struct Teacher {
    profile: TeacherProfile,
    oracle: Arc<dyn TextOracle>,
}

impl Teacher {
    pub fn new(profile: TeacherProfile, oracle: Arc<dyn TextOracle>) -> Self {
        Self { profile, oracle }
    }

    pub fn profile(&self) -> &TeacherProfile {
        &self.profile
    }

    fn prompt(&self, turn: &Turn<'_>) -> String {
        format!(
            "{base}\n\
             You teach {subject}. Your method: {methodology}\n\
             Student {student} just said: \"{last}\"\n\
             Reply as the teacher in a real classroom, natural and firm, keeping the class on track.\n\
             Lesson plan: {plan}",
            base = self.profile.base_prompt,
            subject = self.profile.subject,
            methodology = self.profile.methodology,
            student = turn.addressee.unwrap_or("a student"),
            last = turn.last_message,
            plan = turn.lesson_plan,
        )
    }
}

#[async_trait]
impl Speaker for Teacher {
    fn name(&self) -> &str {
        &self.profile.name
    }

    async fn produce(&mut self, turn: &Turn<'_>) -> Result<String, OracleError> {
        let prompt = self.prompt(turn);
        debug!(teacher = %self.profile.name, %prompt, "Teacher prompt");
        self.oracle.generate(&prompt).await
    }
}

pub struct Moderator {
    profile: ModeratorProfile,
    oracle: Arc<dyn TextOracle>,
}

impl Moderator {
    pub fn new(profile: ModeratorProfile, oracle: Arc<dyn TextOracle>) -> Self {
        Self { profile, oracle }
    }

    /// Picks the index of the next student to speak.
    ///
    /// The oracle's answer is untrusted: anything that is not an integer in
    /// `0..students.len()` is replaced by a uniformly random index drawn from
    /// `rng`. Only oracle failures are returned as errors.
    ///
    /// `students` must not be empty.
    pub async fn select(
        &self,
        students: &[Student],
        last_message: &str,
        lesson_plan: &str,
        rng: &mut StdRng,
    ) -> Result<usize, OracleError> {
        let prompt = self.prompt(students, last_message, lesson_plan);
        debug!(%prompt, "Moderator prompt");
        let answer = self.oracle.generate(&prompt).await?;

        match parse_selection(&answer, students.len()) {
            Some(index) => Ok(index),
            None => {
                let index = rng.random_range(0..students.len());
                warn!(answer = %answer.trim(), fallback = index, "Moderator answer unusable, picking at random");
                Ok(index)
            }
        }
    }

    fn prompt(&self, students: &[Student], last_message: &str, lesson_plan: &str) -> String {
        let candidates: String = students
            .iter()
            .enumerate()
            .map(|(i, s)| format!("- {}: {}, profile: {}\n", i, s.profile.name, s.profile.profile))
            .collect();
        format!(
            "{}\nSituation: \"{}\"\nLesson plan: {}\nStudents:\n{}{}",
            self.profile.base_prompt, last_message, lesson_plan, candidates, SELECTION_INSTRUCTION
        )
    }
}

/// Parses a moderator answer into an index below `len`.
fn parse_selection(answer: &str, len: usize) -> Option<usize> {
    let index = answer.trim().parse::<i64>().ok()?;
    usize::try_from(index).ok().filter(|&i| i < len)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::{CannedOracle, MockTextOracle};
    use rand::SeedableRng;

    fn student(name: &str, oracle: Arc<dyn TextOracle>) -> Student {
        Student::new(
            StudentProfile {
                name: name.to_string(),
                age: 14,
                profile: format!("{} profile", name),
                base_prompt: format!("You are {}.", name),
            },
            oracle,
        )
    }

    fn moderator(oracle: Arc<dyn TextOracle>) -> Moderator {
        Moderator::new(
            ModeratorProfile {
                base_prompt: "You moderate.".to_string(),
            },
            oracle,
        )
    }

    fn turn<'a>(last_message: &'a str) -> Turn<'a> {
        Turn {
            last_message,
            lesson_plan: "fractions",
            addressee: None,
        }
    }

    #[test]
    fn test_parse_selection() {
        assert_eq!(parse_selection("1", 3), Some(1));
        assert_eq!(parse_selection("  2\n", 3), Some(2));
        assert_eq!(parse_selection("3", 3), None);
        assert_eq!(parse_selection("-1", 3), None);
        assert_eq!(parse_selection("Luis", 3), None);
        assert_eq!(parse_selection("", 3), None);
    }

    #[tokio::test]
    async fn test_student_appends_each_utterance_to_history() {
        let oracle = Arc::new(CannedOracle::new("half of a pizza"));
        let mut ana = student("Ana", oracle.clone());

        let first = ana.produce(&turn("Teacher: What is 1/2?")).await.unwrap();
        let second = ana.produce(&turn("Teacher: And 2/4?")).await.unwrap();

        assert_eq!(first, "half of a pizza");
        assert_eq!(second, "half of a pizza");
        assert_eq!(ana.history(), ["half of a pizza", "half of a pizza"]);

        let prompts = oracle.prompts();
        assert!(prompts[0].starts_with("You are Ana."));
        assert!(prompts[1].contains("And 2/4?"));
        assert!(prompts[1].contains("half of a pizza"));
    }

    #[tokio::test]
    async fn test_student_keeps_history_on_oracle_failure() {
        let mut oracle = MockTextOracle::new();
        oracle
            .expect_generate()
            .times(1)
            .returning(|_| Err(OracleError::EmptyResponse));
        let mut ana = student("Ana", Arc::new(oracle));

        assert!(ana.produce(&turn("hi")).await.is_err());
        assert!(ana.history().is_empty());
    }

    #[tokio::test]
    async fn test_teacher_prompt_names_the_student() {
        let oracle = Arc::new(CannedOracle::new("Focus, please."));
        let mut teacher = Teacher::new(
            TeacherProfile {
                name: "Prof".to_string(),
                subject: "Mathematics".to_string(),
                methodology: "negative punishment".to_string(),
                base_prompt: "You are the teacher.".to_string(),
            },
            oracle.clone(),
        );
        let turn = Turn {
            last_message: "Luis: lol",
            lesson_plan: "fractions",
            addressee: Some("Luis"),
        };

        assert_eq!(teacher.produce(&turn).await.unwrap(), "Focus, please.");
        assert_eq!(teacher.name(), "Prof");
        let prompt = &oracle.prompts()[0];
        assert!(prompt.contains("Student Luis just said: \"Luis: lol\""));
    }

    #[tokio::test]
    async fn test_moderator_prompt_lists_candidates() {
        let oracle = Arc::new(CannedOracle::new("1"));
        let students = vec![student("A", oracle.clone()), student("B", oracle.clone())];
        let mut rng = StdRng::seed_from_u64(7);

        let index = moderator(oracle.clone())
            .select(&students, "Welcome", "fractions", &mut rng)
            .await
            .unwrap();

        assert_eq!(index, 1);
        let prompt = &oracle.prompts()[0];
        assert!(prompt.contains("- 0: A, profile: A profile\n- 1: B, profile: B profile\n"));
        assert!(prompt.ends_with(SELECTION_INSTRUCTION));
    }

    #[tokio::test]
    async fn test_moderator_falls_back_on_unusable_answers() {
        for answer in ["Luis", "42", "-1", ""] {
            let oracle = Arc::new(CannedOracle::new(answer));
            let students = vec![student("A", oracle.clone()), student("B", oracle.clone())];
            let mut rng = StdRng::seed_from_u64(1);

            let index = moderator(oracle)
                .select(&students, "Welcome", "fractions", &mut rng)
                .await
                .unwrap();
            assert!(index < students.len(), "answer {:?} gave {}", answer, index);
        }
    }

    #[tokio::test]
    async fn test_moderator_fallback_is_reproducible_with_seed() {
        let oracle = Arc::new(CannedOracle::new("nobody"));
        let students: Vec<_> = (0..5).map(|i| student(&i.to_string(), oracle.clone())).collect();
        let moderator = moderator(oracle);

        let mut first = StdRng::seed_from_u64(99);
        let mut second = StdRng::seed_from_u64(99);
        for _ in 0..10 {
            let a = moderator.select(&students, "x", "y", &mut first).await.unwrap();
            let b = moderator.select(&students, "x", "y", &mut second).await.unwrap();
            assert_eq!(a, b);
        }
    }

    #[tokio::test]
    async fn test_moderator_propagates_oracle_failure() {
        let mut oracle = MockTextOracle::new();
        oracle
            .expect_generate()
            .returning(|_| Err(OracleError::Timeout(std::time::Duration::from_secs(1))));
        let oracle: Arc<dyn TextOracle> = Arc::new(oracle);
        let students = vec![student("A", oracle.clone())];
        let mut rng = StdRng::seed_from_u64(1);

        let result = moderator(oracle).select(&students, "x", "y", &mut rng).await;
        assert!(matches!(result, Err(OracleError::Timeout(_))));
    }
}
