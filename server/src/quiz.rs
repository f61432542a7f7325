use shared::{LeaderboardEntry, Question};

/// Cyclic sequence of questions. The quiz never ends: advancing past the last
/// question wraps back to the first.
#[derive(Debug)]
pub struct QuestionBank {
    questions: Vec<Question>,
    current: usize,
}

impl QuestionBank {
    /// Creates a bank over a non-empty question list. The current index is
    /// always valid from here on, so `current()` cannot fail.
    pub fn new(questions: Vec<Question>) -> Self {
        assert!(!questions.is_empty(), "question bank must not be empty");
        Self {
            questions,
            current: 0,
        }
    }

    pub fn current(&self) -> &Question {
        &self.questions[self.current]
    }

    /// Moves to the next question, wrapping to the first after the last.
    pub fn advance(&mut self) {
        self.current = (self.current + 1) % self.questions.len();
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }
}

#[derive(Debug)]
struct ScoreEntry {
    name: String,
    points: u32,
}

/// Accumulated points per participant name.
///
/// Entries are kept in first-score order, which makes the leaderboard's tie
/// order deterministic for the lifetime of the process. Entries are never
/// removed: a disconnected participant keeps their score.
#[derive(Debug)]
pub struct ScoreBoard {
    entries: Vec<ScoreEntry>,
}

impl ScoreBoard {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Adds `amount` to the running total for `name`, creating a
    /// zero-initialized entry first if the name has never scored.
    ///
    /// Callers serialize all mutations; this type does no locking itself.
    pub fn add_points(&mut self, name: &str, amount: u32) {
        match self.entries.iter_mut().find(|e| e.name == name) {
            Some(entry) => entry.points += amount,
            None => self.entries.push(ScoreEntry {
                name: name.to_string(),
                points: amount,
            }),
        }
    }

    /// Current total for `name`, 0 if the name has never scored.
    pub fn points_of(&self, name: &str) -> u32 {
        self.entries
            .iter()
            .find(|e| e.name == name)
            .map(|e| e.points)
            .unwrap_or(0)
    }

    /// Ranked snapshot, sorted by points descending. Places are dense 1-based
    /// consecutive positions; ties keep first-score order and still get
    /// distinct places.
    pub fn leaderboard(&self) -> Vec<LeaderboardEntry> {
        let mut ranked: Vec<&ScoreEntry> = self.entries.iter().collect();
        ranked.sort_by(|a, b| b.points.cmp(&a.points));

        ranked
            .iter()
            .enumerate()
            .map(|(position, entry)| LeaderboardEntry {
                place: position as u32 + 1,
                name: entry.name.clone(),
                points: entry.points,
            })
            .collect()
    }
}
