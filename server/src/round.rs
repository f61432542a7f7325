//! Round state machine: collects exactly one answer per participant name per
//! round, scores answers, and decides when the round is complete.
//!
//! The coordinator is deliberately synchronous and free of I/O. The network
//! layer drives it under a single lock, handing in the live registry size for
//! every completion check, so recording an answer, scoring it, checking
//! completion, and advancing the question happen atomically as one unit.

use crate::quiz::{QuestionBank, ScoreBoard};
use log::info;
use shared::ServerMessage;
use std::collections::HashMap;

/// Points awarded for a correct answer.
const POINTS_PER_CORRECT_ANSWER: u32 = 100;

/// Result of one answer submission.
#[derive(Debug)]
pub enum AnswerOutcome {
    /// The name already answered this round; nothing was recorded or scored.
    AlreadyAnswered,
    /// The answer was recorded and scored. `completed` is set when this
    /// submission was the last one outstanding and the round advanced.
    Scored {
        correct: bool,
        total_points: u32,
        completed: Option<CompletedRound>,
    },
}

/// Broadcast payloads produced by a completed round, in emission order.
#[derive(Debug)]
pub struct CompletedRound {
    pub leaderboard: ServerMessage,
    pub next_question: ServerMessage,
}

pub struct RoundCoordinator {
    bank: QuestionBank,
    scores: ScoreBoard,
    answers: HashMap<String, i32>,
}

impl RoundCoordinator {
    pub fn new(bank: QuestionBank) -> Self {
        Self {
            bank,
            scores: ScoreBoard::new(),
            answers: HashMap::new(),
        }
    }

    /// Opens a fresh round on the current question and returns the QUESTION
    /// payload to broadcast to every registered participant.
    pub fn start_round(&mut self) -> ServerMessage {
        self.answers.clear();
        let question = self.bank.current();
        info!("Round started: {}", question.text);
        ServerMessage::question(question)
    }

    /// The in-flight question for a newly joined participant. Leaves the
    /// round's collected answers untouched.
    pub fn question_snapshot(&self) -> ServerMessage {
        ServerMessage::question(self.bank.current())
    }

    /// The current standings, for join snapshots and completion broadcasts.
    pub fn leaderboard_snapshot(&self) -> ServerMessage {
        ServerMessage::Leaderboard(self.scores.leaderboard())
    }

    /// Records and scores one answer.
    ///
    /// `registered` must be the registry size read while the caller holds the
    /// round lock; the completion threshold is the live participant count,
    /// not a snapshot from round start.
    pub fn submit_answer(&mut self, name: &str, option: i32, registered: usize) -> AnswerOutcome {
        if self.answers.contains_key(name) {
            return AnswerOutcome::AlreadyAnswered;
        }
        self.answers.insert(name.to_string(), option);

        let correct = self.bank.current().is_correct(option);
        let amount = if correct { POINTS_PER_CORRECT_ANSWER } else { 0 };
        self.scores.add_points(name, amount);
        let total_points = self.scores.points_of(name);
        info!(
            "Answer from {}: option {} ({}), total {} points",
            name,
            option,
            if correct { "correct" } else { "wrong" },
            total_points
        );

        AnswerOutcome::Scored {
            correct,
            total_points,
            completed: self.check_completion(registered),
        }
    }

    /// Removes a departing participant's answer (if any) and re-runs the
    /// completion check: the departure of the last outstanding answerer must
    /// finish the round with the answers already collected.
    pub fn handle_leave(&mut self, name: &str, registered: usize) -> Option<CompletedRound> {
        if self.answers.remove(name).is_some() {
            info!("Discarded answer of departing participant {}", name);
        }
        self.check_completion(registered)
    }

    /// Completes the round once every registered participant has answered.
    /// A round never completes on the strength of zero answers, so an empty
    /// server does not churn through questions as connections close.
    fn check_completion(&mut self, registered: usize) -> Option<CompletedRound> {
        if registered == 0 || self.answers.len() < registered {
            return None;
        }

        info!(
            "Round complete with {} answers, advancing to next question",
            self.answers.len()
        );
        let leaderboard = self.leaderboard_snapshot();
        self.bank.advance();
        let next_question = self.start_round();

        Some(CompletedRound {
            leaderboard,
            next_question,
        })
    }
}
