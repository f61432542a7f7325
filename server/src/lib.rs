//! # Quiz Server Library
//!
//! Round-synchronized quiz coordinator: a TCP server holding a shared cycle
//! of questions, collecting exactly one answer per participant per round,
//! scoring them, and republishing a ranked leaderboard after every round.
//!
//! ## Architecture
//!
//! One task per connection, all of them funneled through a single shared
//! state object. The round lock is the only serialization point that matters:
//! recording an answer, checking whether the round is complete against the
//! live participant count, scoring, and advancing to the next question happen
//! as one atomic unit, so simultaneous submissions, joins, and disconnects
//! can never complete a round twice or advance the question with stale
//! standings.
//!
//! Outbound traffic never runs under that lock in a blocking way: each
//! connection owns an unbounded channel drained by its own writer task, so a
//! slow or dead peer cannot stall round decisions or broadcasts to others.
//!
//! ## Module Organization
//!
//! - [`quiz`] - the question bank (a cyclic pointer over an immutable
//!   question list) and the score board (accumulated points per name,
//!   ranked on demand).
//! - [`round`] - the round coordinator: answers collected this round,
//!   scoring, and the race-free completion decision.
//! - [`registry`] - the session registry: currently connected participants
//!   keyed by connection identity, with per-session outbound channels and
//!   broadcast fan-out.
//! - [`network`] - the TCP front end: accept loop, handshake, per-connection
//!   reader/writer tasks, and the shared state glue.
//! - [`questions`] - built-in question set, JSON file loading, validation,
//!   and optional shuffling.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::network::Server;
//! use server::questions;
//! use server::quiz::QuestionBank;
//! use server::round::RoundCoordinator;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let bank = QuestionBank::new(questions::default_questions());
//!     let server = Server::bind("127.0.0.1:12345", RoundCoordinator::new(bank)).await?;
//!     server.run().await?;
//!     Ok(())
//! }
//! ```

pub mod network;
pub mod questions;
pub mod quiz;
pub mod registry;
pub mod round;
