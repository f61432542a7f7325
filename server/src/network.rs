//! TCP layer: accept loop, per-connection tasks, and the shared quiz state.
//!
//! Every accepted connection gets two tasks: a reader that parses inbound
//! lines and drives the coordinator, and a writer that drains the session's
//! outbound channel. All coordinator access goes through [`QuizState`], whose
//! single round lock makes scoring, the completion check, and the round
//! advance atomic with respect to concurrent submissions, joins, and leaves.
//!
//! Lock order is round lock first, then the registry's interior lock. Nothing
//! blocks or awaits inside either critical section: outbound delivery is an
//! unbounded channel push, so one slow or broken peer cannot stall a round
//! decision or a broadcast to the others.

use crate::registry::{SessionId, SessionRegistry};
use crate::round::{AnswerOutcome, CompletedRound, RoundCoordinator};
use log::{debug, error, info, warn};
use parking_lot::Mutex;
use shared::{ClientMessage, ServerMessage, ERR_ALREADY_ANSWERED, ERR_NO_USERNAME};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;

/// Registry plus round coordinator behind one serialization point.
pub struct QuizState {
    registry: SessionRegistry,
    round: Mutex<RoundCoordinator>,
}

impl QuizState {
    pub fn new(coordinator: RoundCoordinator) -> Self {
        Self {
            registry: SessionRegistry::new(),
            round: Mutex::new(coordinator),
        }
    }

    /// Opens the first round. Called once at server start, before any
    /// participant can connect; the broadcast usually reaches nobody.
    pub fn open_first_round(&self) {
        let mut round = self.round.lock();
        let question = round.start_round();
        self.registry.broadcast(&question.encode());
    }

    /// Registers a participant and sends its join snapshot: the in-flight
    /// QUESTION, then the current LEADERBOARD. Holding the round lock across
    /// registration and both sends guarantees the snapshot arrives in order
    /// and before any broadcast traffic.
    pub fn join(&self, name: &str, sender: mpsc::UnboundedSender<String>) -> SessionId {
        let round = self.round.lock();
        let id = self.registry.register(name, sender);
        self.registry
            .send_to(id, &round.question_snapshot().encode());
        self.registry
            .send_to(id, &round.leaderboard_snapshot().encode());
        id
    }

    /// Forwards one answer to the coordinator and delivers the consequences:
    /// the per-answer result to the submitter only, plus the leaderboard and
    /// next question to everyone when this answer completed the round.
    pub fn submit(&self, id: SessionId, name: &str, option: i32) {
        let mut round = self.round.lock();
        match round.submit_answer(name, option, self.registry.len()) {
            AnswerOutcome::AlreadyAnswered => {
                let reply = ServerMessage::Error(ERR_ALREADY_ANSWERED.to_string());
                self.registry.send_to(id, &reply.encode());
            }
            AnswerOutcome::Scored {
                correct,
                total_points,
                completed,
            } => {
                let reply = ServerMessage::AnswerResult {
                    correct,
                    total_points,
                };
                self.registry.send_to(id, &reply.encode());
                if let Some(done) = completed {
                    self.finish_round(done);
                }
            }
        }
    }

    /// Unregisters a departing connection and lets the coordinator drop its
    /// answer. The departure itself can complete the round.
    pub fn leave(&self, id: SessionId, name: &str) {
        let mut round = self.round.lock();
        self.registry.unregister(id);
        if let Some(done) = round.handle_leave(name, self.registry.len()) {
            self.finish_round(done);
        }
    }

    fn finish_round(&self, done: CompletedRound) {
        self.registry.broadcast(&done.leaderboard.encode());
        self.registry.broadcast(&done.next_question.encode());
    }
}

/// TCP front end: accepts connections and spawns a handler task for each.
pub struct Server {
    listener: TcpListener,
    state: Arc<QuizState>,
}

impl Server {
    pub async fn bind(addr: &str, coordinator: RoundCoordinator) -> std::io::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        info!("Server listening on {}", listener.local_addr()?);
        Ok(Server {
            listener,
            state: Arc::new(QuizState::new(coordinator)),
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Runs the accept loop. A failed accept is logged and the loop keeps
    /// going; one connection's trouble never takes the listener down.
    pub async fn run(self) -> std::io::Result<()> {
        self.state.open_first_round();

        loop {
            match self.listener.accept().await {
                Ok((stream, addr)) => {
                    info!("New connection from {}", addr);
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        handle_connection(stream, addr, state).await;
                    });
                }
                Err(e) => {
                    error!("Failed to accept connection: {}", e);
                }
            }
        }
    }
}

async fn write_line(half: &mut OwnedWriteHalf, line: &str) -> std::io::Result<()> {
    half.write_all(line.as_bytes()).await?;
    half.write_all(b"\n").await
}

/// Per-connection lifecycle: handshake, join, receive loop, leave.
async fn handle_connection(stream: TcpStream, addr: SocketAddr, state: Arc<QuizState>) {
    let (read_half, mut write_half) = stream.into_split();
    let mut lines = BufReader::new(read_half).lines();

    // Writer task: sole owner of the write half, draining the outbound
    // channel in FIFO order. Per-participant delivery order is therefore the
    // order messages were queued under the round lock.
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();
    let writer = tokio::spawn(async move {
        while let Some(line) = rx.recv().await {
            if let Err(e) = write_line(&mut write_half, &line).await {
                warn!("Failed to write to client: {}", e);
                break;
            }
        }
    });

    // Handshake: the first line must declare a non-empty username. Anything
    // else is answered with an ERROR and the connection is closed.
    let name = match lines.next_line().await {
        Ok(Some(first)) => match ClientMessage::parse(&first) {
            Ok(ClientMessage::Username(name)) if !name.is_empty() => name,
            _ => {
                warn!("Connection from {} sent no username, closing", addr);
                let reply = ServerMessage::Error(ERR_NO_USERNAME.to_string());
                let _ = tx.send(reply.encode());
                drop(tx);
                let _ = writer.await;
                return;
            }
        },
        Ok(None) => {
            debug!("Connection from {} closed before handshake", addr);
            return;
        }
        Err(e) => {
            warn!("Handshake read error from {}: {}", addr, e);
            return;
        }
    };

    info!("User joined: {} ({})", name, addr);
    let id = state.join(&name, tx.clone());

    loop {
        match lines.next_line().await {
            Ok(Some(line)) => match ClientMessage::parse(&line) {
                Ok(ClientMessage::Answer(option)) => state.submit(id, &name, option),
                Ok(ClientMessage::Username(_)) => {
                    // Re-declaring a username mid-session is not a command.
                    let reply = ServerMessage::Error(shared::ERR_UNKNOWN_COMMAND.to_string());
                    let _ = tx.send(reply.encode());
                }
                Err(parse_error) => {
                    debug!("Bad message from {}: {:?}", name, parse_error);
                    let reply = ServerMessage::Error(parse_error.message().to_string());
                    let _ = tx.send(reply.encode());
                }
            },
            Ok(None) => {
                info!("User disconnected: {}", name);
                break;
            }
            Err(e) => {
                warn!("Read error from {}: {}", name, e);
                break;
            }
        }
    }

    state.leave(id, &name);
    drop(tx);
    let _ = writer.await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quiz::QuestionBank;
    use shared::Question;
    use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};

    fn question(text: &str, correct_option: u8) -> Question {
        Question {
            text: text.to_string(),
            options: [
                "a".to_string(),
                "b".to_string(),
                "c".to_string(),
                "d".to_string(),
            ],
            correct_option,
        }
    }

    fn state() -> QuizState {
        let bank = QuestionBank::new(vec![question("first", 2), question("second", 1)]);
        QuizState::new(RoundCoordinator::new(bank))
    }

    fn drain(rx: &mut UnboundedReceiver<String>) -> Vec<String> {
        let mut lines = Vec::new();
        while let Ok(line) = rx.try_recv() {
            lines.push(line);
        }
        lines
    }

    #[test]
    fn test_join_snapshot_is_question_then_leaderboard() {
        let state = state();
        let (tx, mut rx) = unbounded_channel();

        state.join("Alice", tx);
        assert_eq!(drain(&mut rx), ["QUESTION|first|a|b|c|d", "LEADERBOARD"]);
    }

    #[test]
    fn test_two_participant_round() {
        let state = state();
        let (alice_tx, mut alice_rx) = unbounded_channel();
        let (bob_tx, mut bob_rx) = unbounded_channel();

        let alice = state.join("Alice", alice_tx);
        let bob = state.join("Bob", bob_tx);
        drain(&mut alice_rx);
        drain(&mut bob_rx);

        // Alice answers correctly: her result arrives alone, no broadcast yet.
        state.submit(alice, "Alice", 2);
        assert_eq!(drain(&mut alice_rx), ["ANSWER_RESULT|correct|100"]);
        assert!(drain(&mut bob_rx).is_empty());

        // Bob answers wrong: his result, then both get standings and the
        // next question.
        state.submit(bob, "Bob", 3);
        assert_eq!(
            drain(&mut bob_rx),
            [
                "ANSWER_RESULT|wrong|0",
                "LEADERBOARD|1;Alice;100|2;Bob;0",
                "QUESTION|second|a|b|c|d",
            ]
        );
        assert_eq!(
            drain(&mut alice_rx),
            ["LEADERBOARD|1;Alice;100|2;Bob;0", "QUESTION|second|a|b|c|d"]
        );
    }

    #[test]
    fn test_duplicate_answer_gets_error_reply() {
        let state = state();
        let (alice_tx, mut alice_rx) = unbounded_channel();
        let (bob_tx, _bob_rx) = unbounded_channel();

        let alice = state.join("Alice", alice_tx);
        state.join("Bob", bob_tx);
        drain(&mut alice_rx);

        state.submit(alice, "Alice", 2);
        drain(&mut alice_rx);

        state.submit(alice, "Alice", 1);
        assert_eq!(
            drain(&mut alice_rx),
            ["ERROR|Вы уже ответили на этот вопрос"]
        );
    }

    #[test]
    fn test_leave_of_last_outstanding_answerer_finishes_round() {
        let state = state();
        let (alice_tx, mut alice_rx) = unbounded_channel();
        let (bob_tx, mut bob_rx) = unbounded_channel();
        let (carol_tx, mut carol_rx) = unbounded_channel();

        let alice = state.join("Alice", alice_tx);
        let bob = state.join("Bob", bob_tx);
        let carol = state.join("Carol", carol_tx);
        drain(&mut alice_rx);
        drain(&mut bob_rx);
        drain(&mut carol_rx);

        state.submit(alice, "Alice", 2);
        state.submit(bob, "Bob", 1);
        drain(&mut alice_rx);
        drain(&mut bob_rx);

        // Carol never answers; her departure completes the round for the two
        // answers already collected.
        state.leave(carol, "Carol");
        assert_eq!(
            drain(&mut alice_rx),
            ["LEADERBOARD|1;Alice;100|2;Bob;0", "QUESTION|second|a|b|c|d"]
        );
        assert_eq!(
            drain(&mut bob_rx),
            ["LEADERBOARD|1;Alice;100|2;Bob;0", "QUESTION|second|a|b|c|d"]
        );
        // Carol was unregistered before the broadcast went out.
        assert!(drain(&mut carol_rx).is_empty());
    }

    #[test]
    fn test_join_mid_round_raises_completion_threshold() {
        let state = state();
        let (alice_tx, mut alice_rx) = unbounded_channel();
        let (bob_tx, mut bob_rx) = unbounded_channel();

        let alice = state.join("Alice", alice_tx);
        let bob = state.join("Bob", bob_tx);
        drain(&mut alice_rx);
        drain(&mut bob_rx);

        state.submit(alice, "Alice", 2);
        drain(&mut alice_rx);

        // Carol joins mid-round and receives the in-flight question.
        let (carol_tx, mut carol_rx) = unbounded_channel();
        let carol = state.join("Carol", carol_tx);
        assert_eq!(
            drain(&mut carol_rx),
            ["QUESTION|first|a|b|c|d", "LEADERBOARD|1;Alice;100"]
        );

        // Bob's answer is no longer the last outstanding one.
        state.submit(bob, "Bob", 2);
        assert_eq!(drain(&mut bob_rx), ["ANSWER_RESULT|correct|100"]);

        state.submit(carol, "Carol", 2);
        let carol_lines = drain(&mut carol_rx);
        assert_eq!(carol_lines[0], "ANSWER_RESULT|correct|100");
        assert_eq!(carol_lines[2], "QUESTION|second|a|b|c|d");
    }

    #[test]
    fn test_colliding_names_share_one_answer_per_round() {
        let state = state();
        let (first_tx, mut first_rx) = unbounded_channel();
        let (second_tx, mut second_rx) = unbounded_channel();

        let first = state.join("Alice", first_tx);
        let second = state.join("Alice", second_tx);
        drain(&mut first_rx);
        drain(&mut second_rx);

        state.submit(first, "Alice", 2);
        assert_eq!(drain(&mut first_rx), ["ANSWER_RESULT|correct|100"]);

        // The second connection shares the name, so its answer is a
        // duplicate and the round stays open.
        state.submit(second, "Alice", 2);
        assert_eq!(
            drain(&mut second_rx),
            ["ERROR|Вы уже ответили на этот вопрос"]
        );

        // One holder of the name leaving discards the shared answer along
        // with it, so the round still does not complete.
        state.leave(second, "Alice");
        assert!(drain(&mut first_rx).is_empty());
    }
}
