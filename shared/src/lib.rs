//! Wire protocol shared between the quiz server and its clients.
//!
//! The protocol is line-oriented UTF-8 text: one message per line, fields
//! separated by `|` (and `;` inside leaderboard entries). There is no escaping
//! mechanism, so question and option text must never contain `|`; the server
//! rejects such questions at load time.

use serde::Deserialize;

/// Sent when the first message of a connection does not declare a username.
pub const ERR_NO_USERNAME: &str = "Не указано имя пользователя";
/// Sent when an `ANSWER|` payload is not an integer.
pub const ERR_BAD_ANSWER_FORMAT: &str = "Неверный формат ответа";
/// Sent for any unrecognized message after the handshake.
pub const ERR_UNKNOWN_COMMAND: &str = "Неизвестная команда";
/// Sent when a participant submits a second answer within one round.
pub const ERR_ALREADY_ANSWERED: &str = "Вы уже ответили на этот вопрос";

/// One quiz question with exactly four answer options.
///
/// `correct_option` is 1-based (1..=4). Submitted answers outside that range
/// are simply wrong; they can never match.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Question {
    pub text: String,
    pub options: [String; 4],
    pub correct_option: u8,
}

impl Question {
    pub fn is_correct(&self, answer: i32) -> bool {
        answer == i32::from(self.correct_option)
    }
}

/// One row of the ranked leaderboard. Derived on demand, never stored.
#[derive(Debug, Clone, PartialEq)]
pub struct LeaderboardEntry {
    pub place: u32,
    pub name: String,
    pub points: u32,
}

/// Messages a client may send to the server.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientMessage {
    /// `USERNAME:<name>` - must be the first message of a connection.
    Username(String),
    /// `ANSWER|<n>` - the chosen option for the current question.
    Answer(i32),
}

/// Why an inbound line could not be parsed into a [`ClientMessage`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseError {
    BadAnswerFormat,
    UnknownCommand,
}

impl ParseError {
    /// The user-facing text carried by the resulting `ERROR|` message.
    pub fn message(&self) -> &'static str {
        match self {
            ParseError::BadAnswerFormat => ERR_BAD_ANSWER_FORMAT,
            ParseError::UnknownCommand => ERR_UNKNOWN_COMMAND,
        }
    }
}

impl ClientMessage {
    /// Parses one inbound line into a typed message.
    ///
    /// Usernames are trimmed but may parse as empty; rejecting empty names is
    /// a handshake decision, not a grammar one. Answer payloads must be
    /// integers but are not range-checked here - an out-of-range option is a
    /// legal (wrong) answer.
    pub fn parse(line: &str) -> Result<ClientMessage, ParseError> {
        if let Some(name) = line.strip_prefix("USERNAME:") {
            return Ok(ClientMessage::Username(name.trim().to_string()));
        }
        if let Some(payload) = line.strip_prefix("ANSWER|") {
            return match payload.parse::<i32>() {
                Ok(option) => Ok(ClientMessage::Answer(option)),
                Err(_) => Err(ParseError::BadAnswerFormat),
            };
        }
        Err(ParseError::UnknownCommand)
    }

    pub fn encode(&self) -> String {
        match self {
            ClientMessage::Username(name) => format!("USERNAME:{}", name),
            ClientMessage::Answer(option) => format!("ANSWER|{}", option),
        }
    }
}

/// Messages the server may send to a client.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerMessage {
    /// `QUESTION|<text>|<opt1>|<opt2>|<opt3>|<opt4>`
    Question { text: String, options: [String; 4] },
    /// `ANSWER_RESULT|<correct|wrong>|<total points>`
    AnswerResult { correct: bool, total_points: u32 },
    /// `LEADERBOARD|<place>;<name>;<points>|...` - bare `LEADERBOARD` when empty.
    Leaderboard(Vec<LeaderboardEntry>),
    /// `ERROR|<message>`
    Error(String),
}

impl ServerMessage {
    /// The broadcast payload for a question (the correct option stays server-side).
    pub fn question(q: &Question) -> ServerMessage {
        ServerMessage::Question {
            text: q.text.clone(),
            options: q.options.clone(),
        }
    }

    pub fn encode(&self) -> String {
        match self {
            ServerMessage::Question { text, options } => format!(
                "QUESTION|{}|{}|{}|{}|{}",
                text, options[0], options[1], options[2], options[3]
            ),
            ServerMessage::AnswerResult {
                correct,
                total_points,
            } => format!(
                "ANSWER_RESULT|{}|{}",
                if *correct { "correct" } else { "wrong" },
                total_points
            ),
            ServerMessage::Leaderboard(entries) => {
                let mut line = String::from("LEADERBOARD");
                for entry in entries {
                    line.push_str(&format!(
                        "|{};{};{}",
                        entry.place, entry.name, entry.points
                    ));
                }
                line
            }
            ServerMessage::Error(message) => format!("ERROR|{}", message),
        }
    }

    /// Parses one server line back into a typed message.
    ///
    /// Used by clients and tests; returns `None` for lines that do not match
    /// any known message shape. Malformed leaderboard entries are skipped
    /// rather than failing the whole line.
    pub fn parse(line: &str) -> Option<ServerMessage> {
        if line == "LEADERBOARD" {
            return Some(ServerMessage::Leaderboard(Vec::new()));
        }
        if let Some(data) = line.strip_prefix("LEADERBOARD|") {
            let mut entries = Vec::new();
            for raw in data.split('|') {
                let fields: Vec<&str> = raw.split(';').collect();
                if fields.len() != 3 {
                    continue;
                }
                if let (Ok(place), Ok(points)) =
                    (fields[0].parse::<u32>(), fields[2].parse::<u32>())
                {
                    entries.push(LeaderboardEntry {
                        place,
                        name: fields[1].to_string(),
                        points,
                    });
                }
            }
            return Some(ServerMessage::Leaderboard(entries));
        }
        if line.starts_with("QUESTION|") {
            let parts: Vec<&str> = line.split('|').collect();
            if parts.len() < 6 {
                return None;
            }
            return Some(ServerMessage::Question {
                text: parts[1].to_string(),
                options: [
                    parts[2].to_string(),
                    parts[3].to_string(),
                    parts[4].to_string(),
                    parts[5].to_string(),
                ],
            });
        }
        if let Some(data) = line.strip_prefix("ANSWER_RESULT|") {
            let parts: Vec<&str> = data.split('|').collect();
            if parts.len() < 2 {
                return None;
            }
            let correct = match parts[0] {
                "correct" => true,
                "wrong" => false,
                _ => return None,
            };
            return match parts[1].parse::<u32>() {
                Ok(total_points) => Some(ServerMessage::AnswerResult {
                    correct,
                    total_points,
                }),
                Err(_) => None,
            };
        }
        line.strip_prefix("ERROR|")
            .map(|message| ServerMessage::Error(message.to_string()))
    }
}
