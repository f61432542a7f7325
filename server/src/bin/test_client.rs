use shared::{ClientMessage, ServerMessage};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::time::sleep;

// How many rounds the scripted client plays before disconnecting.
const ROUNDS_TO_PLAY: usize = 5;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let addr = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "127.0.0.1:12345".to_string());
    let name = std::env::args().nth(2).unwrap_or_else(|| "tester".to_string());

    let stream = TcpStream::connect(&addr).await?;
    println!("Connected to {}", addr);
    let (read_half, mut write_half) = stream.into_split();
    let mut lines = BufReader::new(read_half).lines();

    let hello = ClientMessage::Username(name.clone()).encode();
    println!("-> {}", hello);
    write_half.write_all(format!("{}\n", hello).as_bytes()).await?;

    let mut answered = 0;
    while let Some(line) = lines.next_line().await? {
        println!("<- {}", line);

        match ServerMessage::parse(&line) {
            Some(ServerMessage::Question { text, options }) => {
                println!("   Question: {}", text);
                for (i, option) in options.iter().enumerate() {
                    println!("     {}. {}", i + 1, option);
                }

                if answered >= ROUNDS_TO_PLAY {
                    break;
                }
                sleep(Duration::from_millis(500)).await;

                // Rotate through the options so results vary.
                let choice = (answered % 4) as i32 + 1;
                let answer = ClientMessage::Answer(choice).encode();
                println!("-> {}", answer);
                write_half.write_all(format!("{}\n", answer).as_bytes()).await?;
                answered += 1;
            }
            Some(ServerMessage::AnswerResult {
                correct,
                total_points,
            }) => {
                println!(
                    "   {} (total: {} points)",
                    if correct { "Correct!" } else { "Wrong." },
                    total_points
                );
            }
            Some(ServerMessage::Leaderboard(entries)) => {
                if entries.is_empty() {
                    println!("   Leaderboard is empty");
                }
                for entry in entries {
                    println!("   {}. {} with {} points", entry.place, entry.name, entry.points);
                }
            }
            Some(ServerMessage::Error(message)) => {
                println!("   Server error: {}", message);
            }
            None => {
                println!("   (unrecognized message)");
            }
        }
    }

    println!("Test client finished");
    Ok(())
}
