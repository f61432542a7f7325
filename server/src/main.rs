use clap::Parser;
use log::{error, info};
use server::network::Server;
use server::questions;
use server::quiz::QuestionBank;
use server::round::RoundCoordinator;
use std::path::PathBuf;

/// Main-method of the application.
/// Parses command-line arguments, loads the question set, then runs the
/// server until it fails or Ctrl+C arrives.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Command line arguments
    #[derive(Parser, Debug)]
    #[clap(author, version, about)]
    struct Args {
        /// Server IP address to bind to
        #[clap(short = 'H', long, default_value = "0.0.0.0")]
        host: String,
        /// Server port to listen on
        #[clap(short, long, default_value = "12345")]
        port: u16,
        /// Path to a JSON question file (built-in set when omitted)
        #[clap(short, long)]
        questions: Option<PathBuf>,
        /// Shuffle the question order at startup
        #[clap(short, long)]
        shuffle: bool,
    }

    let args = Args::parse();
    env_logger::init();

    let mut questions = match &args.questions {
        Some(path) => questions::load_questions(path).map_err(|e| {
            error!("Failed to load questions from {}: {}", path.display(), e);
            e
        })?,
        None => questions::default_questions(),
    };
    if args.shuffle {
        questions::shuffle_questions(&mut questions);
    }
    info!("{} questions loaded", questions.len());

    let coordinator = RoundCoordinator::new(QuestionBank::new(questions));
    let address = format!("{}:{}", args.host, args.port);
    let server = Server::bind(&address, coordinator).await?;

    tokio::select! {
        result = server.run() => {
            if let Err(e) = result {
                error!("Server failed: {}", e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }

    Ok(())
}
