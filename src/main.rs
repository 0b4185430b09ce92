use clap::Parser;
use tokio::sync::mpsc;

use soundseek::config::read_app_config;
use soundseek::session::{SearchSession, SessionEvent};
use soundseek::ui;

#[derive(Parser)]
#[command(name = "soundseek")]
#[command(about = "Find similar sounds by recording or uploading a clip")]
#[command(version)]
struct Args {
    /// Base URL of the similarity service, overriding config.toml
    #[arg(long)]
    base_url: Option<String>,

    /// Search with this audio file and print the first page, no interaction
    #[arg(long)]
    query: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut app_config = read_app_config();
    if let Some(base_url) = args.base_url {
        app_config.service.base_url = base_url;
    }
    println!("Using similarity service at {}", app_config.service.base_url);

    let (events_tx, events_rx) = mpsc::channel::<SessionEvent>(16);
    let session = SearchSession::new(&app_config, events_tx)?;

    if let Some(query) = args.query {
        run_one_shot(session, events_rx, &query).await
    } else {
        // Non-fatal probe so a wrong base URL shows up before the first search
        session.health().await;
        ui::run(session, events_rx).await
    }
}

/// Non-interactive mode: load a file, search, render the first page, exit
async fn run_one_shot(
    mut session: SearchSession,
    mut events_rx: mpsc::Receiver<SessionEvent>,
    query: &str,
) -> anyhow::Result<()> {
    session.load_file(query);
    if !session.has_clip() {
        anyhow::bail!("could not load query file");
    }

    session.start_search();
    if let Some(event) = events_rx.recv().await {
        if session.handle_event(event) {
            ui::result_view::render_results(&session.store().snapshot(), None);
        }
    }

    session.shutdown();
    Ok(())
}
