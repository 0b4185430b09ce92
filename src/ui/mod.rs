//! Interactive terminal front-end: a line-command loop over the search
//! session, with async completions and the recording timer multiplexed
//! through one select loop.

pub mod result_view;

use std::io::Write;
use std::time::Duration;

use tokio::io::AsyncBufReadExt;
use tokio::sync::mpsc;

use crate::session::{SearchSession, SessionEvent};

/// Everything the terminal front-end can be asked to do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Record,
    Stop,
    Load(String),
    Search,
    More,
    Play(usize),
    Save(usize),
    Health,
    Help,
    Quit,
}

/// Parse one input line. Empty lines are `None`; anything unrecognized is an
/// error message for the user.
pub fn parse_command(line: &str) -> Option<Result<Command, String>> {
    let mut parts = line.split_whitespace();
    let keyword = parts.next()?;
    let argument = parts.next();

    let command = match keyword {
        "record" | "r" => Command::Record,
        "stop" => Command::Stop,
        "load" | "l" => match argument {
            Some(path) => Command::Load(path.to_string()),
            None => return Some(Err("usage: load <audio file>".to_string())),
        },
        "search" | "s" => Command::Search,
        "more" | "m" => Command::More,
        "play" | "p" => match argument.map(str::parse) {
            Some(Ok(index)) => Command::Play(index),
            _ => return Some(Err("usage: play <result number>".to_string())),
        },
        "save" => match argument.map(str::parse) {
            Some(Ok(index)) => Command::Save(index),
            _ => return Some(Err("usage: save <result number>".to_string())),
        },
        "health" => Command::Health,
        "help" | "?" => Command::Help,
        "quit" | "q" | "exit" => Command::Quit,
        other => return Some(Err(format!("unknown command '{}', try 'help'", other))),
    };
    Some(Ok(command))
}

fn print_help() {
    println!("Commands:");
    println!("  record          start recording from the microphone");
    println!("  stop            finish the recording");
    println!("  load <file>     use an audio file as the query instead");
    println!("  search          send the clip to the similarity service");
    println!("  more            show the next page of results");
    println!("  play <n>        toggle playback of result n");
    println!("  save <n>        save result n's audio to disk");
    println!("  health          check the similarity service");
    println!("  quit            exit");
}

/// Drive the session until quit/EOF/Ctrl-C
pub async fn run(
    mut session: SearchSession,
    mut events_rx: mpsc::Receiver<SessionEvent>,
) -> anyhow::Result<()> {
    println!("Sound similarity search. Type 'help' for commands.");

    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let mut lines = stdin.lines();
    let mut ticker = tokio::time::interval(Duration::from_secs(1));

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break; // stdin closed
                };
                match parse_command(&line) {
                    None => {}
                    Some(Err(message)) => println!("{}", message),
                    Some(Ok(Command::Quit)) => break,
                    Some(Ok(command)) => dispatch(&mut session, command).await,
                }
            }

            Some(event) = events_rx.recv() => {
                if session.handle_event(event) {
                    result_view::render_results(&session.store().snapshot(), session.playing_row());
                }
            }

            _ = ticker.tick() => {
                if session.is_recording() {
                    if session.recording_limit_reached() {
                        println!();
                        println!("Maximum recording length reached.");
                        session.toggle_recording();
                    } else {
                        print!("\rRecording... {}  ", result_view::format_elapsed(session.recording_elapsed_secs()));
                        let _ = std::io::stdout().flush();
                    }
                }
            }

            _ = tokio::signal::ctrl_c() => {
                println!();
                break;
            }
        }
    }

    session.shutdown();
    println!("Bye.");
    Ok(())
}

async fn dispatch(session: &mut SearchSession, command: Command) {
    match command {
        Command::Record => session.toggle_recording(),
        Command::Stop => session.stop_recording(),
        Command::Load(path) => session.load_file(&path),
        Command::Search => session.start_search(),
        Command::More => session.show_more(),
        Command::Play(index) => session.toggle_play(index),
        Command::Save(index) => session.save(index),
        Command::Health => session.health().await,
        Command::Help => print_help(),
        Command::Quit => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bare_commands_and_aliases() {
        assert_eq!(parse_command("record"), Some(Ok(Command::Record)));
        assert_eq!(parse_command("s"), Some(Ok(Command::Search)));
        assert_eq!(parse_command("more"), Some(Ok(Command::More)));
        assert_eq!(parse_command("q"), Some(Ok(Command::Quit)));
    }

    #[test]
    fn parses_arguments() {
        assert_eq!(
            parse_command("load kick.ogg"),
            Some(Ok(Command::Load("kick.ogg".to_string())))
        );
        assert_eq!(parse_command("play 3"), Some(Ok(Command::Play(3))));
        assert_eq!(parse_command("save 12"), Some(Ok(Command::Save(12))));
    }

    #[test]
    fn empty_lines_are_ignored() {
        assert_eq!(parse_command(""), None);
        assert_eq!(parse_command("   "), None);
    }

    #[test]
    fn bad_input_is_an_error_message() {
        assert!(matches!(parse_command("play abc"), Some(Err(_))));
        assert!(matches!(parse_command("load"), Some(Err(_))));
        assert!(matches!(parse_command("dance"), Some(Err(_))));
    }
}
