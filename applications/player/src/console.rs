//! Interactive console: stdin commands in, status lines out.

use classdj_client::ClassPeriod;
use classdj_playback::{PlaybackEvent, PlayerSnapshot};
use std::fmt::Write as _;
use std::str::FromStr;

pub const HELP: &str = "commands: p play/pause, n next, b previous, s <0..1> seek, l list, q quit";

/// One line typed by the user
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConsoleCommand {
    TogglePlayPause,
    Next,
    Previous,
    Seek(f32),
    List,
    Help,
    Quit,
}

impl FromStr for ConsoleCommand {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let Some(word) = words.next() else {
            return Err("empty command".to_string());
        };

        let command = match word {
            "p" | "play" | "pause" => ConsoleCommand::TogglePlayPause,
            "n" | "next" => ConsoleCommand::Next,
            "b" | "back" | "prev" => ConsoleCommand::Previous,
            "l" | "list" => ConsoleCommand::List,
            "h" | "help" | "?" => ConsoleCommand::Help,
            "q" | "quit" | "exit" => ConsoleCommand::Quit,
            "s" | "seek" => {
                let fraction = words
                    .next()
                    .ok_or_else(|| "seek needs a fraction between 0 and 1".to_string())?;
                let fraction: f32 = fraction
                    .parse()
                    .map_err(|_| format!("not a number: {}", fraction))?;
                ConsoleCommand::Seek(fraction)
            }
            other => return Err(format!("unknown command '{}' ({})", other, HELP)),
        };

        if words.next().is_some() {
            return Err(format!("too many arguments for '{}'", word));
        }
        Ok(command)
    }
}

/// Status line for the active track
pub fn now_playing_line(snapshot: &PlayerSnapshot) -> String {
    match (&snapshot.now_playing, snapshot.current_index) {
        (Some(title), Some(index)) => format!(
            "{} [{}/{}] {} {:>3}%",
            if snapshot.is_playing { "▶" } else { "⏸" },
            index + 1,
            snapshot.titles.len(),
            title,
            percent(snapshot.progress)
        ),
        _ => "No song playing".to_string(),
    }
}

/// Playlist listing with the active track marked
pub fn playlist_listing(snapshot: &PlayerSnapshot) -> String {
    if snapshot.titles.is_empty() {
        return "Playlist is empty".to_string();
    }

    let mut out = String::new();
    for (index, title) in snapshot.titles.iter().enumerate() {
        let marker = if snapshot.current_index == Some(index) {
            '*'
        } else {
            ' '
        };
        let _ = writeln!(out, "{} {:>3}. {}", marker, index + 1, title);
    }
    out.pop();
    out
}

/// One line per user-visible event; progress-only changes print nothing
pub fn event_line(event: &PlaybackEvent, snapshot: &PlayerSnapshot) -> Option<String> {
    match event {
        PlaybackEvent::TrackAdded { index, .. } => snapshot
            .titles
            .get(*index)
            .map(|title| format!("+ {}", title)),
        PlaybackEvent::TrackChanged { .. } | PlaybackEvent::StateChanged { .. } => {
            Some(now_playing_line(snapshot))
        }
        PlaybackEvent::PlayRejected { message, .. } => {
            Some(format!("! playback refused: {}", message))
        }
        PlaybackEvent::Seeked { .. } => None,
    }
}

/// Indented class → student → artist → song tree
pub fn class_tree(classes: &[ClassPeriod]) -> String {
    let mut out = String::new();
    for class in classes {
        let _ = writeln!(out, "{}", class.name);
        for student in &class.students {
            let _ = writeln!(out, "  {} (#{})", student.name, student.id);
            for artist in &student.artists {
                let _ = writeln!(out, "    {}", artist.name);
                for song in &artist.songs {
                    let _ = writeln!(out, "      - {}", song.title);
                }
            }
        }
    }
    out.pop();
    out
}

fn percent(progress: f32) -> u32 {
    (progress.clamp(0.0, 1.0) * 100.0).round() as u32
}
