use inquire::{InquireError, Select, Text};
use weather_core::{Dashboard, Query, Units, ViewMode, render, view::LOADING_LABEL};

const HELP: &str = ":units metric|imperial  :recent  :quit";

/// One line of input at the session prompt.
#[derive(Debug, PartialEq, Eq)]
pub enum SessionCommand {
    Search(String),
    SetUnits(Units),
    Recent,
    Quit,
    Invalid(String),
}

impl SessionCommand {
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }

        let Some(rest) = line.strip_prefix(':') else {
            return Some(Self::Search(line.to_string()));
        };

        let mut parts = rest.split_whitespace();
        let cmd = match (parts.next(), parts.next()) {
            (Some("q" | "quit" | "exit"), None) => Self::Quit,
            (Some("recent"), None) => Self::Recent,
            (Some("units"), Some(value)) => match Units::try_from(value) {
                Ok(units) => Self::SetUnits(units),
                Err(e) => Self::Invalid(e.to_string()),
            },
            _ => Self::Invalid(format!("Unknown command '{line}'. Try {HELP}")),
        };
        Some(cmd)
    }
}

pub async fn run(dash: &Dashboard, locate: bool) -> anyhow::Result<()> {
    if locate {
        eprintln!("{LOADING_LABEL}");
        let _ = dash.locate().await;
        print!("{}", render(&dash.snapshot(), ViewMode::Full));
    }

    loop {
        let line = match Text::new("City:").with_help_message(HELP).prompt() {
            Ok(line) => line,
            Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => break,
            Err(e) => return Err(e.into()),
        };

        let Some(command) = SessionCommand::parse(&line) else {
            continue;
        };

        match command {
            SessionCommand::Quit => break,
            SessionCommand::SetUnits(units) => {
                dash.set_units(units);
                println!("Units set to {units} ({}).", units.temperature_symbol());
            }
            SessionCommand::Invalid(msg) => println!("{msg}"),
            SessionCommand::Recent => {
                let snapshot = dash.snapshot();
                let recent: Vec<String> = snapshot.recent().iter().map(str::to_string).collect();
                if recent.is_empty() {
                    println!("No recent searches yet.");
                    continue;
                }

                match Select::new("Recent cities:", recent).prompt() {
                    Ok(city) => search(dash, city).await,
                    Err(InquireError::OperationCanceled) => continue,
                    Err(InquireError::OperationInterrupted) => break,
                    Err(e) => return Err(e.into()),
                }
            }
            SessionCommand::Search(city) => search(dash, city).await,
        }
    }

    Ok(())
}

async fn search(dash: &Dashboard, city: String) {
    let query = Query::new(city, dash.snapshot().units());

    eprintln!("{LOADING_LABEL}");
    let _ = dash.submit(&query).await;
    print!("{}", render(&dash.snapshot(), ViewMode::Full));
}
