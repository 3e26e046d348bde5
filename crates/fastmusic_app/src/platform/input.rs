use fastmusic_core::AudioQuality;

pub const HELP: &str = "\
commands:
  search <query>    search for songs
  get <n>...        download result rows (1-based)
  url <link>        download from a YouTube link
  quality <kbps>    128, 192, 256 or 320
  results           show the last results
  help              show this help
  quit              exit";

/// One line typed in the interactive session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineCommand {
    Search(String),
    Get(Vec<usize>),
    Url(String),
    Quality(AudioQuality),
    Results,
    Help,
    Quit,
    Empty,
}

/// Parses a line. `Err` carries a message for the user.
pub fn parse_line(line: &str) -> Result<LineCommand, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(LineCommand::Empty);
    }
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    match word.to_ascii_lowercase().as_str() {
        // Blank queries still go through update so the error is reported there.
        "search" | "s" => Ok(LineCommand::Search(rest.to_string())),
        "get" | "g" => parse_rows(rest).map(LineCommand::Get),
        "url" | "u" => Ok(LineCommand::Url(rest.to_string())),
        "quality" | "q" => rest
            .parse::<AudioQuality>()
            .map(LineCommand::Quality)
            .map_err(|err| err.to_string()),
        "results" | "r" => Ok(LineCommand::Results),
        "help" | "h" | "?" => Ok(LineCommand::Help),
        "quit" | "exit" => Ok(LineCommand::Quit),
        other => Err(format!("unknown command {other:?}; type help")),
    }
}

fn parse_rows(rest: &str) -> Result<Vec<usize>, String> {
    let rows = rest
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|part| !part.is_empty())
        .map(|part| match part.parse::<usize>() {
            Ok(n) if n > 0 => Ok(n),
            _ => Err(format!("not a result number: {part:?}")),
        })
        .collect::<Result<Vec<_>, _>>()?;
    if rows.is_empty() {
        return Err("usage: get <n>...".to_string());
    }
    Ok(rows)
}
