use std::path::PathBuf;

pub const HELP_TEXT: &str = "\
Type a question and press Enter to ask the knowledge base.
  /url [URL]    add a web page (no URL: retry the staged one)
  /pdf [PATH]   add a PDF file (no path: retry the staged one)
  /unstage      forget the staged URL and PDF
  /reset        clear the knowledge base and this conversation
  /status       refresh the knowledge base size
  /help         show this help
  /quit         leave";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Ask(String),
    IngestUrl(Option<String>),
    IngestPdf(Option<PathBuf>),
    Unstage,
    Reset,
    Status,
    Help,
    Quit,
    /// Answer to an open reset confirmation.
    Confirm(bool),
    Unknown(String),
    Empty,
}

/// Interprets one line of user input. While a reset confirmation is open the
/// line is the answer and nothing else.
pub fn parse_line(line: &str, confirming_reset: bool) -> Command {
    let line = line.trim();
    if confirming_reset {
        let yes = matches!(line.to_ascii_lowercase().as_str(), "y" | "yes");
        return Command::Confirm(yes);
    }
    if line.is_empty() {
        return Command::Empty;
    }
    let Some(rest) = line.strip_prefix('/') else {
        return Command::Ask(line.to_string());
    };

    let (name, arg) = match rest.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, Some(arg.trim()).filter(|arg| !arg.is_empty())),
        None => (rest, None),
    };
    match name {
        "url" => Command::IngestUrl(arg.map(str::to_string)),
        "pdf" => Command::IngestPdf(arg.map(PathBuf::from)),
        "unstage" => Command::Unstage,
        "reset" => Command::Reset,
        "status" => Command::Status,
        "help" | "?" => Command::Help,
        "quit" | "exit" => Command::Quit,
        other => Command::Unknown(other.to_string()),
    }
}

pub fn is_pdf_path(path: &std::path::Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
}
