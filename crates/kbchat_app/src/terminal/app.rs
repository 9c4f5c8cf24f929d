use std::fs;
use std::io::{self, BufRead, Write};
use std::path::Path;
use std::sync::{mpsc, Arc};
use std::thread;

use kbchat_client::HttpKnowledgeService;
use kbchat_core::{update, AppState, Effect, Msg, PdfFile};
use kbchat_logging::{kb_debug, kb_info, kb_warn};

use super::config::AppConfig;
use super::effects::EffectRunner;
use super::ui::input::{is_pdf_path, parse_line, Command, HELP_TEXT};
use super::ui::render::{confirm_line, Renderer};

/// Everything the dispatch loop reacts to, in arrival order.
pub enum LoopEvent {
    Input(String),
    InputClosed,
    Msg(Msg),
}

pub fn run_app(config: AppConfig) -> anyhow::Result<()> {
    let service = HttpKnowledgeService::new(&config.service_settings())?;
    kb_info!("Knowledge service at {}", service.base_url());

    let (loop_tx, loop_rx) = mpsc::channel::<LoopEvent>();
    let runner = EffectRunner::new(Arc::new(service), loop_tx.clone())?;
    spawn_input_reader(loop_tx)?;

    let state = AppState::new().with_notice_ttl(config.notice_ttl());
    let mut app = App::new(state, runner, io::stdout());
    app.start();
    app.flush()?;

    for event in loop_rx {
        let keep_going = match event {
            LoopEvent::Input(line) => app.handle_line(&line),
            LoopEvent::InputClosed => false,
            LoopEvent::Msg(msg) => {
                app.dispatch(msg);
                true
            }
        };
        app.flush()?;
        if !keep_going {
            break;
        }
    }

    kb_info!("Session ended");
    Ok(())
}

fn spawn_input_reader(loop_tx: mpsc::Sender<LoopEvent>) -> io::Result<()> {
    thread::Builder::new()
        .name("kbchat-input".to_string())
        .spawn(move || {
            let stdin = io::stdin();
            for line in stdin.lock().lines() {
                let event = match line {
                    Ok(line) => LoopEvent::Input(line),
                    Err(err) => {
                        kb_warn!("Failed to read stdin: {}", err);
                        break;
                    }
                };
                if loop_tx.send(event).is_err() {
                    return;
                }
            }
            let _ = loop_tx.send(LoopEvent::InputClosed);
        })?;
    Ok(())
}

/// Single owner of the session state. Every message is applied in one
/// `update` call and rendered afterwards, so no frame shows half a change.
struct App<W: Write> {
    state: AppState,
    runner: EffectRunner,
    renderer: Renderer,
    out: W,
    pending: Vec<String>,
}

impl<W: Write> App<W> {
    fn new(state: AppState, runner: EffectRunner, out: W) -> Self {
        Self {
            state,
            runner,
            renderer: Renderer::new(),
            out,
            pending: Vec::new(),
        }
    }

    /// Draws the empty session and asks for the knowledge base size.
    fn start(&mut self) {
        let lines = self.renderer.open(&mut self.state);
        self.pending.extend(lines);
        self.dispatch(Msg::StatusRefreshRequested);
    }

    fn dispatch(&mut self, msg: Msg) {
        let label = msg_label(&msg);
        kb_debug!("Dispatch {}", label);
        let completion = is_completion(&msg);
        let state = std::mem::take(&mut self.state);
        let (mut state, effects) = update(state, msg);
        match self.renderer.frame(&mut state) {
            Some(lines) => self.pending.extend(lines),
            None if completion && effects.is_empty() => {
                kb_debug!("{} dropped as stale", label);
            }
            None => {}
        }
        self.state = state;

        for effect in effects {
            match effect {
                Effect::ConfirmReset { prompt } => self.pending.push(confirm_line(&prompt)),
                other => self.runner.run(other),
            }
        }
    }

    /// Returns false when the user asked to leave.
    fn handle_line(&mut self, line: &str) -> bool {
        let view = self.state.view();
        match parse_line(line, view.confirming_reset) {
            Command::Empty => {}
            Command::Ask(question) => {
                if !view.chat_enabled {
                    self.say("Still waiting for the previous answer...");
                    return true;
                }
                self.dispatch(Msg::QuestionEdited(question));
                self.dispatch(Msg::QuestionSubmitted);
            }
            Command::IngestUrl(url) => {
                if !view.ingest_enabled {
                    self.say("An ingestion is already running; please wait.");
                    return true;
                }
                match url {
                    Some(url) => self.dispatch(Msg::UrlEdited(url)),
                    None if view.staged_url.trim().is_empty() => {
                        self.say("Usage: /url https://example.com");
                        return true;
                    }
                    None => {}
                }
                self.dispatch(Msg::UrlSubmitted);
            }
            Command::IngestPdf(path) => {
                if !view.ingest_enabled {
                    self.say("An ingestion is already running; please wait.");
                    return true;
                }
                match path {
                    Some(path) => match read_pdf(&path) {
                        Ok(file) => self.dispatch(Msg::PdfChosen(file)),
                        Err(message) => {
                            self.say(&message);
                            return true;
                        }
                    },
                    None if view.staged_pdf.is_none() => {
                        self.say("Usage: /pdf path/to/file.pdf");
                        return true;
                    }
                    None => {}
                }
                self.dispatch(Msg::PdfSubmitted);
            }
            Command::Unstage => {
                if !view.ingest_enabled {
                    self.say("An ingestion is already running; please wait.");
                    return true;
                }
                self.dispatch(Msg::UrlEdited(String::new()));
                self.dispatch(Msg::PdfCleared);
                self.say("Staged URL and PDF cleared.");
            }
            Command::Reset => self.dispatch(Msg::ResetRequested),
            Command::Confirm(true) => self.dispatch(Msg::ResetConfirmed),
            Command::Confirm(false) => {
                self.dispatch(Msg::ResetDeclined);
                self.say("Reset cancelled.");
            }
            Command::Status => self.dispatch(Msg::StatusRefreshRequested),
            Command::Help => self.say(HELP_TEXT),
            Command::Quit => return false,
            Command::Unknown(name) => self.say(&format!("Unknown command /{name}; try /help")),
        }
        true
    }

    fn say(&mut self, text: &str) {
        self.pending.push(text.to_string());
    }

    fn flush(&mut self) -> io::Result<()> {
        for line in self.pending.drain(..) {
            writeln!(self.out, "{line}")?;
        }
        self.out.flush()
    }
}

fn read_pdf(path: &Path) -> Result<PdfFile, String> {
    if !is_pdf_path(path) {
        return Err(format!("{} is not a .pdf file", path.display()));
    }
    let bytes = fs::read(path).map_err(|err| format!("Cannot read {}: {err}", path.display()))?;
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload.pdf".to_string());
    Ok(PdfFile::new(name, bytes))
}

/// Keeps file contents and full questions out of the debug log.
fn msg_label(msg: &Msg) -> &'static str {
    match msg {
        Msg::QuestionEdited(_) => "QuestionEdited",
        Msg::QuestionSubmitted => "QuestionSubmitted",
        Msg::UrlEdited(_) => "UrlEdited",
        Msg::UrlSubmitted => "UrlSubmitted",
        Msg::PdfChosen(_) => "PdfChosen",
        Msg::PdfCleared => "PdfCleared",
        Msg::PdfSubmitted => "PdfSubmitted",
        Msg::ResetRequested => "ResetRequested",
        Msg::ResetConfirmed => "ResetConfirmed",
        Msg::ResetDeclined => "ResetDeclined",
        Msg::StatusRefreshRequested => "StatusRefreshRequested",
        Msg::ChatAnswered { .. } => "ChatAnswered",
        Msg::IngestFinished { .. } => "IngestFinished",
        Msg::ResetFinished { .. } => "ResetFinished",
        Msg::StatusLoaded { .. } => "StatusLoaded",
        Msg::NoticeExpired { .. } => "NoticeExpired",
    }
}

fn is_completion(msg: &Msg) -> bool {
    matches!(
        msg,
        Msg::ChatAnswered { .. }
            | Msg::IngestFinished { .. }
            | Msg::ResetFinished { .. }
            | Msg::StatusLoaded { .. }
            | Msg::NoticeExpired { .. }
    )
}
