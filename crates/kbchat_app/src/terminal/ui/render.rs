use kbchat_core::{AppState, AppViewModel, EntryView, NoticeKind, NoticeView, Role};

const WELCOME_TEXT: &str =
    "👋 Welcome! Add a URL or PDF with /url or /pdf, then ask me anything. (/help for commands)";
const CLEARED_TEXT: &str = "── conversation cleared ──";
const THINKING_TEXT: &str = "bot  › Thinking...";

/// Turns successive view models into the lines that changed since the last
/// frame. The terminal scrolls on its own, so printing new entries as they
/// arrive is what following the newest entry amounts to.
#[derive(Debug, Default)]
pub struct Renderer {
    printed_entries: usize,
    thinking_shown: bool,
    welcomed: bool,
    last_notice: Option<String>,
    last_chunks: Option<Option<u64>>,
}

impl Renderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Draws the session as it stands, before any message has been applied.
    pub fn open(&mut self, state: &mut AppState) -> Vec<String> {
        state.consume_dirty();
        state.consume_follow();
        self.render(&state.view(), true)
    }

    /// Draws what changed since the last frame, or `None` when the update
    /// left nothing to draw.
    pub fn frame(&mut self, state: &mut AppState) -> Option<Vec<String>> {
        let follow = state.consume_follow();
        if !state.consume_dirty() {
            return None;
        }
        Some(self.render(&state.view(), follow))
    }

    pub fn render(&mut self, view: &AppViewModel, follow: bool) -> Vec<String> {
        let mut lines = Vec::new();

        if let Some(chunks) = self.chunks_changed(view) {
            lines.push(match chunks {
                Some(count) => format!("🧠 Total memories: {count}"),
                None => "🧠 Total memories: unknown (service unreachable)".to_string(),
            });
        }

        if follow {
            self.render_conversation(view, &mut lines);
        }

        let notice_text = view.notice.as_ref().map(|notice| notice.text.clone());
        if notice_text != self.last_notice {
            if let Some(notice) = &view.notice {
                lines.push(format_notice(notice));
            }
            self.last_notice = notice_text;
        }

        lines
    }

    fn chunks_changed(&mut self, view: &AppViewModel) -> Option<Option<u64>> {
        let chunks = view.knowledge_chunks;
        if !view.knowledge_checked || self.last_chunks == Some(chunks) {
            return None;
        }
        self.last_chunks = Some(chunks);
        Some(chunks)
    }

    fn render_conversation(&mut self, view: &AppViewModel, lines: &mut Vec<String>) {
        if view.entries.len() < self.printed_entries {
            lines.push(CLEARED_TEXT.to_string());
            self.printed_entries = 0;
            self.welcomed = false;
        }

        for entry in &view.entries[self.printed_entries..] {
            lines.extend(format_entry(entry));
        }
        self.printed_entries = view.entries.len();

        if view.entries.is_empty() && !self.welcomed {
            lines.push(WELCOME_TEXT.to_string());
            self.welcomed = true;
        }

        if view.thinking && !self.thinking_shown {
            lines.push(THINKING_TEXT.to_string());
        }
        self.thinking_shown = view.thinking;
    }
}

pub fn confirm_line(prompt: &str) -> String {
    format!("{prompt} [y/N]")
}

fn format_entry(entry: &EntryView) -> Vec<String> {
    let speaker = match entry.role {
        Role::User => "you  ›",
        Role::Bot => "bot  ›",
    };
    let mut lines = vec![format!("{speaker} {}", entry.text)];
    if !entry.citations.is_empty() {
        lines.push(format!(
            "       📚 {} verified sources",
            entry.citations.len()
        ));
        for citation in &entry.citations {
            lines.push(format!("         [{}] {}", citation.label, citation.preview));
        }
    }
    lines
}

fn format_notice(notice: &NoticeView) -> String {
    match notice.kind {
        NoticeKind::Progress => format!("⏳ {}", notice.text),
        NoticeKind::Success | NoticeKind::Failure => notice.text.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kbchat_core::{update, Effect, Msg, StatusQueryId, SourceCitation};

    fn frame(renderer: &mut Renderer, state: &mut AppState) -> Vec<String> {
        renderer.frame(state).unwrap_or_default()
    }

    fn requested_query(effects: &[Effect]) -> StatusQueryId {
        match effects {
            [Effect::RefreshStatus { query }] => *query,
            other => panic!("expected a status query, got {other:?}"),
        }
    }

    #[test]
    fn first_frame_welcomes_once() {
        let mut renderer = Renderer::new();
        let mut state = AppState::new();
        assert_eq!(renderer.open(&mut state), vec![WELCOME_TEXT.to_string()]);
        assert!(renderer.open(&mut state).is_empty());
    }

    #[test]
    fn start_up_welcomes_then_shows_knowledge_size() {
        let mut renderer = Renderer::new();
        let mut state = AppState::new();
        assert_eq!(renderer.open(&mut state), vec![WELCOME_TEXT.to_string()]);

        let (mut state, effects) = update(state, Msg::StatusRefreshRequested);
        assert_eq!(renderer.frame(&mut state), None);

        let query = requested_query(&effects);
        let (mut state, _) = update(
            state,
            Msg::StatusLoaded {
                query,
                result: Ok(3),
            },
        );
        assert_eq!(
            renderer.frame(&mut state),
            Some(vec!["🧠 Total memories: 3".to_string()])
        );
    }

    #[test]
    fn failed_start_up_status_query_shows_unknown_size() {
        let mut renderer = Renderer::new();
        let mut state = AppState::new();
        renderer.open(&mut state);

        let (state, effects) = update(state, Msg::StatusRefreshRequested);
        let query = requested_query(&effects);
        let (mut state, _) = update(
            state,
            Msg::StatusLoaded {
                query,
                result: Err("down".to_string()),
            },
        );
        assert_eq!(
            renderer.frame(&mut state),
            Some(vec![
                "🧠 Total memories: unknown (service unreachable)".to_string()
            ])
        );
    }

    #[test]
    fn only_new_entries_are_printed() {
        let mut renderer = Renderer::new();
        let mut state = AppState::new();
        renderer.open(&mut state);

        let (next, _) = update(state, Msg::QuestionEdited("Capital?".to_string()));
        let (mut next, _) = update(next, Msg::QuestionSubmitted);
        let lines = frame(&mut renderer, &mut next);
        assert_eq!(
            lines,
            vec!["you  › Capital?".to_string(), THINKING_TEXT.to_string()]
        );

        let (mut next, _) = update(
            next,
            Msg::ChatAnswered {
                epoch: 0,
                result: Ok((
                    "Paris.".to_string(),
                    vec![SourceCitation::new("atlas.pdf", "Paris is the capital")],
                )),
            },
        );
        let lines = frame(&mut renderer, &mut next);
        assert_eq!(
            lines,
            vec![
                "bot  › Paris.".to_string(),
                "       📚 1 verified sources".to_string(),
                "         [atlas.pdf] Paris is the capital".to_string(),
            ]
        );
        state = next;
        assert!(frame(&mut renderer, &mut state).is_empty());
    }

    #[test]
    fn notices_print_on_change_only() {
        let mut renderer = Renderer::new();
        let (state, _) = update(AppState::new(), Msg::UrlEdited("https://a.test".to_string()));
        let (mut state, _) = update(state, Msg::UrlSubmitted);

        let lines = frame(&mut renderer, &mut state);
        assert!(lines.contains(&"⏳ 🌐 Scraping & chunking website...".to_string()));
        assert!(frame(&mut renderer, &mut state).is_empty());

        let (mut state, _) = update(
            state,
            Msg::IngestFinished {
                epoch: 0,
                source: kbchat_core::IngestSource::Url,
                result: Ok(Some("3 chunks added".to_string())),
            },
        );
        assert_eq!(
            frame(&mut renderer, &mut state),
            vec!["✅ 3 chunks added".to_string()]
        );
    }

    #[test]
    fn cleared_conversation_is_announced() {
        let mut renderer = Renderer::new();
        let (state, _) = update(AppState::new(), Msg::QuestionEdited("q".to_string()));
        let (mut state, _) = update(state, Msg::QuestionSubmitted);
        frame(&mut renderer, &mut state);

        let (state, _) = update(state, Msg::ResetRequested);
        let (mut state, _) = update(state, Msg::ResetConfirmed);
        let lines = frame(&mut renderer, &mut state);
        assert_eq!(lines[0], CLEARED_TEXT);
        assert!(lines.contains(&WELCOME_TEXT.to_string()));
        assert!(lines.contains(&format!("⏳ {}", kbchat_core::RESET_PROGRESS_TEXT)));
    }

    #[test]
    fn knowledge_size_is_shown_when_known_or_lost() {
        let mut renderer = Renderer::new();
        let mut view = AppViewModel::default();
        assert!(renderer.render(&view, false).is_empty());

        view.knowledge_checked = true;
        view.knowledge_chunks = Some(12);
        assert_eq!(
            renderer.render(&view, false),
            vec!["🧠 Total memories: 12".to_string()]
        );
        assert!(renderer.render(&view, false).is_empty());

        view.knowledge_chunks = None;
        assert_eq!(renderer.render(&view, false).len(), 1);
    }

    #[test]
    fn confirm_prompt_has_default_no() {
        assert_eq!(confirm_line("Sure?"), "Sure? [y/N]");
    }
}
