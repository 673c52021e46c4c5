use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyCode},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use manuscript_config::Config;
use manuscript_engine::{ManuscriptSession, PersistenceError, TocEntry, read_annotations};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
};
use std::{
    env,
    io::{Stdout, stdout},
    ops::Range,
    path::{Path, PathBuf},
    process,
};

struct App {
    session: ManuscriptSession,
    toc: Vec<TocEntry>,
    toc_state: ListState,
    current_content: Vec<String>,
}

impl App {
    fn new(session: ManuscriptSession, config: &Config) -> Self {
        let toc = session.headings(&config.toc_options());

        let mut app = Self {
            session,
            toc,
            toc_state: ListState::default(),
            current_content: Vec::new(),
        };

        // Select first heading if available
        if !app.toc.is_empty() {
            app.toc_state.select(Some(0));
        }
        app.update_content_for_selection();
        app
    }

    fn next_heading(&mut self) {
        if self.toc.is_empty() {
            return;
        }
        let i = match self.toc_state.selected() {
            Some(i) => (i + 1) % self.toc.len(),
            None => 0,
        };
        self.toc_state.select(Some(i));
        self.update_content_for_selection();
    }

    fn previous_heading(&mut self) {
        if self.toc.is_empty() {
            return;
        }
        let i = match self.toc_state.selected() {
            Some(0) | None => self.toc.len() - 1,
            Some(i) => i - 1,
        };
        self.toc_state.select(Some(i));
        self.update_content_for_selection();
    }

    fn update_content_for_selection(&mut self) {
        let section = match self.toc_state.selected() {
            Some(index) => section_bounds(&self.toc, index, self.session.len()),
            None => 0..self.session.len(),
        };
        self.current_content = self.render_section(section);
    }

    fn render_section(&self, section: Range<usize>) -> Vec<String> {
        let mut lines: Vec<String> = self
            .session
            .slice(section.clone())
            .lines()
            .map(str::to_string)
            .collect();

        let store = self.session.annotations();
        let formatting = store.ranges_overlapping(section.start, section.end.saturating_sub(1));
        if !formatting.is_empty() {
            lines.push(String::new());
            lines.push(format!("Formatting ({})", formatting.len()));
            for range in formatting {
                lines.push(format!(
                    "  {} {}..{}: {}",
                    range.kind,
                    range.start,
                    range.end,
                    self.session.slice(range.start..range.end).trim()
                ));
            }
        }

        let comments = store.comments_between(section.start, section.end);
        if !comments.is_empty() {
            lines.push(String::new());
            lines.push(format!("Comments ({})", comments.len()));
            for comment in comments {
                let marker = if comment.resolved { "✓" } else { "•" };
                let author = comment.author.as_deref().unwrap_or("anonymous");
                lines.push(format!(
                    "  {marker} @{} {author}: {}",
                    comment.position, comment.text
                ));
            }
        }

        lines
    }
}

/// Character range from a heading to the next heading, or to the end of the text
fn section_bounds(toc: &[TocEntry], index: usize, len: usize) -> Range<usize> {
    let start = toc.get(index).map_or(0, |entry| entry.position);
    let end = toc
        .get(index + 1)
        .map_or(len, |next| next.position.max(start));
    start..end
}

/// Plain-text outline indented by heading level
fn render_outline(toc: &[TocEntry]) -> String {
    toc.iter()
        .map(|entry| {
            let indent = "  ".repeat(usize::from(entry.level.saturating_sub(1)));
            format!("{indent}{}", entry.text)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn default_annotations_path(manuscript: &Path) -> PathBuf {
    let mut name = manuscript.as_os_str().to_owned();
    name.push(".annotations.json");
    PathBuf::from(name)
}

fn load_session(manuscript: &Path, annotations: Option<PathBuf>) -> Result<ManuscriptSession> {
    let text = std::fs::read_to_string(manuscript)
        .with_context(|| format!("reading manuscript {}", manuscript.display()))?;
    let explicit = annotations.is_some();
    let annotations_path = annotations.unwrap_or_else(|| default_annotations_path(manuscript));
    let len = text.chars().count();

    let store = match read_annotations(&annotations_path, len) {
        Ok(store) => store,
        Err(PersistenceError::NotFound(path)) if !explicit => {
            log::info!("no annotation file at {}, starting empty", path.display());
            Default::default()
        }
        Err(e) => {
            return Err(e)
                .with_context(|| format!("loading annotations {}", annotations_path.display()));
        }
    };

    Ok(ManuscriptSession::with_store(&text, store))
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args: Vec<String> = env::args().collect();
    let print_toc = args.iter().any(|arg| arg == "--toc");
    let positional: Vec<&String> = args.iter().skip(1).filter(|arg| *arg != "--toc").collect();

    let (manuscript, annotations) = match positional.as_slice() {
        [manuscript] => (PathBuf::from(manuscript), None),
        [manuscript, annotations] => (PathBuf::from(manuscript), Some(PathBuf::from(annotations))),
        _ => {
            eprintln!("Usage: {} <manuscript.txt> [annotations.json] [--toc]", args[0]);
            process::exit(1);
        }
    };

    let config = match Config::load_or_default() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: Failed to load config file: {e}");
            eprintln!("Config is read from {}", Config::config_path().display());
            process::exit(1);
        }
    };

    // Resolve relative manuscript paths against the configured folder
    let manuscript = match &config.manuscripts_path {
        Some(root) if manuscript.is_relative() && !manuscript.exists() => root.join(manuscript),
        _ => manuscript,
    };

    let session = load_session(&manuscript, annotations)?;

    if print_toc {
        let outline = render_outline(&session.headings(&config.toc_options()));
        if !outline.is_empty() {
            println!("{outline}");
        }
        return Ok(());
    }

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(session, &config);

    // Main loop
    let res = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("{err:?}");
    }

    Ok(())
}

fn run_app(terminal: &mut Terminal<CrosstermBackend<Stdout>>, app: &mut App) -> Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            match key.code {
                KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
                KeyCode::Down | KeyCode::Char('j') => app.next_heading(),
                KeyCode::Up | KeyCode::Char('k') => app.previous_heading(),
                _ => {}
            }
        }
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)].as_ref())
        .split(f.area());

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .margin(1)
        .constraints([Constraint::Percentage(30), Constraint::Percentage(70)].as_ref())
        .split(rows[0]);

    // Outline panel
    let toc_items: Vec<ListItem> = app
        .toc
        .iter()
        .map(|entry| {
            let indent = "  ".repeat(usize::from(entry.level.saturating_sub(1)));
            ListItem::new(vec![Line::from(vec![Span::raw(format!(
                "{indent}{}",
                entry.text
            ))])])
        })
        .collect();

    let toc_list = List::new(toc_items)
        .block(Block::default().borders(Borders::ALL).title("Contents"))
        .highlight_style(Style::default().bg(Color::Yellow).fg(Color::Black));

    f.render_stateful_widget(toc_list, chunks[0], &mut app.toc_state);

    // Section panel
    let content_text: Vec<Line> = if app.current_content.is_empty() {
        vec![Line::from("This manuscript is empty")]
    } else {
        app.current_content
            .iter()
            .map(|line| Line::from(vec![Span::raw(line.clone())]))
            .collect()
    };

    let title = format!(
        "Section · {} unresolved comment(s) in manuscript",
        app.session.annotations().unresolved_comments().count()
    );
    let content = Paragraph::new(content_text)
        .block(Block::default().borders(Borders::ALL).title(title))
        .wrap(ratatui::widgets::Wrap { trim: false });

    f.render_widget(content, chunks[1]);

    let help = Paragraph::new(Line::from(vec![
        Span::raw("q: Quit | "),
        Span::raw("↑/k: Previous heading | "),
        Span::raw("↓/j: Next heading"),
    ]));
    f.render_widget(help, rows[1]);
}
