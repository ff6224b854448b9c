use std::fs::{self, OpenOptions};
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget, Wrap};
use tracing_subscriber::EnvFilter;

use phrasedrill::app::{App, AppScreen, SETTINGS_FIELDS, SettingsField};
use phrasedrill::bank::PhraseBank;
use phrasedrill::config::Config;
use phrasedrill::engine::question::QuizMode;
use phrasedrill::event::{AppEvent, EventHandler};
use phrasedrill::store::json_store::{JsonStore, default_data_dir};
use phrasedrill::store::ledger::MistakeLedger;
use phrasedrill::ui;
use phrasedrill::ui::components::feedback_panel::FeedbackPanel;
use phrasedrill::ui::components::mistake_list::MistakeList;
use phrasedrill::ui::components::question_panel::QuestionPanel;
use phrasedrill::ui::components::stats_sidebar::StatsSidebar;
use phrasedrill::ui::layout::{AppLayout, pack_hint_lines};
use phrasedrill::ui::line_input::InputResult;

const LOG_ENV: &str = "PHRASEDRILL_LOG";

#[derive(Parser)]
#[command(
    name = "phrasedrill",
    version,
    about = "Terminal trainer for phrases, idioms and collocations"
)]
struct Cli {
    #[arg(short, long, help = "Phrase bank JSON file")]
    bank: Option<PathBuf>,

    #[arg(short, long, help = "Theme name")]
    theme: Option<String>,

    #[arg(long, help = "Seed for reproducible question order")]
    seed: Option<u64>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Load the phrase bank and mistake list, report what a drill would use, and exit.
    Check,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging();

    let mut config = Config::load().unwrap_or_else(|err| {
        tracing::warn!(error = %err, "config unreadable, using defaults");
        Config::default()
    });
    if let Some(bank) = cli.bank {
        config.phrase_bank = bank.to_string_lossy().to_string();
    }

    if let Some(Command::Check) = cli.command {
        return check(&config);
    }

    let mut app = App::new(config, cli.seed);
    if let Some(theme_name) = cli.theme
        && let Some(theme) = ui::theme::Theme::load(&theme_name)
    {
        app.set_theme(theme);
    }

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let events = EventHandler::new(Duration::from_millis(100));

    let result = run_app(&mut terminal, &mut app, &events);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = result {
        tracing::error!(error = ?err, "exited with error");
        eprintln!("Error: {err:?}");
    }

    Ok(())
}

/// Log to a file under the data dir; the terminal belongs to the UI.
fn init_logging() {
    let dir = default_data_dir();
    if fs::create_dir_all(&dir).is_err() {
        return;
    }
    let Ok(file) = OpenOptions::new()
        .create(true)
        .append(true)
        .open(dir.join("phrasedrill.log"))
    else {
        return;
    };
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new("phrasedrill=info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init();
}

fn check(config: &Config) -> Result<()> {
    let path = config.phrase_bank_path();
    let bank = PhraseBank::try_load(&path)
        .with_context(|| format!("checking {}", path.display()))?;
    let store = JsonStore::new()?;
    let ledger = MistakeLedger::load(Box::new(store));

    println!("Phrase bank: {}", path.display());
    println!("  phrases:  {}", bank.len());
    println!("  meanings: {}", bank.meanings.len());
    println!("  synonym groups: {}", bank.synonyms.len());
    let modes: Vec<&str> = bank.available_modes().iter().map(|m| m.label()).collect();
    println!("  modes:    {}", modes.join(", "));
    if !bank.supports_choice() {
        println!("  (Listen & Choose needs at least 4 distinct meanings)");
    }

    let stale: Vec<&String> = ledger
        .keys()
        .iter()
        .filter(|key| bank.find(key).is_none())
        .collect();
    println!("Mistakes: {} ({} not in this bank)", ledger.len(), stale.len());
    for key in stale {
        println!("  - {key}");
    }
    Ok(())
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    events: &EventHandler,
) -> Result<()> {
    loop {
        terminal.draw(|frame| render(frame, app))?;

        if app.recording {
            app.record_answer();
            continue;
        }

        match events.next()? {
            AppEvent::Key(key) => handle_key(app, key),
            AppEvent::Tick | AppEvent::Resize => {}
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn handle_key(app: &mut App, key: KeyEvent) {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        app.should_quit = true;
        return;
    }

    match app.screen {
        AppScreen::Menu => handle_menu_key(app, key),
        AppScreen::Drill => handle_drill_key(app, key),
        AppScreen::Mistakes => handle_mistakes_key(app, key),
        AppScreen::Settings => handle_settings_key(app, key),
    }
}

fn activate_menu_item(app: &mut App, key: &str) {
    match key {
        "1" => app.start_drill(),
        "m" => app.go_to_mistakes(),
        "c" => app.go_to_settings(),
        "r" => app.reload_bank(),
        "q" => app.should_quit = true,
        _ => {}
    }
}

fn handle_menu_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.should_quit = true,
        KeyCode::Char(ch @ ('1' | 'm' | 'c' | 'r' | 'q')) => {
            activate_menu_item(app, ch.encode_utf8(&mut [0; 4]));
        }
        KeyCode::Up | KeyCode::Char('k') => app.menu.prev(),
        KeyCode::Down | KeyCode::Char('j') => app.menu.next(),
        KeyCode::Enter => {
            let selected = app.menu.selected_key().to_string();
            activate_menu_item(app, &selected);
        }
        _ => {}
    }
}

fn handle_drill_key(app: &mut App, key: KeyEvent) {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Esc => {
            app.go_to_menu();
            return;
        }
        KeyCode::Char('n') if ctrl => {
            app.skip_question();
            return;
        }
        KeyCode::Char('p') if ctrl => {
            app.replay_audio();
            return;
        }
        KeyCode::Char('r') if ctrl => {
            app.request_recording();
            return;
        }
        KeyCode::Tab => {
            app.session.toggle_hint();
            return;
        }
        _ => {}
    }

    let Some(mode) = app.session.question().map(|q| q.mode) else {
        // No question: the bank is empty or unusable.
        if key.code == KeyCode::Enter {
            app.reload_bank();
            app.next_question();
        }
        return;
    };

    if app.session.is_answered() {
        if matches!(key.code, KeyCode::Enter | KeyCode::Char(' ')) {
            app.next_question();
        }
        return;
    }

    if mode == QuizMode::Choice {
        if let KeyCode::Char(ch) = key.code
            && let Some(digit) = ch.to_digit(10)
            && digit >= 1
        {
            app.choose(digit as usize - 1);
        }
        return;
    }

    match app.input.handle(key) {
        InputResult::Submit => app.submit_input(),
        InputResult::Cancel => app.go_to_menu(),
        InputResult::Continue => {}
    }
}

fn handle_mistakes_key(app: &mut App, key: KeyEvent) {
    let len = app.ledger.len();

    // Confirmation dialog takes priority
    if app.mistakes.confirm_delete {
        match key.code {
            KeyCode::Char('y') => {
                app.remove_selected_mistakes();
            }
            KeyCode::Char('n') | KeyCode::Esc => app.mistakes.confirm_delete = false,
            _ => {}
        }
        return;
    }

    match key.code {
        KeyCode::Esc | KeyCode::Char('q') => app.go_to_menu(),
        KeyCode::Down | KeyCode::Char('j') => app.mistakes.move_down(len),
        KeyCode::Up | KeyCode::Char('k') => app.mistakes.move_up(),
        KeyCode::Char(' ') => app.mistakes.toggle(len),
        KeyCode::Char('a') => app.mistakes.toggle_all(len),
        KeyCode::Char('x') | KeyCode::Char('d') | KeyCode::Delete => {
            if len > 0 {
                app.mistakes.confirm_delete = true;
            }
        }
        _ => {}
    }
}

fn handle_settings_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.save_settings();
            app.go_to_menu();
        }
        KeyCode::Up | KeyCode::Char('k') => {
            app.settings_selected = app.settings_selected.saturating_sub(1);
        }
        KeyCode::Down | KeyCode::Char('j') => {
            if app.settings_selected + 1 < SETTINGS_FIELDS.len() {
                app.settings_selected += 1;
            }
        }
        KeyCode::Enter | KeyCode::Right | KeyCode::Char('l') | KeyCode::Char(' ') => {
            app.settings_cycle_forward();
        }
        KeyCode::Left | KeyCode::Char('h') => app.settings_cycle_backward(),
        _ => {}
    }
}

fn render(frame: &mut ratatui::Frame, app: &App) {
    let area = frame.area();
    let colors = &app.theme.colors;

    let bg = Block::default().style(Style::default().bg(colors.bg()));
    frame.render_widget(bg, area);

    match app.screen {
        AppScreen::Menu => render_menu(frame, app),
        AppScreen::Drill => render_drill(frame, app),
        AppScreen::Mistakes => render_mistakes(frame, app),
        AppScreen::Settings => render_settings(frame, app),
    }
}

fn header_line<'a>(title: &'a str, info: String, app: &App) -> Paragraph<'a> {
    let colors = &app.theme.colors;
    Paragraph::new(Line::from(vec![
        Span::styled(
            title,
            Style::default()
                .fg(colors.header_fg())
                .bg(colors.header_bg())
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            info,
            Style::default()
                .fg(colors.text_pending())
                .bg(colors.header_bg()),
        ),
    ]))
    .style(Style::default().bg(colors.header_bg()))
}

fn footer_hints<'a>(hints: &[&str], width: u16, app: &App) -> Paragraph<'a> {
    let colors = &app.theme.colors;
    let lines: Vec<Line> = pack_hint_lines(hints, width as usize)
        .into_iter()
        .map(|l| Line::from(Span::styled(l, Style::default().fg(colors.text_pending()))))
        .collect();
    Paragraph::new(lines)
}

fn render_menu(frame: &mut ratatui::Frame, app: &App) {
    let area = frame.area();

    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(area);

    let tally = app.session.tally();
    let header_info = if tally.answered() > 0 {
        format!(
            " {} answered | {:.0}% correct | {} to review",
            tally.answered(),
            tally.accuracy(),
            app.ledger.len()
        )
    } else {
        format!(" {} to review", app.ledger.len())
    };
    frame.render_widget(header_line(" phrasedrill ", header_info, app), layout[0]);

    let menu_area = ui::layout::centered_rect(50, 80, layout[1]);
    frame.render_widget(&app.menu, menu_area);

    frame.render_widget(
        footer_hints(
            &["[1] Start", "[m] Mistakes", "[c] Settings", "[r] Reload", "[q] Quit"],
            layout[2].width,
            app,
        ),
        layout[2],
    );
}

fn render_drill(frame: &mut ratatui::Frame, app: &App) {
    let area = frame.area();
    let colors = &app.theme.colors;
    let app_layout = AppLayout::new(area);
    let question = app.session.question();

    let mode_name = question.map(|q| q.mode.label()).unwrap_or("Drill");
    let header_info = if app_layout.tier.show_sidebar() {
        question
            .filter(|q| q.is_review)
            .map(|_| " | reviewing a past mistake".to_string())
            .unwrap_or_default()
    } else {
        let tally = app.session.tally();
        format!(
            " | {}/{} correct | {} to review",
            tally.correct,
            tally.answered(),
            app.ledger.len()
        )
    };
    frame.render_widget(
        header_line(&format!(" {mode_name} "), header_info, app),
        app_layout.header,
    );

    match question {
        None => {
            let message = app
                .drill_error
                .clone()
                .unwrap_or_else(|| "No question loaded.".to_string());
            let block = Block::bordered()
                .title(" Drill ")
                .border_style(Style::default().fg(colors.error()))
                .style(Style::default().bg(colors.bg()));
            Paragraph::new(vec![
                Line::from(""),
                Line::from(Span::styled(message, Style::default().fg(colors.error()))),
                Line::from(""),
                Line::from(Span::styled(
                    "Fix the phrase bank, then press Enter to reload.",
                    Style::default().fg(colors.text_pending()),
                )),
            ])
            .wrap(Wrap { trim: false })
            .block(block)
            .render(app_layout.main, frame.buffer_mut());
        }
        Some(question) => {
            let feedback = app.session.feedback();
            let constraints = if feedback.is_some() {
                vec![Constraint::Min(8), Constraint::Min(9)]
            } else {
                vec![Constraint::Min(8)]
            };
            let main_layout = Layout::default()
                .direction(Direction::Vertical)
                .constraints(constraints)
                .split(app_layout.main);

            let panel = QuestionPanel::new(question, &app.session, &app.input, app.theme)
                .recording(app.recording);
            frame.render_widget(panel, main_layout[0]);

            if let Some(outcome) = feedback {
                let panel =
                    FeedbackPanel::new(outcome, app.session.feedback_audio(), app.theme);
                frame.render_widget(panel, main_layout[1]);
            }
        }
    }

    if let Some(sidebar_area) = app_layout.sidebar {
        let modes = app
            .config
            .enabled_modes
            .iter()
            .filter(|m| app.bank.available_modes().contains(m))
            .map(|m| m.label())
            .collect();
        let sidebar = StatsSidebar::new(
            app.session.tally(),
            app.ledger.len(),
            app.bank.len(),
            modes,
            app.theme,
        );
        frame.render_widget(sidebar, sidebar_area);
    }

    let hints: Vec<&str> = match question {
        None => vec!["[Enter] Reload", "[Esc] Menu"],
        Some(_) if app.session.is_answered() => {
            vec!["[Enter] Next", "[Ctrl+P] Replay", "[Esc] Menu"]
        }
        Some(q) if q.mode == QuizMode::Choice => {
            vec!["[1-4] Choose", "[Ctrl+P] Replay", "[Ctrl+N] Skip", "[Esc] Menu"]
        }
        Some(q) if q.mode == QuizMode::Speaking => vec![
            "[Ctrl+R] Record",
            "[Enter] Submit typed",
            "[Tab] Hint",
            "[Ctrl+N] Skip",
            "[Esc] Menu",
        ],
        Some(_) => vec![
            "[Enter] Submit",
            "[Tab] Hint",
            "[Ctrl+P] Replay",
            "[Ctrl+N] Skip",
            "[Esc] Menu",
        ],
    };
    frame.render_widget(
        footer_hints(&hints, app_layout.footer.width, app),
        app_layout.footer,
    );
}

fn render_mistakes(frame: &mut ratatui::Frame, app: &App) {
    let area = frame.area();
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(area);

    let centered = ui::layout::centered_rect(70, 90, layout[0]);
    let list = MistakeList::new(app.ledger.keys(), &app.bank, &app.mistakes, app.theme);
    frame.render_widget(list, centered);

    frame.render_widget(
        footer_hints(
            &[
                "[j/k] Move",
                "[Space] Select",
                "[a] All",
                "[x] Remove",
                "[Esc] Back",
            ],
            layout[1].width,
            app,
        ),
        layout[1],
    );
}

fn settings_label(field: SettingsField) -> String {
    match field {
        SettingsField::ReviewRate => "Review rate".to_string(),
        SettingsField::Mode(mode) => format!("{} questions", mode.label()),
        SettingsField::Speech => "Speech audio".to_string(),
        SettingsField::Theme => "Theme".to_string(),
    }
}

fn render_settings(frame: &mut ratatui::Frame, app: &App) {
    let area = frame.area();
    let colors = &app.theme.colors;

    let centered = ui::layout::centered_rect(60, 80, area);

    let block = Block::bordered()
        .title(" Settings ")
        .border_style(Style::default().fg(colors.accent()))
        .style(Style::default().bg(colors.bg()));
    let inner = block.inner(centered);
    block.render(centered, frame.buffer_mut());

    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),
            Constraint::Min(0),
            Constraint::Length(2),
        ])
        .split(inner);

    let header = Paragraph::new(Line::from(Span::styled(
        "  Use arrows to navigate, Enter/Right to change, ESC to save & exit",
        Style::default().fg(colors.text_pending()),
    )));
    header.render(layout[0], frame.buffer_mut());

    let lines: Vec<Line> = SETTINGS_FIELDS
        .iter()
        .enumerate()
        .map(|(i, field)| {
            let is_selected = i == app.settings_selected;
            let indicator = if is_selected { " > " } else { "   " };
            let label_style = Style::default()
                .fg(if is_selected {
                    colors.accent()
                } else {
                    colors.fg()
                })
                .add_modifier(if is_selected {
                    Modifier::BOLD
                } else {
                    Modifier::empty()
                });
            let value_style = Style::default().fg(if is_selected {
                colors.focused_key()
            } else {
                colors.text_pending()
            });
            Line::from(vec![
                Span::styled(format!("{indicator}{:<24}", settings_label(*field)), label_style),
                Span::styled(format!("< {} >", app.settings_value(*field)), value_style),
            ])
        })
        .collect();
    Paragraph::new(lines).render(layout[1], frame.buffer_mut());

    let footer = Paragraph::new(Line::from(Span::styled(
        "  [ESC] Save & back  [Enter/arrows] Change value",
        Style::default().fg(colors.accent()),
    )));
    footer.render(layout[2], frame.buffer_mut());
}
