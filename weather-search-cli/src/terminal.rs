//! Search screen: raw-mode keystrokes in, one of four state views out.

use std::{
    io::{self, Stdout, Write},
    sync::Arc,
    thread,
    time::Duration,
};

use anyhow::Context;
use crossterm::{
    cursor::MoveTo,
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute, queue,
    style::Print,
    terminal::{self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen},
};
use tokio::sync::mpsc;
use tracing::debug;
use weather_search_core::{
    DisplayView, LocationStore, SearchOrchestrator, SearchSettings, SearchState, WeatherLookup,
    WeatherSnapshot,
};

const SEARCH_PROMPT: &str = "Search Location: ";
const NO_CITY_TITLE: &str = "No City Selected";
const NO_CITY_DESCRIPTION: &str = "Please Search For A City";
const ERROR_TITLE: &str = "Uh Oh!";
const HELP_LINE: &str = "Enter: search now   Ctrl-U: clear   Esc: quit";
const SPINNER: [char; 4] = ['|', '/', '-', '\\'];

enum UiEvent {
    Key(KeyEvent),
    State(SearchState),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KeyAction {
    Edited,
    Submit,
    Quit,
    Ignore,
}

/// What the screen currently shows.
#[derive(Debug, Default)]
struct Screen {
    input: String,
    state: SearchState,
    spinner_frame: usize,
}

/// Restores the terminal even if the search loop bails out early.
struct RawModeGuard;

impl RawModeGuard {
    fn enter(out: &mut Stdout) -> anyhow::Result<Self> {
        terminal::enable_raw_mode().context("Failed to enable raw terminal mode")?;
        execute!(out, EnterAlternateScreen).context("Failed to open alternate screen")?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        let _ = terminal::disable_raw_mode();
    }
}

pub async fn run(
    lookup: Arc<dyn WeatherLookup>,
    store: Arc<dyn LocationStore>,
    settings: SearchSettings,
) -> anyhow::Result<()> {
    let (ui_tx, mut ui_rx) = mpsc::unbounded_channel();

    let state_tx = ui_tx.clone();
    let handle = SearchOrchestrator::new(lookup, store, settings)
        .observe(move |state| {
            let _ = state_tx.send(UiEvent::State(state.clone()));
        })
        .spawn();

    let mut out = io::stdout();
    let _guard = RawModeGuard::enter(&mut out)?;
    spawn_key_reader(ui_tx);

    let mut screen = Screen { state: handle.state().await?, ..Default::default() };
    let mut spinner = tokio::time::interval(Duration::from_millis(120));
    draw(&mut out, &screen)?;

    loop {
        tokio::select! {
            event = ui_rx.recv() => match event {
                Some(UiEvent::Key(key)) => match apply_key(&mut screen.input, key) {
                    KeyAction::Edited => handle.text_changed(screen.input.clone())?,
                    KeyAction::Submit => handle.submit()?,
                    KeyAction::Quit => break,
                    KeyAction::Ignore => continue,
                },
                Some(UiEvent::State(state)) => screen.state = state,
                None => break,
            },
            _ = spinner.tick() => {
                if !screen.state.is_loading {
                    continue;
                }
                screen.spinner_frame = screen.spinner_frame.wrapping_add(1);
            }
        }
        draw(&mut out, &screen)?;
    }

    handle.shutdown().await?;
    Ok(())
}

/// Forwards key presses from a blocking reader thread until the screen closes.
fn spawn_key_reader(tx: mpsc::UnboundedSender<UiEvent>) {
    thread::spawn(move || {
        while !tx.is_closed() {
            match event::poll(Duration::from_millis(100)) {
                Ok(true) => match event::read() {
                    Ok(Event::Key(key)) => {
                        if tx.send(UiEvent::Key(key)).is_err() {
                            break;
                        }
                    }
                    Ok(_) => {}
                    Err(e) => {
                        debug!(error = %e, "terminal input closed");
                        break;
                    }
                },
                Ok(false) => {}
                Err(e) => {
                    debug!(error = %e, "terminal input closed");
                    break;
                }
            }
        }
    });
}

fn apply_key(input: &mut String, key: KeyEvent) -> KeyAction {
    if key.kind == KeyEventKind::Release {
        return KeyAction::Ignore;
    }

    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Char('c') if ctrl => KeyAction::Quit,
        KeyCode::Char('u') if ctrl => {
            if input.is_empty() {
                return KeyAction::Ignore;
            }
            input.clear();
            KeyAction::Edited
        }
        KeyCode::Char(_) if ctrl => KeyAction::Ignore,
        KeyCode::Char(c) => {
            input.push(c);
            KeyAction::Edited
        }
        KeyCode::Backspace => match input.pop() {
            Some(_) => KeyAction::Edited,
            None => KeyAction::Ignore,
        },
        KeyCode::Enter => KeyAction::Submit,
        KeyCode::Esc => KeyAction::Quit,
        _ => KeyAction::Ignore,
    }
}

fn render_lines(screen: &Screen) -> Vec<String> {
    let mut lines = vec![format!("{SEARCH_PROMPT}{}", screen.input), String::new()];

    match screen.state.display() {
        DisplayView::Loading => {
            let frame = SPINNER[screen.spinner_frame % SPINNER.len()];
            lines.push(format!("  {frame} Loading weather..."));
        }
        DisplayView::Detail(weather) => lines.extend(detail_lines(weather)),
        DisplayView::CompactResult(weather) => lines.extend(compact_lines(weather)),
        DisplayView::Error(message) => {
            lines.push(format!("  {ERROR_TITLE}"));
            lines.push(format!("  {message}"));
        }
        DisplayView::Empty => {
            lines.push(format!("  {NO_CITY_TITLE}"));
            lines.push(format!("  {NO_CITY_DESCRIPTION}"));
        }
    }

    lines.push(String::new());
    lines.push(HELP_LINE.to_string());
    lines
}

fn detail_lines(weather: &WeatherSnapshot) -> Vec<String> {
    let mut lines = vec![
        format!("  {}", weather.place),
        format!("  {}°", weather.temperature),
        String::new(),
        format!(
            "  Humidity {}%    UV {}    Feels Like {}°",
            weather.humidity_percent, weather.uv_index, weather.feels_like
        ),
        format!("  {}", weather.icon_url),
    ];
    if let Some(observed_at) = weather.observed_at {
        let local = observed_at.with_timezone(&chrono::Local);
        lines.push(format!("  Updated {}", local.format("%H:%M")));
    }
    lines
}

fn compact_lines(weather: &WeatherSnapshot) -> Vec<String> {
    vec![
        format!("  {}    {}°", weather.place, weather.temperature),
        format!("  {}", weather.icon_url),
    ]
}

fn draw(out: &mut impl Write, screen: &Screen) -> anyhow::Result<()> {
    queue!(out, Clear(ClearType::All))?;
    for (row, line) in render_lines(screen).iter().enumerate() {
        let row = u16::try_from(row).unwrap_or(u16::MAX);
        queue!(out, MoveTo(0, row), Print(line))?;
    }

    let cursor_col = SEARCH_PROMPT.chars().count() + screen.input.chars().count();
    queue!(out, MoveTo(u16::try_from(cursor_col).unwrap_or(u16::MAX), 0))?;
    out.flush().context("Failed to draw search screen")?;
    Ok(())
}
