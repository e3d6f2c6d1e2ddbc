pub mod app;
pub mod input;
pub mod ui;

use anyhow::Result;
use ratatui::{backend::CrosstermBackend, prelude::*};
use std::io::{self, Stdout};
use std::time::Duration;

use crate::runtime::{ControlCommand, SharedStatus};
use app::App;
use input::{map_key, Action};

/// Run the terminal UI until the user quits. Sends control commands to the
/// frame runtime; on quit the runtime is shut down as well.
pub fn start(status: SharedStatus, control_tx: flume::Sender<ControlCommand>) -> Result<()> {
    log::info!("[TUI] marionette TUI starting...");

    let mut stdout = io::stdout();
    crossterm::terminal::enable_raw_mode()?;
    crossterm::execute!(stdout, crossterm::terminal::EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(&mut stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, App::new(status), &control_tx);

    let mut stdout = io::stdout();
    crossterm::execute!(stdout, crossterm::terminal::LeaveAlternateScreen)?;
    crossterm::terminal::disable_raw_mode()?;

    let _ = control_tx.send(ControlCommand::Shutdown);
    res
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<&mut Stdout>>,
    mut app: App,
    control_tx: &flume::Sender<ControlCommand>,
) -> Result<()> {
    loop {
        terminal.draw(|f| ui::render_ui(f, &app))?;

        if !crossterm::event::poll(Duration::from_millis(200))? {
            continue;
        }
        let event = match crossterm::event::read() {
            Ok(event) => event,
            Err(err) => {
                app.set_error(format!("input read error: {err}"));
                continue;
            }
        };

        if let crossterm::event::Event::Key(key) = event {
            // Only react to the initial press so one physical key press
            // maps to a single action.
            if key.kind != crossterm::event::KeyEventKind::Press {
                continue;
            }

            match map_key(key.code) {
                Action::Quit => break,
                Action::TogglePause => {
                    let command = if app.paused() {
                        ControlCommand::Resume
                    } else {
                        ControlCommand::Pause
                    };
                    if let Err(err) = control_tx.send(command) {
                        app.set_error(format!("runtime unreachable: {err}"));
                    }
                }
                Action::DeleteHead => {
                    if let Err(err) = control_tx.send(ControlCommand::DeleteHead) {
                        app.set_error(format!("runtime unreachable: {err}"));
                    }
                }
                Action::ClearError => app.clear_error(),
                Action::None => {}
            }
        }
    }

    terminal.clear()?;
    Ok(())
}
