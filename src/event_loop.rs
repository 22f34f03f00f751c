use crate::config::Config;
use crate::state::{Notice, State};
use crate::supervisor::Supervisor;
use crate::terminal::Terminal;
use anyhow::{Context, Result};
use crossterm::event::{
    Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseEvent, MouseEventKind,
};
use futures_util::StreamExt;
use log::{debug, info};
use std::io::{ErrorKind, Write};
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::process::ChildStdout;
use tokio::signal::unix::{signal, SignalKind};

const READ_CHUNK: usize = 4096;

/// Runs until the user quits or the process is asked to terminate.
///
/// The signal streams are tokio's self-pipe: handlers only record that a signal arrived,
/// and everything else happens here between waits.
pub async fn run(config: Config) -> Result<()> {
    let mut child_status = signal(SignalKind::child()).context("failed to watch SIGCHLD")?;
    let mut terminate = signal(SignalKind::terminate()).context("failed to watch SIGTERM")?;
    let mut interrupt = signal(SignalKind::interrupt()).context("failed to watch SIGINT")?;

    let Config {
        settings,
        overlay,
        font,
        command,
    } = config;
    let mut terminal = Terminal::open()?;
    if let Some(font) = &font {
        terminal.set_font(font);
    }
    let mut events = crossterm::event::EventStream::new();
    let mut state = State::new(settings, Supervisor::new(command));
    state.start()?;

    let mut chunk = vec![0; READ_CHUNK];
    let mut inside = false;
    loop {
        state.flush(&mut terminal)?;

        let timer = state.timer_remaining();
        let output = state.process_mut().output_mut();
        tokio::select! {
            _ = child_status.recv() => state.on_notice(Notice::ChildStatus)?,
            _ = sleep(timer) => state.on_notice(Notice::Timer)?,
            read = read_output(output, &mut chunk) => match read {
                Ok(0) => state.on_output_eof()?,
                Ok(n) => state.on_output(&chunk[..n]),
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) => return Err(e).context("failed to read command output"),
            },
            event = events.next() => {
                let event = match event {
                    Some(event) => event.context("failed to read terminal events")?,
                    None => break,
                };
                match handle_event(event, &mut state, &mut terminal, overlay, &mut inside)? {
                    Flow::Continue => {}
                    Flow::Quit => break,
                }
            }
            _ = terminate.recv() => break,
            _ = interrupt.recv() => break,
        }
    }

    info!("shutting down");
    state.shutdown()?;
    Ok(())
}

enum Flow {
    Continue,
    Quit,
}

fn handle_event<W: Write>(
    event: Event,
    state: &mut State<Supervisor>,
    terminal: &mut Terminal<W>,
    overlay: bool,
    inside: &mut bool,
) -> Result<Flow> {
    match event {
        Event::Key(key) if is_quit(&key) => return Ok(Flow::Quit),
        Event::Resize(columns, rows) => {
            debug!("screen resized to {columns}x{rows}");
            terminal.set_screen_size(columns, rows)?;
            state.on_screen_resize();
        }
        Event::FocusGained => state.on_expose(),
        Event::Mouse(mouse) if !overlay => handle_mouse(mouse, state, terminal, inside)?,
        _ => {}
    }
    Ok(Flow::Continue)
}

fn handle_mouse<W: Write>(
    mouse: MouseEvent,
    state: &mut State<Supervisor>,
    terminal: &Terminal<W>,
    inside: &mut bool,
) -> Result<()> {
    let point = terminal.window_point(mouse.column, mouse.row);
    match (mouse.kind, point) {
        (MouseEventKind::Down(_), Some((x, y))) => state.on_click(x, y)?,
        (MouseEventKind::Moved | MouseEventKind::Drag(_), Some((x, y))) => {
            *inside = true;
            state.on_pointer_move(x, y);
        }
        (MouseEventKind::Moved | MouseEventKind::Drag(_), None) if *inside => {
            *inside = false;
            state.on_pointer_leave();
        }
        _ => {}
    }
    Ok(())
}

fn is_quit(key: &KeyEvent) -> bool {
    if key.kind == KeyEventKind::Release {
        return false;
    }
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => true,
        KeyCode::Char('c') => key.modifiers.contains(KeyModifiers::CONTROL),
        _ => false,
    }
}

async fn read_output(output: Option<&mut ChildStdout>, buf: &mut [u8]) -> std::io::Result<usize> {
    match output {
        Some(output) => output.read(buf).await,
        None => std::future::pending().await,
    }
}

async fn sleep(duration: Option<Duration>) {
    match duration {
        Some(duration) => tokio::time::sleep(duration).await,
        None => std::future::pending().await,
    }
}
