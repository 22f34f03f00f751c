/*
Small borderless window showing the output of a command, rerun on a period or on click.

Pieces:
    supervisor: one child at a time, stdout on a pipe, SIGTERM to stop it
    text_stream: bytes -> frames, a line holding only a form feed commits early
    tokenizer + layout: frame -> words with rects -> window size
    geometry: where the window goes on the screen
    state: all of the above glued together, no I/O of its own
    terminal: the screen, drawn on the alternate screen one cell per pixel
    event_loop: a single select! over child status, timer, output, input and signals

Restart flow:
    Running -> (exit + end of output) -> Idle -> restart per policy
    A click while live terminates and queues exactly one restart with the clicked word.
    A timer firing while live waits for the reap.
*/
pub mod config;
pub mod display;
pub mod event_loop;
pub mod geometry;
pub mod layout;
pub mod restart;
pub mod state;
pub mod supervisor;
pub mod terminal;
pub mod text_buffer;
pub mod text_stream;
pub mod tokenizer;
mod vte_actions;

pub use config::{Cli, Config};
pub use state::{Settings, State};
pub use supervisor::Supervisor;
