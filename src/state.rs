/*
Everything the event loop knows lives here, with no I/O of its own.

    Child control goes through ProcessControl.
    Drawing and window management go through Renderer + Display, once per loop
    iteration in flush().
    Handlers only record what changed (relayout, redraw, reposition, dirty);
    flush() turns that into the fewest display calls.
*/
use crate::display::{ColorScheme, Display, Renderer};
use crate::geometry::Placement;
use crate::layout::{layout, word_at, Alignment, Rect, WindowFrame};
use crate::restart::{RestartPolicy, RestartTimer};
use crate::supervisor::ProcessControl;
use crate::text_buffer::TextBuffer;
use crate::text_stream::TextStream;
use crate::tokenizer::{tokenize, Word};
use anyhow::Result;
use log::{debug, info, warn};
use regex::Regex;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Settings {
    pub alignment: Alignment,
    pub border: u32,
    pub policy: RestartPolicy,
    pub clickable: Option<Regex>,
    pub colors: ColorScheme,
    pub placement: Placement,
    pub on_top: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            alignment: Alignment::Left,
            border: 0,
            policy: RestartPolicy::Periodic(Duration::from_secs(5)),
            clickable: None,
            colors: ColorScheme::default(),
            placement: Placement::default(),
            on_top: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No child and nothing pending.
    Idle,
    Starting,
    Running,
    /// Exit or end of output seen, waiting for the other.
    Reaping,
}

/// Deferred notifications from signal context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    Timer,
    ChildStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Restart {
    Timer,
    Click(String),
}

pub struct State<P: ProcessControl> {
    settings: Settings,
    process: P,
    phase: Phase,
    child_live: bool,
    output_open: bool,
    terminating: bool,
    pending: Option<Restart>,
    timer: RestartTimer,

    stream: TextStream,
    text: TextBuffer,
    words: Vec<Word>,
    window: WindowFrame,
    mapped: bool,
    hovered: Option<usize>,
    pointer: Option<(i32, i32)>,

    relayout: bool,
    redraw: bool,
    reposition: bool,
    dirty: bool,
}

impl<P: ProcessControl> State<P> {
    pub fn new(settings: Settings, process: P) -> Self {
        Self {
            settings,
            process,
            phase: Phase::Idle,
            child_live: false,
            output_open: false,
            terminating: false,
            pending: None,
            timer: RestartTimer::default(),
            stream: TextStream::new(),
            text: TextBuffer::new(),
            words: Vec::new(),
            window: WindowFrame::HIDDEN,
            mapped: false,
            hovered: None,
            pointer: None,
            relayout: false,
            redraw: false,
            reposition: false,
            dirty: false,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn process(&self) -> &P {
        &self.process
    }

    pub fn process_mut(&mut self) -> &mut P {
        &mut self.process
    }

    /// Text of the frame on screen.
    pub fn text(&self) -> &str {
        self.text.as_str()
    }

    pub fn words(&self) -> &[Word] {
        &self.words
    }

    pub fn window(&self) -> WindowFrame {
        self.window
    }

    pub fn hovered(&self) -> Option<&Word> {
        self.hovered.and_then(|i| self.words.get(i))
    }

    /// How long the event loop may sleep before the restart timer is due.
    pub fn timer_remaining(&self) -> Option<Duration> {
        self.timer.remaining()
    }

    pub fn start(&mut self) -> Result<()> {
        self.restart(None)
    }

    pub fn on_notice(&mut self, notice: Notice) -> Result<()> {
        match notice {
            Notice::Timer => {
                if !self.timer.expire() {
                    return Ok(());
                }
                if self.phase == Phase::Idle {
                    return self.restart(None);
                }
                debug!("timer expired while the command is still live, deferring restart");
                self.pending.get_or_insert(Restart::Timer);
                Ok(())
            }
            Notice::ChildStatus => {
                if self.try_reap()? {
                    self.settle()?;
                }
                Ok(())
            }
        }
    }

    pub fn on_output(&mut self, bytes: &[u8]) {
        if let Some(frame) = self.stream.feed(bytes) {
            debug!("sentinel committed a {} byte frame", frame.len());
            self.commit(frame);
        }
    }

    pub fn on_output_eof(&mut self) -> Result<()> {
        if let Some(frame) = self.stream.finish() {
            self.commit(frame);
        }
        self.output_open = false;
        self.process.close_output();
        self.try_reap()?;
        self.settle()
    }

    /// Pointer press at a window-relative position.
    pub fn on_click(&mut self, x: i32, y: i32) -> Result<()> {
        if self.terminating {
            debug!("click ignored, restart already pending");
            return Ok(());
        }
        self.timer.cancel();
        let selected = word_at(&self.words, x, y)
            .map(|i| self.words[i].text(self.text.as_str()).to_string())
            .unwrap_or_default();
        info!("clicked, selected {selected:?}");

        if self.phase == Phase::Idle {
            return self.restart(Some(selected));
        }
        self.pending = Some(Restart::Click(selected));
        self.terminating = true;
        if self.child_live {
            self.process.terminate()?;
        } else {
            warn!("command exited but its output is still open, restart waits for it to close");
        }
        Ok(())
    }

    pub fn on_pointer_move(&mut self, x: i32, y: i32) {
        self.pointer = Some((x, y));
        self.set_hovered(word_at(&self.words, x, y));
    }

    pub fn on_pointer_leave(&mut self) {
        self.pointer = None;
        self.set_hovered(None);
    }

    /// The window contents were lost and must be copied again.
    pub fn on_expose(&mut self) {
        self.dirty = true;
    }

    /// The screen changed size, so the window has to be placed again.
    pub fn on_screen_resize(&mut self) {
        self.reposition = true;
        self.dirty = true;
    }

    /// Stops the child for good. No restart follows.
    pub fn shutdown(&mut self) -> Result<()> {
        self.timer.cancel();
        self.pending = None;
        if self.child_live {
            self.process.terminate()?;
        }
        Ok(())
    }

    /// Applies everything that changed since the last call: relayout, redraw, then at
    /// most one round of map, move, restack and copy.
    pub fn flush<B: Renderer + Display>(&mut self, backend: &mut B) -> Result<()> {
        if std::mem::take(&mut self.relayout) {
            let previous = self.window;
            let next = layout(
                self.text.as_str(),
                &mut self.words,
                &*backend,
                self.settings.alignment,
                self.settings.border,
            );
            if !next.hidden && (previous.hidden || next.size() != previous.size()) {
                debug!("allocating {}x{} drawable", next.width, next.height);
                backend.allocate(next.width, next.height)?;
                self.reposition = true;
            }
            self.window = next;
            self.hovered = self.pointer.and_then(|(x, y)| word_at(&self.words, x, y));
            self.redraw = true;
        }

        if self.window.hidden {
            if self.mapped {
                backend.unmap()?;
                self.mapped = false;
            }
            self.redraw = false;
            self.dirty = false;
            return Ok(());
        }

        if std::mem::take(&mut self.redraw) {
            self.draw(backend);
            self.dirty = true;
        }
        let showing = !self.mapped;
        if showing {
            self.reposition = true;
            self.dirty = true;
        }
        if !std::mem::take(&mut self.dirty) {
            return Ok(());
        }

        let (width, height) = self.window.size();
        if std::mem::take(&mut self.reposition) {
            let (x, y) = self
                .settings
                .placement
                .origin(backend.screen_size(), self.window.size());
            backend.move_resize(x, y, width, height)?;
        }
        if showing {
            backend.map()?;
            self.mapped = true;
        }
        backend.restack(self.settings.on_top)?;
        backend.present(width, height)
    }

    fn restart(&mut self, selected: Option<String>) -> Result<()> {
        self.phase = Phase::Starting;
        self.stream.reset();
        self.process.spawn(selected.as_deref())?;
        self.child_live = true;
        self.output_open = true;
        self.terminating = false;
        self.phase = Phase::Running;
        if let Some(period) = self.settings.policy.period() {
            self.timer.arm(period);
        }
        Ok(())
    }

    /// Returns whether the child was reaped by this call.
    fn try_reap(&mut self) -> Result<bool> {
        if !self.child_live {
            return Ok(false);
        }
        let reaped = self.process.reap()?.is_some();
        if reaped {
            self.child_live = false;
        }
        Ok(reaped)
    }

    fn settle(&mut self) -> Result<()> {
        if self.child_live || self.output_open {
            self.phase = Phase::Reaping;
            return Ok(());
        }
        self.phase = Phase::Idle;
        self.terminating = false;
        match self.pending.take() {
            Some(Restart::Click(selected)) => self.restart(Some(selected)),
            Some(Restart::Timer) => self.restart(None),
            None if self.settings.policy == RestartPolicy::Instant => self.restart(None),
            None => Ok(()),
        }
    }

    fn commit(&mut self, text: TextBuffer) {
        self.words = tokenize(text.as_str(), self.settings.clickable.as_ref());
        self.text = text;
        self.relayout = true;
    }

    fn set_hovered(&mut self, hovered: Option<usize>) {
        if hovered != self.hovered {
            self.hovered = hovered;
            self.redraw = true;
        }
    }

    fn draw<R: Renderer>(&self, renderer: &mut R) {
        let colors = self.settings.colors;
        let (width, height) = self.window.size();
        renderer.fill_rect(Rect::new(0, 0, width, height), colors.normal.bg);
        for (i, word) in self.words.iter().enumerate() {
            let pair = if self.hovered == Some(i) {
                renderer.fill_rect(word.rect, colors.hover.bg);
                colors.hover
            } else {
                colors.normal
            };
            renderer.draw_text(word.rect.x, word.rect.y, word.text(self.text.as_str()), pair.fg);
        }
    }
}
