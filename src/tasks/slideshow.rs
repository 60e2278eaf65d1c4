use std::time::Duration;

use anyhow::Result;
use futures::future::BoxFuture;
use futures::stream::{FuturesUnordered, StreamExt};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio::select;
use tokio::sync::mpsc::{Receiver, Sender};
use tokio::time::{Instant, sleep_until};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::config::{Configuration, Timing};
use crate::error::Error;
use crate::events::{ImageDescriptor, SlideshowCommand, SlideshowEvent, SlideshowId};
use crate::grid::{self, GridShape};
use crate::pattern::{self, Pattern, ResolvedPattern};
use crate::surface::RenderSurface;

/// Where the grid is within one cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No cycle in flight.
    Idle,
    /// Cells are being faded out one by one in pattern order.
    FadingOut,
    /// Every fade has been issued; waiting one transition for the last one to
    /// finish before the image is swapped.
    FadeSettling,
    /// Cells show the new image; waiting for the settle delay before the
    /// backdrop is repainted with the following one.
    FadingIn,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleState {
    /// Image currently painted on the cells.
    pub current: usize,
    /// A cycle is in flight.
    pub playing: bool,
    /// No new cycle may start until resumed.
    pub paused: bool,
    /// Completed cycles.
    pub cycles: u64,
    /// Cycles completed on the current image catalog; drives pattern
    /// alternation.
    pub alternation: u64,
}

#[derive(Debug, Clone, Default)]
pub struct SlideshowOptions {
    pub shape: GridShape,
    pub timing: Timing,
    pub pattern: Pattern,
    /// Seed for the random pattern; drawn from the OS when absent.
    pub seed: Option<u64>,
}

impl From<&Configuration> for SlideshowOptions {
    fn from(cfg: &Configuration) -> Self {
        Self {
            shape: cfg.grid,
            timing: cfg.timing,
            pattern: cfg.pattern,
            seed: cfg.seed,
        }
    }
}

/// Settings frozen when a cycle starts so setters cannot disturb it.
#[derive(Debug, Clone, Copy)]
struct CycleSnapshot {
    index: u64,
    alternation: u64,
    transition: Duration,
    settle: Duration,
}

#[derive(Debug, Clone, Copy)]
enum Stage {
    FadingOut,
    FadeSettling { at: Instant },
    FadingIn { at: Instant },
}

#[derive(Debug, Clone, Copy)]
struct Cycle {
    snapshot: CycleSnapshot,
    stage: Stage,
}

impl Cycle {
    fn deadline(&self) -> Option<Instant> {
        match self.stage {
            Stage::FadingOut => None,
            Stage::FadeSettling { at } | Stage::FadingIn { at } => Some(at),
        }
    }
}

enum Wake {
    CellFaded(usize),
    StageDue,
    CycleDue,
    Idle,
}

enum Input {
    Command(SlideshowCommand),
    CommandsClosed,
    Wake(Wake),
}

/// Drives a tiled slideshow: staggers per-cell fades by the reveal pattern,
/// swaps the image once every cell is transparent, and repeats after the
/// idle interval until paused.
///
/// All timers are polled by whoever awaits [`Slideshow::advance`] or
/// [`Slideshow::run`]; nothing runs in the background.
pub struct Slideshow<S> {
    id: SlideshowId,
    surface: S,
    shape: GridShape,
    item_height: f32,
    images: Vec<ImageDescriptor>,
    pattern: Pattern,
    timing: Timing,
    state: CycleState,
    cycle: Option<Cycle>,
    fades: FuturesUnordered<BoxFuture<'static, usize>>,
    next_start: Option<Instant>,
    events: Option<Sender<SlideshowEvent>>,
    rng: StdRng,
}

impl<S: RenderSurface> Slideshow<S> {
    /// Build the grid on `surface` and paint the first image. Does not start
    /// cycling; call [`Slideshow::start`].
    pub fn new(
        id: SlideshowId,
        mut surface: S,
        images: Vec<ImageDescriptor>,
        options: SlideshowOptions,
    ) -> Result<Self, Error> {
        let SlideshowOptions {
            shape,
            timing,
            pattern,
            seed,
        } = options;
        if images.is_empty() {
            return Err(Error::NoImages);
        }
        if shape.is_empty() {
            return Err(Error::InvalidGrid {
                rows: shape.rows,
                columns: shape.columns,
            });
        }
        let height = surface
            .container_height()
            .filter(|h| h.is_finite() && *h >= 0.0)
            .ok_or(Error::MissingContainer)?;

        surface.create_cells(id, shape)?;
        let layout = grid::cell_layout(shape);
        for cell in 0..shape.cells() {
            surface.set_cell_layout(cell, &layout);
        }

        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        let mut show = Self {
            id,
            surface,
            shape,
            item_height: grid::item_height(height, shape),
            images,
            pattern,
            timing,
            state: CycleState {
                current: 0,
                playing: false,
                paused: false,
                cycles: 0,
                alternation: 0,
            },
            cycle: None,
            fades: FuturesUnordered::new(),
            next_start: None,
            events: None,
            rng,
        };
        show.render_current();
        info!(
            slideshow = %id,
            rows = shape.rows,
            columns = shape.columns,
            images = show.images.len(),
            pattern = show.pattern.name(),
            "slideshow ready"
        );
        Ok(show)
    }

    /// Report cycle progress on `events`. Events are dropped if the receiver
    /// falls behind.
    pub fn with_events(mut self, events: Sender<SlideshowEvent>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn id(&self) -> SlideshowId {
        self.id
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn state(&self) -> CycleState {
        self.state
    }

    pub fn timing(&self) -> Timing {
        self.timing
    }

    pub fn pattern(&self) -> Pattern {
        self.pattern
    }

    pub fn images(&self) -> &[ImageDescriptor] {
        &self.images
    }

    pub fn current_image(&self) -> usize {
        self.state.current
    }

    /// Image the backdrop is pre-painted with: the one after `current`.
    pub fn next_image(&self) -> usize {
        (self.state.current + 1) % self.images.len()
    }

    pub fn phase(&self) -> Phase {
        match self.cycle.map(|c| c.stage) {
            None => Phase::Idle,
            Some(Stage::FadingOut) => Phase::FadingOut,
            Some(Stage::FadeSettling { .. }) => Phase::FadeSettling,
            Some(Stage::FadingIn { .. }) => Phase::FadingIn,
        }
    }

    /// Per-cell fades scheduled for the current cycle that have not fired yet.
    pub fn pending_fades(&self) -> usize {
        self.fades.len()
    }

    /// When the next cycle is due, if one is scheduled.
    pub fn next_start(&self) -> Option<Instant> {
        self.next_start
    }

    fn has_pending_timers(&self) -> bool {
        !self.fades.is_empty() || self.next_start.is_some() || self.cycle.is_some()
    }

    /// Schedule the next cycle one interval from now, unless paused. While a
    /// cycle is in flight this does nothing: its completion schedules the next
    /// one.
    pub fn start(&mut self) {
        if self.state.paused {
            debug!(slideshow = %self.id, "paused; next cycle withheld");
            return;
        }
        if self.state.playing {
            trace!(slideshow = %self.id, "cycle in flight; completion schedules the next");
            return;
        }
        let at = Instant::now() + self.timing.interval;
        if self.next_start.is_some_and(|pending| pending <= at) {
            return;
        }
        self.next_start = Some(at);
        debug!(
            slideshow = %self.id,
            interval_ms = self.timing.interval.as_millis() as u64,
            "next cycle scheduled"
        );
    }

    /// Withhold the next cycle. A cycle already in flight still completes.
    pub fn pause(&mut self) {
        if !self.state.paused {
            info!(slideshow = %self.id, playing = self.state.playing, "slideshow paused");
        }
        self.state.paused = true;
    }

    pub fn resume(&mut self) {
        if self.state.paused {
            info!(slideshow = %self.id, "slideshow resumed");
        }
        self.state.paused = false;
        self.start();
    }

    pub fn set_interval_time(&mut self, interval: Duration) {
        self.timing.interval = interval;
    }

    pub fn set_transition_time(&mut self, transition: Duration) {
        self.timing.transition = transition;
    }

    pub fn set_timeout_step(&mut self, step: Duration) {
        self.timing.step = step;
    }

    pub fn set_pattern(&mut self, pattern: Pattern) {
        self.pattern = pattern;
    }

    /// Replace the image catalog, repaint the grid from its first image and
    /// resume scheduling.
    pub fn set_background_images(&mut self, images: Vec<ImageDescriptor>) -> Result<(), Error> {
        if images.is_empty() {
            return Err(Error::NoImages);
        }
        self.images = images;
        self.state.current = 0;
        self.state.alternation = 0;
        self.render_current();
        info!(
            slideshow = %self.id,
            images = self.images.len(),
            "background images replaced"
        );
        self.start();
        Ok(())
    }

    pub fn apply(&mut self, command: SlideshowCommand) {
        trace!(slideshow = %self.id, ?command, "command");
        match command {
            SlideshowCommand::Pause => self.pause(),
            SlideshowCommand::Resume => self.resume(),
            SlideshowCommand::SetIntervalTime(interval) => self.set_interval_time(interval),
            SlideshowCommand::SetTransitionTime(transition) => {
                self.set_transition_time(transition)
            }
            SlideshowCommand::SetTimeoutStep(step) => self.set_timeout_step(step),
            SlideshowCommand::SetPattern(pattern) => self.set_pattern(pattern),
            SlideshowCommand::SetBackgroundImages(images) => {
                if let Err(err) = self.set_background_images(images) {
                    warn!(slideshow = %self.id, error = %err, "rejected background images");
                }
            }
        }
    }

    /// Begin fading the grid out. Returns `false` without doing anything if a
    /// cycle is already in flight.
    pub fn run_cycle(&mut self) -> bool {
        if self.state.playing {
            trace!(slideshow = %self.id, "cycle already in flight");
            return false;
        }
        self.state.playing = true;
        self.next_start = None;

        let snapshot = CycleSnapshot {
            index: self.state.cycles,
            alternation: self.state.alternation,
            transition: self.timing.transition,
            settle: self.timing.settle,
        };
        let step = self.timing.step;
        let resolved: ResolvedPattern = self.pattern.resolve(snapshot.alternation);
        let cells = self.shape.cells();
        let ranks = pattern::generate(cells, &resolved, self.shape, &mut self.rng);

        let started = Instant::now();
        for (cell, rank) in ranks.into_iter().enumerate() {
            let at = started + step.saturating_mul(rank);
            self.fades.push(Box::pin(async move {
                sleep_until(at).await;
                cell
            }));
        }
        self.cycle = Some(Cycle {
            snapshot,
            stage: Stage::FadingOut,
        });

        debug!(
            slideshow = %self.id,
            cycle = snapshot.index,
            current = self.state.current,
            pattern = ?resolved,
            "cycle started"
        );
        self.emit(SlideshowEvent::CycleStarted {
            cycle: snapshot.index,
            cells,
        });
        true
    }

    /// Wait for the earliest timer and act on it. Returns `false` when nothing
    /// is scheduled.
    pub async fn advance(&mut self) -> bool {
        match self.next_wake().await {
            Wake::Idle => false,
            wake => {
                self.handle(wake);
                true
            }
        }
    }

    /// Task loop: applies commands and drives timers until cancelled, or until
    /// the command channel closes with nothing left to do.
    pub async fn run(
        mut self,
        mut commands: Receiver<SlideshowCommand>,
        cancel: CancellationToken,
    ) -> Result<()> {
        let mut commands_open = true;
        loop {
            let pending = self.has_pending_timers();
            if !commands_open && !pending {
                debug!(slideshow = %self.id, "no commands and nothing scheduled");
                break;
            }
            let input = select! {
                _ = cancel.cancelled() => break,
                cmd = commands.recv(), if commands_open => match cmd {
                    Some(cmd) => Input::Command(cmd),
                    None => Input::CommandsClosed,
                },
                wake = self.next_wake(), if pending => Input::Wake(wake),
            };
            match input {
                Input::Command(cmd) => self.apply(cmd),
                Input::CommandsClosed => {
                    debug!(slideshow = %self.id, "command channel closed");
                    commands_open = false;
                }
                Input::Wake(wake) => self.handle(wake),
            }
        }
        info!(slideshow = %self.id, cycles = self.state.cycles, "slideshow stopped");
        Ok(())
    }

    async fn next_wake(&mut self) -> Wake {
        let has_fades = !self.fades.is_empty();
        let stage_due = self.cycle.as_ref().and_then(Cycle::deadline);
        let cycle_due = self.next_start;
        let now = Instant::now();
        select! {
            Some(cell) = self.fades.next(), if has_fades => Wake::CellFaded(cell),
            _ = sleep_until(stage_due.unwrap_or(now)), if stage_due.is_some() => Wake::StageDue,
            _ = sleep_until(cycle_due.unwrap_or(now)), if cycle_due.is_some() => Wake::CycleDue,
            else => Wake::Idle,
        }
    }

    fn handle(&mut self, wake: Wake) {
        match wake {
            Wake::CellFaded(cell) => self.fade_out(cell),
            Wake::StageDue => self.finish_stage(),
            Wake::CycleDue => {
                self.next_start = None;
                if self.state.paused {
                    debug!(slideshow = %self.id, "cycle due while paused; skipped");
                } else {
                    self.run_cycle();
                }
            }
            Wake::Idle => {}
        }
    }

    fn fade_out(&mut self, cell: usize) {
        let Some(cycle) = self.cycle.as_mut() else {
            return;
        };
        self.surface
            .set_cell_opacity(cell, 0.0, cycle.snapshot.transition);
        if self.fades.is_empty() {
            let at = Instant::now() + cycle.snapshot.transition;
            cycle.stage = Stage::FadeSettling { at };
            debug!(slideshow = %self.id, cycle = cycle.snapshot.index, "all cells faded");
        }
    }

    fn finish_stage(&mut self) {
        let Some(cycle) = self.cycle.take() else {
            return;
        };
        match cycle.stage {
            Stage::FadingOut => self.cycle = Some(cycle),
            Stage::FadeSettling { .. } => {
                self.swap_cells(cycle.snapshot.index);
                self.cycle = Some(Cycle {
                    stage: Stage::FadingIn {
                        at: Instant::now() + cycle.snapshot.settle,
                    },
                    ..cycle
                });
            }
            Stage::FadingIn { .. } => {
                let next = self.next_image();
                self.surface.set_backdrop(&self.images[next]);
                self.state.playing = false;
                self.state.cycles += 1;
                self.state.alternation += 1;
                debug!(
                    slideshow = %self.id,
                    cycle = cycle.snapshot.index,
                    current = self.state.current,
                    next,
                    "cycle completed"
                );
                self.emit(SlideshowEvent::CycleCompleted {
                    cycle: cycle.snapshot.index,
                    current: self.state.current,
                    next,
                });
                self.start();
            }
        }
    }

    /// Move to the next image and show it on every cell at full opacity.
    fn swap_cells(&mut self, cycle: u64) {
        // The catalog may have shrunk mid-cycle.
        self.state.current = (self.state.current + 1) % self.images.len();
        let image = &self.images[self.state.current];
        for cell in 0..self.shape.cells() {
            let placement = grid::placement(self.shape, cell, image.y_position, self.item_height);
            self.surface.set_cell_image(cell, image, &placement);
            self.surface.set_cell_opacity(cell, 1.0, Duration::ZERO);
        }
        info!(
            slideshow = %self.id,
            cycle,
            current = self.state.current,
            src = %image.src,
            "image swapped"
        );
        self.emit(SlideshowEvent::ImageSwapped {
            cycle,
            current: self.state.current,
        });
    }

    /// Paint `current` on every cell and `current + 1` on the backdrop.
    fn render_current(&mut self) {
        let image = &self.images[self.state.current];
        for cell in 0..self.shape.cells() {
            let placement = grid::placement(self.shape, cell, image.y_position, self.item_height);
            self.surface.set_cell_image(cell, image, &placement);
        }
        let next = self.next_image();
        self.surface.set_backdrop(&self.images[next]);
    }

    fn emit(&self, event: SlideshowEvent) {
        if let Some(events) = &self.events {
            if let Err(err) = events.try_send(event) {
                trace!(slideshow = %self.id, error = %err, "slideshow event dropped");
            }
        }
    }
}
