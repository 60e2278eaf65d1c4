use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use thiserror::Error;
use tracing::trace;

use crate::events::{ImageDescriptor, SlideshowId};
use crate::grid::{CellLayout, CellPlacement, GridShape};

#[derive(Debug, Error)]
pub enum SurfaceError {
    #[error("container '{0}' already hosts a grid for slideshow {1}")]
    AlreadyCreated(String, SlideshowId),
    #[error("no container to create cells in")]
    Detached,
}

/// Where the grid is drawn. The slideshow owns the timing; the surface owns
/// the elements.
///
/// Styling calls cannot fail: a cell that misses one update only shows the
/// old image for one more frame.
pub trait RenderSurface {
    /// Height of the container in pixels, or `None` when there is no container.
    fn container_height(&self) -> Option<f32>;

    /// Create `shape.cells()` addressable cells, row-major.
    fn create_cells(&mut self, id: SlideshowId, shape: GridShape) -> Result<(), SurfaceError>;

    fn set_cell_layout(&mut self, cell: usize, layout: &CellLayout);

    fn set_cell_image(&mut self, cell: usize, image: &ImageDescriptor, placement: &CellPlacement);

    /// Animate a cell's opacity linearly over `transition` (zero is instant).
    fn set_cell_opacity(&mut self, cell: usize, opacity: f32, transition: Duration);

    /// Paint the full-size layer that shows through transparent cells.
    fn set_backdrop(&mut self, image: &ImageDescriptor);
}

#[derive(Debug, Clone, PartialEq)]
pub struct CellState {
    pub opacity: f32,
    pub transition: Duration,
    pub layout: Option<CellLayout>,
    pub image: Option<ImageDescriptor>,
    pub placement: Option<CellPlacement>,
}

impl Default for CellState {
    fn default() -> Self {
        Self {
            opacity: 1.0,
            transition: Duration::ZERO,
            layout: None,
            image: None,
            placement: None,
        }
    }
}

/// Every call a [`MemorySurface`] received, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceOp {
    CellsCreated { rows: usize, columns: usize },
    Layout { cell: usize },
    Image { cell: usize, src: String },
    Opacity { cell: usize, opacity: f32, transition: Duration },
    Backdrop { src: String },
}

#[derive(Debug, Default)]
struct MemoryState {
    container: Option<(String, f32)>,
    owner: Option<SlideshowId>,
    cells: Vec<CellState>,
    backdrop: Option<ImageDescriptor>,
    journal: Option<Vec<SurfaceOp>>,
}

impl MemoryState {
    fn record(&mut self, op: SurfaceOp) {
        if let Some(journal) = self.journal.as_mut() {
            journal.push(op);
        }
    }
}

/// In-memory surface. Clones share state, so a caller can keep one clone to
/// inspect what the slideshow did with the other.
///
/// Calls are only journaled after [`MemorySurface::with_journal`]; the journal
/// is never trimmed.
#[derive(Debug, Clone, Default)]
pub struct MemorySurface {
    inner: Arc<Mutex<MemoryState>>,
}

impl MemorySurface {
    pub fn new(container: impl Into<String>, height: f32) -> Self {
        let state = MemoryState {
            container: Some((container.into(), height)),
            ..MemoryState::default()
        };
        Self {
            inner: Arc::new(Mutex::new(state)),
        }
    }

    /// Record every call from now on, see [`MemorySurface::journal`].
    pub fn with_journal(self) -> Self {
        self.lock().journal.get_or_insert_with(Vec::new);
        self
    }

    /// A surface with no container, as when the page lacks the target element.
    pub fn detached() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn cells(&self) -> Vec<CellState> {
        self.lock().cells.clone()
    }

    pub fn cell(&self, index: usize) -> Option<CellState> {
        self.lock().cells.get(index).cloned()
    }

    pub fn backdrop(&self) -> Option<ImageDescriptor> {
        self.lock().backdrop.clone()
    }

    pub fn owner(&self) -> Option<SlideshowId> {
        self.lock().owner
    }

    /// Calls recorded so far; empty unless journaling was enabled.
    pub fn journal(&self) -> Vec<SurfaceOp> {
        self.lock().journal.clone().unwrap_or_default()
    }

    pub fn clear_journal(&self) {
        if let Some(journal) = self.lock().journal.as_mut() {
            journal.clear();
        }
    }
}

impl RenderSurface for MemorySurface {
    fn container_height(&self) -> Option<f32> {
        self.lock().container.as_ref().map(|(_, height)| *height)
    }

    fn create_cells(&mut self, id: SlideshowId, shape: GridShape) -> Result<(), SurfaceError> {
        let mut state = self.lock();
        let Some((name, _)) = state.container.as_ref() else {
            return Err(SurfaceError::Detached);
        };
        if let Some(owner) = state.owner {
            return Err(SurfaceError::AlreadyCreated(name.clone(), owner));
        }
        state.owner = Some(id);
        state.cells = vec![CellState::default(); shape.cells()];
        state.record(SurfaceOp::CellsCreated {
            rows: shape.rows,
            columns: shape.columns,
        });
        trace!(slideshow = %id, rows = shape.rows, columns = shape.columns, "cells created");
        Ok(())
    }

    fn set_cell_layout(&mut self, cell: usize, layout: &CellLayout) {
        let mut state = self.lock();
        if let Some(target) = state.cells.get_mut(cell) {
            target.layout = Some(*layout);
            state.record(SurfaceOp::Layout { cell });
        }
    }

    fn set_cell_image(&mut self, cell: usize, image: &ImageDescriptor, placement: &CellPlacement) {
        let mut state = self.lock();
        if let Some(target) = state.cells.get_mut(cell) {
            target.image = Some(image.clone());
            target.placement = Some(*placement);
            state.record(SurfaceOp::Image {
                cell,
                src: image.src.clone(),
            });
            trace!(cell, src = %image.src, position = %placement, "cell image");
        }
    }

    fn set_cell_opacity(&mut self, cell: usize, opacity: f32, transition: Duration) {
        let mut state = self.lock();
        if let Some(target) = state.cells.get_mut(cell) {
            target.opacity = opacity;
            target.transition = transition;
            state.record(SurfaceOp::Opacity {
                cell,
                opacity,
                transition,
            });
            trace!(
                cell,
                opacity,
                transition_ms = transition.as_millis() as u64,
                "cell opacity"
            );
        }
    }

    fn set_backdrop(&mut self, image: &ImageDescriptor) {
        let mut state = self.lock();
        state.backdrop = Some(image.clone());
        state.record(SurfaceOp::Backdrop {
            src: image.src.clone(),
        });
        trace!(src = %image.src, anchor = image.y_position.as_str(), "backdrop");
    }
}
