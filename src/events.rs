use std::fmt;
use std::time::Duration;

use serde::Deserialize;
use tokio::sync::mpsc;

use crate::error::Error;
use crate::pattern::Pattern;

/// Identifier assigned by the owning application to tell slideshows apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(transparent)]
pub struct SlideshowId(pub u32);

impl fmt::Display for SlideshowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which edge of an image stays pinned when it is sliced across the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VerticalAnchor {
    Top,
    #[default]
    Center,
    Bottom,
}

impl VerticalAnchor {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Top => "top",
            Self::Center => "center",
            Self::Bottom => "bottom",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ImageDescriptor {
    pub src: String,
    #[serde(default)]
    pub y_position: VerticalAnchor,
}

impl ImageDescriptor {
    pub fn new(src: impl Into<String>, y_position: VerticalAnchor) -> Self {
        Self {
            src: src.into(),
            y_position,
        }
    }
}

/// Mutations accepted by a running slideshow. These stand in for the sliders,
/// pattern buttons and hover events of an embedding page.
#[derive(Debug, Clone)]
pub enum SlideshowCommand {
    Pause,
    Resume,
    SetIntervalTime(Duration),
    SetTransitionTime(Duration),
    SetTimeoutStep(Duration),
    SetPattern(Pattern),
    SetBackgroundImages(Vec<ImageDescriptor>),
}

/// Emitted by the slideshow as cycles progress.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlideshowEvent {
    CycleStarted { cycle: u64, cells: usize },
    ImageSwapped { cycle: u64, current: usize },
    CycleCompleted { cycle: u64, current: usize, next: usize },
}

/// Sending half of a slideshow's command channel.
#[derive(Debug, Clone)]
pub struct SlideshowHandle {
    tx: mpsc::Sender<SlideshowCommand>,
}

pub fn channel(capacity: usize) -> (SlideshowHandle, mpsc::Receiver<SlideshowCommand>) {
    let (tx, rx) = mpsc::channel(capacity);
    (SlideshowHandle { tx }, rx)
}

impl SlideshowHandle {
    pub async fn send(&self, command: SlideshowCommand) -> Result<(), Error> {
        self.tx.send(command).await.map_err(|_| Error::ChannelClosed)
    }

    /// For callers living outside the runtime, such as a stdin reader thread.
    pub fn blocking_send(&self, command: SlideshowCommand) -> Result<(), Error> {
        self.tx
            .blocking_send(command)
            .map_err(|_| Error::ChannelClosed)
    }

    pub async fn pause(&self) -> Result<(), Error> {
        self.send(SlideshowCommand::Pause).await
    }

    pub async fn resume(&self) -> Result<(), Error> {
        self.send(SlideshowCommand::Resume).await
    }

    pub async fn set_interval_time(&self, interval: Duration) -> Result<(), Error> {
        self.send(SlideshowCommand::SetIntervalTime(interval)).await
    }

    pub async fn set_transition_time(&self, transition: Duration) -> Result<(), Error> {
        self.send(SlideshowCommand::SetTransitionTime(transition))
            .await
    }

    pub async fn set_timeout_step(&self, step: Duration) -> Result<(), Error> {
        self.send(SlideshowCommand::SetTimeoutStep(step)).await
    }

    pub async fn set_pattern(&self, pattern: Pattern) -> Result<(), Error> {
        self.send(SlideshowCommand::SetPattern(pattern)).await
    }

    pub async fn set_background_images(&self, images: Vec<ImageDescriptor>) -> Result<(), Error> {
        self.send(SlideshowCommand::SetBackgroundImages(images))
            .await
    }
}
