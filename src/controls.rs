//! Text control lines for driving a slideshow from a terminal, standing in for
//! the sliders, pattern buttons and hover events of a page.
//!
//! ```text
//! pause | resume
//! interval 2s | transition 900ms | step 30ms
//! pattern vertical-sweep
//! set 1
//! ```

use anyhow::{Context, Result, anyhow, bail};

use crate::events::{ImageDescriptor, SlideshowCommand};
use crate::pattern::Pattern;

/// Parse one control line. Blank lines and `#` comments yield `None`.
pub fn parse_control(
    line: &str,
    image_sets: &[Vec<ImageDescriptor>],
) -> Result<Option<SlideshowCommand>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }
    let (verb, arg) = match line.split_once(char::is_whitespace) {
        Some((verb, arg)) => (verb, arg.trim()),
        None => (line, ""),
    };

    let command = match verb {
        "pause" => SlideshowCommand::Pause,
        "resume" => SlideshowCommand::Resume,
        "interval" => SlideshowCommand::SetIntervalTime(duration_arg(verb, arg)?),
        "transition" => SlideshowCommand::SetTransitionTime(duration_arg(verb, arg)?),
        "step" => SlideshowCommand::SetTimeoutStep(duration_arg(verb, arg)?),
        "pattern" => SlideshowCommand::SetPattern(arg.parse::<Pattern>()?),
        "set" => {
            let idx: usize = arg
                .parse()
                .with_context(|| format!("invalid image set index '{}'", arg))?;
            let images = image_sets.get(idx).ok_or_else(|| {
                anyhow!(
                    "image set {} does not exist ({} configured)",
                    idx,
                    image_sets.len()
                )
            })?;
            SlideshowCommand::SetBackgroundImages(images.clone())
        }
        other => bail!(
            "unknown control '{}', expected one of: pause, resume, interval, transition, step, pattern, set",
            other
        ),
    };
    Ok(Some(command))
}

fn duration_arg(verb: &str, arg: &str) -> Result<std::time::Duration> {
    if arg.is_empty() {
        bail!("'{}' needs a duration such as 900ms or 2s", verb);
    }
    humantime::parse_duration(arg).with_context(|| format!("invalid duration for '{}'", verb))
}
