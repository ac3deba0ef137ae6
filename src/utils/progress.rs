#[cfg(feature = "cli")]
use indicatif::{ProgressBar, ProgressStyle};

/// Console progress for a fan-out run. Disabled instances draw nothing.
#[cfg(feature = "cli")]
pub struct FetchProgress {
    bar: ProgressBar,
}

#[cfg(feature = "cli")]
impl FetchProgress {
    pub fn new(enabled: bool) -> Self {
        let bar = if enabled {
            ProgressBar::new(0)
        } else {
            ProgressBar::hidden()
        };
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        {
            bar.set_style(style.progress_chars("█▉▊▋▌▍▎▏ "));
        }
        Self { bar }
    }

    pub fn start(&self, total: usize, message: &str) {
        self.bar.set_length(total as u64);
        self.bar.set_position(0);
        self.bar.set_message(message.to_string());
    }

    pub fn advance(&self) {
        self.bar.inc(1);
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

#[cfg(not(feature = "cli"))]
pub struct FetchProgress;

#[cfg(not(feature = "cli"))]
impl FetchProgress {
    pub fn new(_enabled: bool) -> Self {
        Self
    }

    pub fn start(&self, _total: usize, _message: &str) {}

    pub fn advance(&self) {}

    pub fn finish(&self) {}
}

impl Default for FetchProgress {
    fn default() -> Self {
        Self::new(false)
    }
}
