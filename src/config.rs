// Copyright 2024 FastLabs Developers
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Writer configuration.

use std::io::Write;
use std::path::PathBuf;

use crate::Layout;
use crate::Level;
use crate::Logger;
use crate::rotation::Rotation;

/// An error constructing a [`Logger`] from a [`Config`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The rotation duration string is not a valid duration.
    #[error("invalid rotation duration {input:?}: {source}")]
    InvalidDuration {
        /// The rejected input.
        input: String,
        /// The parse failure.
        source: humantime::DurationError,
    },
}

/// A builder to configure and create a [`Logger`].
///
/// ```
/// use logroll::Config;
/// use logroll::Level;
///
/// let logger = Config::new()
///     .level(Level::Debug)
///     .console(true)
///     .build()
///     .unwrap();
/// logroll::info!(logger, "hello {}", "world");
/// ```
pub struct Config {
    pub(crate) level: Level,
    pub(crate) short_path: bool,
    pub(crate) console: bool,
    pub(crate) color: bool,
    pub(crate) queue_capacity: usize,
    pub(crate) sink: Option<Box<dyn Write + Send>>,
    pub(crate) layout: Option<Box<dyn Layout>>,
    pub(crate) dir: Option<PathBuf>,
    pub(crate) filename: Option<String>,
    pub(crate) rotate_by_time: Option<String>,
    pub(crate) rotate_by_size_kb: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    /// Default capacity of the record queue.
    pub const DEFAULT_QUEUE_CAPACITY: usize = 256;

    /// Creates a new [`Config`]: Info level, console echo and color on, short
    /// paths, no file persistence.
    #[must_use]
    pub fn new() -> Config {
        Config {
            level: Level::Info,
            short_path: true,
            console: true,
            color: true,
            queue_capacity: Self::DEFAULT_QUEUE_CAPACITY,
            sink: None,
            layout: None,
            dir: None,
            filename: None,
            rotate_by_time: None,
            rotate_by_size_kb: None,
        }
    }

    /// Set the minimum level a record must have to be emitted.
    #[must_use]
    pub fn level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Shorten call-site paths to their final segment.
    #[must_use]
    pub fn short_path(mut self, short_path: bool) -> Self {
        self.short_path = short_path;
        self
    }

    /// Echo every line to stdout.
    #[must_use]
    pub fn console(mut self, console: bool) -> Self {
        self.console = console;
        self
    }

    /// Apply ANSI color to the timestamp and level of the built-in layout.
    #[must_use]
    pub fn color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    /// Set the capacity of the bounded record queue. Producers block when it
    /// is full.
    #[must_use]
    pub fn queue_capacity(mut self, queue_capacity: usize) -> Self {
        self.queue_capacity = queue_capacity;
        self
    }

    /// Set a secondary sink receiving every line alongside console and file,
    /// e.g. a network writer. Sink write failures never block delivery.
    #[must_use]
    pub fn sink(mut self, sink: impl Write + Send + 'static) -> Self {
        self.sink = Some(Box::new(sink));
        self
    }

    /// Set a custom layout, completely replacing the built-in rendering.
    #[must_use]
    pub fn layout(mut self, layout: impl Layout) -> Self {
        self.layout = Some(Box::new(layout));
        self
    }

    /// Persist lines to `<dir>/<filename>`. Persistence stays disabled if
    /// either part is empty.
    #[must_use]
    pub fn file(mut self, dir: impl Into<PathBuf>, filename: impl Into<String>) -> Self {
        let dir = dir.into();
        let filename = filename.into();
        if dir.as_os_str().is_empty() || filename.is_empty() {
            return self;
        }
        self.dir = Some(dir);
        self.filename = Some(filename);
        self
    }

    /// Rotate the file every time a duration block elapses, e.g. `"5m"`.
    ///
    /// Takes precedence over [`rotate_by_size_kb`](Config::rotate_by_size_kb)
    /// when both are set. Invalid duration strings fail
    /// [`build`](Config::build).
    #[must_use]
    pub fn rotate_by_time(mut self, period: impl Into<String>) -> Self {
        self.rotate_by_time = Some(period.into());
        self
    }

    /// Rotate the file once it grows strictly beyond this many kilobytes.
    #[must_use]
    pub fn rotate_by_size_kb(mut self, threshold_kb: u64) -> Self {
        self.rotate_by_size_kb = Some(threshold_kb);
        self
    }

    /// Build the [`Logger`], spawning its consumer thread.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured rotation duration cannot be parsed.
    pub fn build(self) -> Result<Logger, ConfigError> {
        Logger::with_config(self)
    }

    /// Resolve the rotation mode once, duration preferred over size.
    pub(crate) fn rotation(&self) -> Result<Option<Rotation>, ConfigError> {
        if let Some(period) = &self.rotate_by_time {
            let period = humantime::parse_duration(period).map_err(|source| {
                ConfigError::InvalidDuration {
                    input: period.clone(),
                    source,
                }
            })?;
            return Ok(Some(Rotation::ByTime(period)));
        }
        if let Some(threshold_kb) = self.rotate_by_size_kb {
            return Ok(Some(Rotation::BySize(threshold_kb * 1024)));
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn test_duration_takes_precedence_over_size() {
        let config = Config::new().rotate_by_time("5m").rotate_by_size_kb(64);
        assert_eq!(
            config.rotation().unwrap(),
            Some(Rotation::ByTime(Duration::from_secs(300)))
        );
    }

    #[test]
    fn test_size_threshold_resolves_to_bytes() {
        let config = Config::new().rotate_by_size_kb(2);
        assert_eq!(config.rotation().unwrap(), Some(Rotation::BySize(2048)));
    }

    #[test]
    fn test_invalid_duration_is_a_construction_error() {
        let config = Config::new().rotate_by_time("five minutes-ish");
        assert!(matches!(
            config.rotation(),
            Err(ConfigError::InvalidDuration { .. })
        ));
    }

    #[test]
    fn test_empty_file_parts_disable_persistence() {
        let config = Config::new().file("", "app.log");
        assert!(config.dir.is_none());
        let config = Config::new().file("logs", "");
        assert!(config.filename.is_none());
    }
}
