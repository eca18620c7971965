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

//! Render a [`Record`] into an output line.

use std::path::Path;

use crate::Record;
use crate::color::LevelColor;

/// Render a [`Record`] into an output line.
///
/// A custom layout fully replaces the built-in rendering, including its color
/// and path-shortening logic, and receives the raw record so that every field
/// is available (useful for structured emission such as JSON). The returned
/// line is written verbatim to every configured destination; include a
/// trailing newline if one is wanted.
///
/// Closures of the right shape implement `Layout` directly:
///
/// ```
/// use logroll::Layout;
/// use logroll::Record;
///
/// let layout = |record: &Record| format!("{} {}\n", record.level(), record.message());
/// let _: &dyn Layout = &layout;
/// ```
pub trait Layout: Send + Sync + 'static {
    /// Render the record into a line.
    fn format(&self, record: &Record) -> String;
}

impl<F> Layout for F
where
    F: Fn(&Record) -> String + Send + Sync + 'static,
{
    fn format(&self, record: &Record) -> String {
        self(record)
    }
}

/// The built-in text layout.
///
/// Output format:
///
/// ```text
/// 2024-08-11 22:44:57.172 [ INFO] rolling.rs:53:    Hello info!
/// 2024-08-11 22:44:57.172 [ERROR] rolling.rs:51:    Hello error!
/// ```
///
/// When color is enabled, the timestamp and the level token are colored
/// according to [`LevelColor`]; with color disabled the structure is
/// identical without any escape sequences.
#[derive(Default, Debug, Clone)]
pub(crate) struct TextLayout {
    colors: LevelColor,
}

impl TextLayout {
    const TIMESTAMP_FORMAT: &'static str = "%Y-%m-%d %H:%M:%S.%3f";

    pub(crate) fn render(&self, record: &Record, color: bool, short_path: bool) -> String {
        let time = record.time().strftime(Self::TIMESTAMP_FORMAT).to_string();
        let time = self.colors.colorize_timestamp(!color, time);
        let level = self.colors.colorize_record_level(!color, record.level());
        let file = if short_path {
            Path::new(record.file())
                .file_name()
                .and_then(|name| name.to_str())
                .unwrap_or_else(|| record.file())
        } else {
            record.file()
        };
        let line = record.line();
        let message = record.message();

        format!("{time} [{level:>5}] {file}:{line}:\t{message}\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Level;

    fn record(level: Level) -> Record {
        Record::new(level, "/home/dev/project/src/server.rs", 42, "hello".to_string())
    }

    #[test]
    fn test_plain_rendering_has_no_escape_sequences() {
        let layout = TextLayout::default();
        for level in [
            Level::Trace,
            Level::Debug,
            Level::Info,
            Level::Warn,
            Level::Error,
        ] {
            let line = layout.render(&record(level), false, true);
            assert!(!line.contains('\x1b'), "unexpected escape in {line:?}");
            assert!(line.contains(level.as_str()));
            assert!(line.ends_with("hello\n"));
        }
    }

    #[test]
    fn test_short_path_keeps_final_segment() {
        let layout = TextLayout::default();
        let line = layout.render(&record(Level::Info), false, true);
        assert!(line.contains("server.rs:42:"));
        assert!(!line.contains("/home/dev/project"));
    }

    #[test]
    fn test_long_path_kept_verbatim() {
        let layout = TextLayout::default();
        let line = layout.render(&record(Level::Info), false, false);
        assert!(line.contains("/home/dev/project/src/server.rs:42:"));
    }
}
