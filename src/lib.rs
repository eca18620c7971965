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

//! Logroll is an asynchronous, single-process log writer: callers emit
//! leveled records, a bounded queue decouples them from the disk, and a
//! single consumer thread fans each line out to console, an optional sink,
//! and a rotating file. Rotated-out files are gzip-compressed in the
//! background so the hot write path never blocks on archival I/O.
//!
//! # Examples
//!
//! Console-only logging through the process-wide default instance:
//!
//! ```
//! let logger = logroll::default_logger();
//! logroll::info!(logger, "hello {}", "world");
//! ```
//!
//! A standalone writer persisting to a size-rotated file:
//!
//! ```no_run
//! use logroll::Config;
//! use logroll::Level;
//!
//! let logger = Config::new()
//!     .level(Level::Debug)
//!     .file("logs", "app.log")
//!     .rotate_by_size_kb(1024)
//!     .build()
//!     .unwrap();
//!
//! logroll::debug!(logger, "request handled in {}ms", 12);
//! logger.shutdown();
//! ```
//!
//! Rotation is either time-block based (`"5m"` puts 16:56:23 into the
//! 16:55:00 block) or size-threshold based; when both are configured the
//! duration wins. Rotated files are renamed to `<name>-<suffix>`, archived to
//! `<name>-<suffix>.gz`, and the uncompressed original is removed once the
//! archive is written.

pub mod compress;

mod color;
mod config;
mod layout;
mod level;
mod logger;
mod macros;
mod record;
mod rotation;

pub use color::LevelColor;
pub use config::Config;
pub use config::ConfigError;
pub use layout::Layout;
pub use level::Level;
pub use level::ParseLevelError;
pub use logger::Logger;
pub use record::Record;

use std::sync::OnceLock;

static DEFAULT_LOGGER: OnceLock<Logger> = OnceLock::new();

/// The process-wide default logger: Info level, console echo and color on,
/// short paths, no file persistence.
///
/// Initialized lazily, exactly once, on first use. This is a convenience
/// accessor only; independent [`Logger`] instances remain first-class and
/// independently destructible.
pub fn default_logger() -> &'static Logger {
    DEFAULT_LOGGER.get_or_init(|| {
        Config::new()
            .build()
            .expect("the default configuration is always valid")
    })
}
