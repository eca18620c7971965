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

//! The payload of a single log event.

use jiff::Zoned;

use crate::Level;

/// One discrete log event: capture time, level, call-site location, and the
/// already-interpolated message.
///
/// A record is constructed on the emitting thread and consumed by the
/// rendering step before the line is handed to the consumer; it never crosses
/// the queue itself.
#[derive(Clone, Debug)]
pub struct Record {
    time: Zoned,
    level: Level,
    file: &'static str,
    line: u32,
    message: String,
}

impl Record {
    pub(crate) fn new(level: Level, file: &'static str, line: u32, message: String) -> Self {
        Self {
            time: Zoned::now(),
            level,
            file,
            line,
            message,
        }
    }

    /// The observed wall-clock time.
    pub fn time(&self) -> &Zoned {
        &self.time
    }

    /// The verbosity level of the message.
    pub fn level(&self) -> Level {
        self.level
    }

    /// The source file containing the emitting call, as an absolute path.
    ///
    /// Custom layouts always receive the full path; the built-in layout
    /// shortens it to the final segment when short-path mode is enabled.
    pub fn file(&self) -> &'static str {
        self.file
    }

    /// The line of the emitting call.
    pub fn line(&self) -> u32 {
        self.line
    }

    /// The message body.
    pub fn message(&self) -> &str {
        &self.message
    }
}
