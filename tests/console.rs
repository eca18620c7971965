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

use std::process::Command;

use logroll::Config;
use logroll::Level;

/// Set in the child process that does the actual stdout writing.
const CHILD_ENV: &str = "LOGROLL_CONSOLE_CHILD";

/// Console output goes to the real stdout, which a test can only observe
/// from the outside: re-run this test binary as a child process, let the
/// child log to its stdout, and assert on the captured output here.
///
/// The child starts with console echo off and flips it on with
/// `set_console`, so the consumer reading the updated flag is covered too.
#[test]
fn test_console_echoes_filtered_records_to_stdout() {
    if std::env::var_os(CHILD_ENV).is_some() {
        let logger = Config::new()
            .level(Level::Info)
            .console(false)
            .color(false)
            .build()
            .unwrap();
        logger.set_console(true);
        logroll::debug!(logger, "hello");
        logroll::info!(logger, "hello");
        logger.shutdown();
        return;
    }

    let exe = std::env::current_exe().unwrap();
    let output = Command::new(exe)
        .args([
            "test_console_echoes_filtered_records_to_stdout",
            "--exact",
            "--nocapture",
        ])
        .env(CHILD_ENV, "1")
        .output()
        .unwrap();
    assert!(output.status.success());

    // the harness prints its own lines around the logged one; only the
    // logged line carries the message
    let stdout = String::from_utf8_lossy(&output.stdout);
    let logged: Vec<&str> = stdout.lines().filter(|line| line.contains("hello")).collect();
    assert_eq!(logged.len(), 1, "child stdout:\n{stdout}");
    assert!(logged[0].contains("INFO"));
    assert!(!stdout.contains("DEBUG"));
}
