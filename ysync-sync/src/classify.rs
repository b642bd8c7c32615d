//! Best-effort failure classification of the external tool's output.
//!
//! The tool's messages are undocumented and change between releases; the
//! markers below are heuristics, not a contract.

use crate::invoker::ToolOutput;

pub const AUTH_MESSAGE: &str =
    "authentication failed: check YUQUE_TOKEN, YUQUE_LOGIN and YUQUE_REPO in the env file";
pub const NETWORK_MESSAGE: &str = "network error: could not reach the document service";

const AUTH_MARKERS: &[&str] = &["401", "403", "unauthorized", "forbidden", "token", "auth"];
const NETWORK_MARKERS: &[&str] = &[
    "enotfound",
    "econnrefused",
    "econnreset",
    "etimedout",
    "eai_again",
    "socket hang up",
    "network",
];
const ERROR_MARKERS: &[&str] = &["error", "fail", "exception"];

/// Turn a failed run into a short, de-duplicated list of messages.
///
/// Order: auth, network, timeout, then remaining error-looking lines in order
/// of first appearance. Never empty for a failed run.
pub fn classify_failure(output: &ToolOutput) -> Vec<String> {
    if output.timed_out {
        return vec![output.stderr.trim().to_string()];
    }

    let mut auth = false;
    let mut network = false;
    let mut passthrough: Vec<String> = Vec::new();

    for line in output.stderr.lines().chain(output.stdout.lines()) {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let lower = line.to_lowercase();
        if AUTH_MARKERS.iter().any(|m| lower.contains(m)) {
            auth = true;
        } else if NETWORK_MARKERS.iter().any(|m| lower.contains(m)) {
            network = true;
        } else if ERROR_MARKERS.iter().any(|m| lower.contains(m))
            && !passthrough.iter().any(|seen| seen == line)
        {
            passthrough.push(line.to_string());
        }
    }

    let mut messages = Vec::new();
    if auth {
        messages.push(AUTH_MESSAGE.to_string());
    }
    if network {
        messages.push(NETWORK_MESSAGE.to_string());
    }
    messages.extend(passthrough);

    if messages.is_empty() {
        messages.push(match output.exit_code {
            Some(code) => format!("sync tool exited with status {code}"),
            None if !output.stderr.trim().is_empty() => output.stderr.trim().to_string(),
            None => "sync tool terminated by a signal".to_string(),
        });
    }
    messages
}
