use std::io::{self, BufRead};
use std::thread;

use tokio::sync::mpsc;

/// Reads stdin lines on a detached thread so a pending read never blocks
/// runtime shutdown. The channel closes at end of input.
pub fn spawn_line_reader() -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel(16);
    thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            match line {
                Ok(line) => {
                    if tx.blocking_send(line).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    tracing::warn!("Failed to read input: {}", e);
                    break;
                }
            }
        }
    });
    rx
}
