//! Terminal output for streamed generations and tool activity.
//!
//! Content deltas go to stdout so the generated text can be piped; tool
//! announcements go to stderr so they show up alongside the content without
//! polluting it.

use std::io::Write;

use tokio::sync::mpsc::UnboundedReceiver;

/// Longest tool argument/result preview printed to stderr.
const PREVIEW_CHARS: usize = 200;

/// Drain a delta channel to stdout, flushing after each chunk.
///
/// Runs until the sender side is dropped, then prints a trailing newline.
pub async fn print_deltas(mut rx: UnboundedReceiver<String>) {
    let mut stdout = std::io::stdout();
    while let Some(delta) = rx.recv().await {
        // A failed terminal write is not worth aborting the run for.
        if stdout.write_all(delta.as_bytes()).is_err() {
            break;
        }
        let _ = stdout.flush();
    }
    let _ = stdout.write_all(b"\n");
    let _ = stdout.flush();
}

fn preview(text: &str) -> String {
    if text.chars().count() <= PREVIEW_CHARS {
        text.to_string()
    } else {
        let clipped: String = text.chars().take(PREVIEW_CHARS).collect();
        format!("{clipped}...")
    }
}

/// Announce a tool invocation on stderr.
pub fn announce_tool(name: &str, args: &str) {
    eprintln!("[tool] {name}({})", preview(args));
}

/// Report a finished tool invocation on stderr.
pub fn announce_tool_done(name: &str, output: &str) {
    eprintln!("[tool] {name} -> {}", preview(output));
}
