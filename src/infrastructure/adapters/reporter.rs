//! 콘솔 리포터 포트 구현 어댑터.

use std::collections::BTreeMap;
use std::io::{self, IsTerminal, Write};
use std::sync::Mutex;

use crate::application::ports::Reporter;

#[derive(Default)]
struct ChunkPanelState {
    in_chunk_section: bool,
    rendered_lines: usize,
    rows: BTreeMap<usize, ChunkRow>,
}

struct ChunkRow {
    label: String,
    status: String,
    extra: Option<String>,
}

/// 콘솔 전용 리포터 어댑터.
pub struct ConsoleReporter {
    interactive: bool,
    state: Mutex<ChunkPanelState>,
}

impl Default for ConsoleReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ConsoleReporter {
    /// stdout이 TTY일 때 실시간 청크 상태판 모드를 활성화한다.
    pub fn new() -> Self {
        Self {
            interactive: io::stdout().is_terminal(),
            state: Mutex::new(ChunkPanelState::default()),
        }
    }

    fn set_section(&self, name: &str) {
        if !self.interactive {
            return;
        }

        if let Ok(mut state) = self.state.lock() {
            state.in_chunk_section = name == "Review Chunks";
            state.rows.clear();
            state.rendered_lines = 0;
        }
    }

    fn render_chunk_panel(&self, state: &mut ChunkPanelState) {
        let mut out = io::stdout();
        if state.rendered_lines > 0 {
            let _ = write!(out, "\x1b[{}A\x1b[J", state.rendered_lines);
        }

        let mut lines = Vec::new();
        lines.push("┌──────────────── Chunk Review Status ────────────────┐".to_string());
        for row in state.rows.values() {
            let status_colored = colorize_status(&row.status);
            let extra_text = row.extra.as_deref().unwrap_or("-");
            lines.push(format!(
                "│ {:<14} {:<16} {:<18} │",
                row.label, status_colored, extra_text
            ));
        }
        lines.push("└──────────────────────────────────────────────────────┘".to_string());

        for line in &lines {
            let _ = writeln!(out, "{line}");
        }
        let _ = out.flush();
        state.rendered_lines = lines.len();
    }
}

impl Reporter for ConsoleReporter {
    fn section(&self, name: &str) {
        self.set_section(name);
        println!();
        println!("==================== {} ====================", name);
    }

    fn kv(&self, key: &str, value: &str) {
        println!("{:<12}: {}", key, value);
    }

    fn status(&self, scope: &str, message: &str) {
        println!("[{:<12}] {}", scope, message);
    }

    fn chunk_status(
        &self,
        chunk_number: usize,
        total_chunks: usize,
        status: &str,
        extra: Option<&str>,
    ) {
        let label = format!("chunk {chunk_number}/{total_chunks}");

        if self.interactive
            && let Ok(mut state) = self.state.lock()
            && state.in_chunk_section
        {
            state.rows.insert(
                chunk_number,
                ChunkRow {
                    label,
                    status: status.to_string(),
                    extra: extra.map(|s| s.to_string()),
                },
            );
            self.render_chunk_panel(&mut state);
            return;
        }

        match extra {
            Some(extra) => println!("[{:<12}] {:<7} {}", label, status, extra),
            None => println!("[{:<12}] {}", label, status),
        }
    }

    fn raw(&self, line: &str) {
        println!("{}", line);
    }
}

fn colorize_status(status: &str) -> String {
    match status {
        "running" => format!("\x1b[33m{status}\x1b[0m"),
        "done" => format!("\x1b[32m{status}\x1b[0m"),
        "error" => format!("\x1b[31m{status}\x1b[0m"),
        _ => status.to_string(),
    }
}
