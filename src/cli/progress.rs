//! Progress and CLI output utilities
//!
//! Console helpers shared by the command handlers, plus a spinner for the
//! counting/planning pass. The copy pass has its own progress bar, owned by
//! the export engine.

use indicatif::{ProgressBar, ProgressStyle};
use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

/// Get the spinner style for catalog passes
fn spinner_style() -> ProgressStyle {
    ProgressStyle::default_spinner()
        .template("{spinner:.cyan} {msg}")
        .unwrap()
        .tick_chars("⣾⣽⣻⢿⡿⣟⣯⣷")
}

// ============================================================================
// Console output helpers
// ============================================================================

/// Print a header section with a box
pub fn print_header(title: &str) {
    let width = 68;
    let title_padded = format!("{:^width$}", title, width = width - 4);
    println!();
    println!("╔{}╗", "═".repeat(width - 2));
    println!("║{}║", title_padded);
    println!("╚{}╝", "═".repeat(width - 2));
    println!();
}

/// Print a success message with checkmark
pub fn print_success(msg: &str) {
    println!("  ✓ {}", msg);
}

/// Print an info message with bullet
pub fn print_info(msg: &str) {
    println!("  • {}", msg);
}

/// Print a warning message
pub fn print_warning(msg: &str) {
    println!("  ⚠ {}", msg);
}

/// Print an error message
pub fn print_error(msg: &str) {
    println!("  ✗ {}", msg);
}

// ============================================================================
// Progress tracker for catalog passes
// ============================================================================

/// Spinner for the counting/planning pass over the catalog
pub struct PlanProgress {
    albums_visited: AtomicUsize,
    assets_found: AtomicUsize,
    spinner: ProgressBar,
    start_time: Instant,
}

impl PlanProgress {
    /// Create a new plan progress spinner
    pub fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(spinner_style());
        spinner.enable_steady_tick(Duration::from_millis(100));
        spinner.set_message("Reading catalog...");

        Self {
            albums_visited: AtomicUsize::new(0),
            assets_found: AtomicUsize::new(0),
            spinner,
            start_time: Instant::now(),
        }
    }

    /// Record one visited album with its asset count
    pub fn album_visited(&self, assets: usize) {
        self.albums_visited.fetch_add(1, Ordering::Relaxed);
        self.assets_found.fetch_add(assets, Ordering::Relaxed);
        self.update_message();
    }

    fn update_message(&self) {
        let albums = self.albums_visited.load(Ordering::Relaxed);
        let assets = self.assets_found.load(Ordering::Relaxed);
        self.spinner.set_message(format!(
            "Reading catalog: {} albums, {} assets",
            albums, assets
        ));
    }

    /// Finish the spinner with a summary
    pub fn finish(&self) {
        let albums = self.albums_visited.load(Ordering::Relaxed);
        let assets = self.assets_found.load(Ordering::Relaxed);
        let elapsed = self.start_time.elapsed();
        self.spinner.finish_with_message(format!(
            "✓ Found {} assets in {} albums ({:.1}s)",
            assets,
            albums,
            elapsed.as_secs_f64()
        ));
    }

    /// Finish with an error message
    pub fn finish_with_error(&self, msg: &str) {
        self.spinner.finish_with_message(format!("✗ {}", msg));
    }

    /// Get current counts
    pub fn counts(&self) -> (usize, usize) {
        (
            self.albums_visited.load(Ordering::Relaxed),
            self.assets_found.load(Ordering::Relaxed),
        )
    }
}

impl Default for PlanProgress {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Utility functions
// ============================================================================

/// Format bytes as human-readable string
pub fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}

/// Format duration as human-readable string
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs >= 3600 {
        let hours = secs / 3600;
        let mins = (secs % 3600) / 60;
        format!("{}h {}m", hours, mins)
    } else if secs >= 60 {
        let mins = secs / 60;
        let secs = secs % 60;
        format!("{}m {}s", mins, secs)
    } else {
        format!("{:.1}s", duration.as_secs_f64())
    }
}

// ============================================================================
// Dual writer for file + console logging
// ============================================================================

/// A writer that writes to both console and file
///
/// Used for logging to both stderr and a log file simultaneously.
pub struct DualWriter {
    pub console: std::io::Stderr,
    pub file: std::fs::File,
}

impl Write for DualWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        // Write to console
        let _ = self.console.write(buf);
        // Write to file
        self.file.write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        let _ = self.console.flush();
        self.file.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(500), "500 bytes");
        assert_eq!(format_bytes(1024), "1.0 KB");
        assert_eq!(format_bytes(1536), "1.5 KB");
        assert_eq!(format_bytes(1048576), "1.00 MB");
        assert_eq!(format_bytes(1073741824), "1.00 GB");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_secs(30)), "30.0s");
        assert_eq!(format_duration(Duration::from_secs(90)), "1m 30s");
        assert_eq!(format_duration(Duration::from_secs(3661)), "1h 1m");
    }

    #[test]
    fn test_plan_progress_counts() {
        let progress = PlanProgress::new();
        progress.album_visited(3);
        progress.album_visited(2);
        let (albums, assets) = progress.counts();
        assert_eq!(albums, 2);
        assert_eq!(assets, 5);
        progress.finish();
    }
}
