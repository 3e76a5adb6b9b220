/// Device activity counters with a colored console report

use colored::*;

/// Counters accumulated by a [`crate::CpuComputeDevice`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeviceStats {
    pub buffers_created: u32,
    pub buffers_destroyed: u32,
    pub submissions: u32,
    pub records_processed: u64,
    pub readbacks_completed: u32,
    pub readbacks_failed: u32,
    pub readbacks_discarded: u32,
}

impl DeviceStats {
    /// Read-backs that reached a final state or were abandoned
    pub fn readbacks_finished(&self) -> u32 {
        self.readbacks_completed + self.readbacks_failed + self.readbacks_discarded
    }
}

/// Print a device statistics report
pub fn print_device_stats_report(stats: &DeviceStats) {
    if stats.submissions == 0 {
        println!("\n{}", "✓ No compute submissions".green().bold());
        return;
    }

    println!("\n{}", "=== Compute Device Report ===".bright_blue().bold());
    println!("  {} {}", "Submissions:".white().bold(), stats.submissions);
    println!("  {} {}", "Records:".cyan(), stats.records_processed);
    println!("  {} {} created, {} destroyed",
        "Buffers:".cyan(), stats.buffers_created, stats.buffers_destroyed);

    if stats.readbacks_completed > 0 {
        println!("  {} {}", "Completed:".green(), stats.readbacks_completed);
    }
    if stats.readbacks_failed > 0 {
        println!("  {} {}", "Failed:".red().bold(), stats.readbacks_failed);
    }
    if stats.readbacks_discarded > 0 {
        println!("  {} {}", "Discarded:".yellow().bold(), stats.readbacks_discarded);
    }

    let in_flight = stats.submissions.saturating_sub(stats.readbacks_finished());
    if in_flight > 0 {
        println!("  {} {}", "In flight:".bright_black(), in_flight);
    }
}
