use std::io::Write;

use anyhow::{Context, Result};
use colored::{ColoredString, Colorize};

use crate::cluster::Transport;
use crate::session::Dashboard;
use crate::session::clock::Clock;
use crate::session::display::{Entry, Tone, Update};

/// Drive a session in the foreground until both loops have stopped.
///
/// This is the terminal counterpart of the web dashboard: it sleeps until
/// the next tick is due, runs it, and prints every region change as a
/// prefixed line. Returns once nothing is scheduled any more.
pub fn drive<T: Transport, C: Clock>(dashboard: &mut Dashboard<T, C>) -> Result<()> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    loop {
        print_updates(dashboard, &mut out)?;

        let Some(wait) = dashboard.time_until_next() else {
            break;
        };
        if !wait.is_zero() {
            std::thread::sleep(wait);
        }
        dashboard.run_due();
    }

    Ok(())
}

/// Print and drain the region changes queued since the last call.
pub fn print_updates<T: Transport, C: Clock>(
    dashboard: &mut Dashboard<T, C>,
    out: &mut impl Write,
) -> Result<()> {
    for update in dashboard.display_mut().take_pending() {
        writeln!(out, "{}", format_update(&update)).context("failed writing to stdout")?;
    }
    out.flush().context("failed flushing stdout")
}

/// One terminal line for a region change. A replaced region starts a new
/// block, so it gets a blank separator line.
pub fn format_update(update: &Update) -> String {
    let time = chrono::Local::now().format("%H:%M:%S");
    match update {
        Update::Replaced(region, entry) => {
            format!("\n{} {} {}", time, format!("[{region}]").bold(), styled(entry))
        }
        Update::Appended(region, entry) => {
            format!("{} {} {}", time, format!("[{region}]").dimmed(), styled(entry))
        }
    }
}

fn styled(entry: &Entry) -> ColoredString {
    let text = entry.text.as_str();
    match entry.tone {
        Tone::Plain => text.normal(),
        Tone::Red => text.red(),
        Tone::Blue => text.blue(),
        Tone::Notice => text.cyan().bold(),
        Tone::Error => format!("error: {text}").red().bold(),
    }
}
