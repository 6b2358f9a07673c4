use std::io::{self, Write};
use std::net::Ipv4Addr;
use std::sync::Mutex;
use std::time::Duration;

use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use satrap_core::scanner::ProbeCallback;

use crate::terminal::colors;

/// The spinner currently on screen, if any. Log lines go above it.
static ACTIVE: Mutex<Option<ProgressBar>> = Mutex::new(None);

fn active() -> Option<ProgressBar> {
    ACTIVE.lock().ok().and_then(|guard| guard.clone())
}

fn set_active(pb: Option<ProgressBar>) {
    if let Ok(mut guard) = ACTIVE.lock() {
        *guard = pb;
    }
}

/// Progress of a subnet sweep, one tick per probed address.
pub struct ScanSpinner {
    pb: ProgressBar,
}

impl ScanSpinner {
    pub fn start(total: u64) -> Self {
        let pb = ProgressBar::new(total);
        let style = ProgressStyle::with_template("{spinner:.blue} {msg} {pos}/{len}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&[
                "▁▁▁▁▁",
                "▁▂▂▂▁",
                "▁▄▂▄▁",
                "▂▄▆▄▂",
                "▄▆█▆▄",
                "▂▄▆▄▂",
                "▁▄▂▄▁",
                "▁▂▂▂▁",
            ]);

        pb.set_style(style);
        pb.enable_steady_tick(Duration::from_millis(100));
        set_active(Some(pb.clone()));

        Self { pb }
    }

    /// A callback for the scanner that advances this spinner.
    pub fn reporter(&self) -> ProbeCallback {
        let pb = self.pb.clone();
        Box::new(move |ip| report_probe(&pb, ip))
    }
}

impl Drop for ScanSpinner {
    fn drop(&mut self) {
        self.pb.finish_and_clear();
        set_active(None);
    }
}

fn report_probe(pb: &ProgressBar, ip: Ipv4Addr) {
    pb.inc(1);
    pb.set_message(
        format!("Probing {}", ip.to_string().color(colors::IPV4_ADDR).bold())
            .color(colors::TEXT_DEFAULT)
            .to_string(),
    );
}

/// Prints a line without tearing the spinner, if one is running.
pub fn println(msg: &str) {
    match active() {
        Some(pb) => pb.println(msg),
        None => println!("{msg}"),
    }
}

pub struct SpinnerWriter;

impl Write for SpinnerWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let msg = String::from_utf8_lossy(buf);
        match active() {
            Some(pb) => pb.println(msg.trim_end()),
            None => io::stderr().write_all(buf)?,
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stderr().flush()
    }
}
