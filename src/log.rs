//! Module that prints the colored log lines used throughout the ring.

use color_print::cformat;
use std::sync::atomic::{AtomicBool, Ordering};

static VERBOSE: AtomicBool = AtomicBool::new(false);

/// Function that enables or disables `debug` output.
pub fn set_verbose(verbose: bool) {
    VERBOSE.store(verbose, Ordering::Relaxed);
}

fn print(level: &str, msg: &str) {
    let now = chrono::Local::now().format("%M:%S%.3f");
    eprintln!("{now} - {level} - {msg}");
}

pub fn debug(msg: &str) {
    if VERBOSE.load(Ordering::Relaxed) {
        print(&cformat!("<magenta>DEBUG</magenta>"), msg);
    }
}

pub fn info(msg: &str) {
    print(&cformat!("<blue>INFO</blue>"), msg);
}

pub fn warn(msg: &str) {
    print(&cformat!("<yellow>WARNING</yellow>"), msg);
}

pub fn error(msg: &str) {
    print(&cformat!("<red>ERROR</red>"), msg);
}

/// Function that logs events that need the operator's attention, like lost tokens.
pub fn critical(msg: &str) {
    print(&cformat!("<red, bold>CRITICAL</red, bold>"), msg);
}
