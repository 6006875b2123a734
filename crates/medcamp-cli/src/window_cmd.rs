//! `medcamp window` - evaluate one approval or response window.

use std::io::Write;

use chrono::{DateTime, Utc};
use clap::Args;

use medcamp_core::TimePoint;
use medcamp_core::deadline::{self, ActionWindow};

use crate::args::{KindArg, parse_instant};
use crate::report_fmt;

#[derive(Args, Debug)]
pub struct WindowArgs {
    /// Which workflow window to evaluate.
    #[arg(long, value_enum)]
    pub kind: KindArg,

    /// When the window opened (form sent / campaign created).
    #[arg(long, value_parser = parse_instant)]
    pub start: DateTime<Utc>,

    /// Emit JSON.
    #[arg(long)]
    pub json: bool,
}

pub fn run(
    args: &WindowArgs,
    now: DateTime<Utc>,
    out: &mut impl Write,
) -> anyhow::Result<ActionWindow> {
    let start = TimePoint::Known(args.start);
    let window = deadline::validate_action(args.kind.into(), &start, now);
    if args.json {
        writeln!(out, "{}", serde_json::to_string_pretty(&window)?)?;
    } else {
        report_fmt::write_window(out, &window)?;
    }
    Ok(window)
}
