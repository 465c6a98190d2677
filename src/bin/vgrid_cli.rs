//! CLI tool for vgrid - lays out a grid headlessly and prints its metrics
//!
//! Usage:
//!   vgrid_cli <rows> <cols>                         # 1280x800 canvas, default config
//!   vgrid_cli <rows> <cols> --config grid.json      # Config overrides from a JSON file
//!   vgrid_cli <rows> <cols> --size 640x480          # Canvas size in CSS pixels
//!   vgrid_cli <rows> <cols> --merge 1,1,2,2         # Add a merge (repeatable)
//!
//! The grid is rendered once on the render worker thread into a display
//! list; the metrics snapshot it reports is written to stdout as JSON.

#![allow(clippy::exit)]

use std::env;
use std::fs;
use std::io::{self, Write};
use std::thread;
use std::time::{Duration, Instant};

use vgrid::config::GridConfig;
use vgrid::model::GridData;
use vgrid::protocol::MetricsSnapshot;
use vgrid::render::{DisplayList, MonospaceLayout, RenderEngine, RenderThread};
use vgrid::types::MergeRange;
use vgrid::viewer::GridView;
use vgrid::{GridError, Result};

const USAGE: &str =
    "Usage: vgrid_cli <rows> <cols> [--config file.json] [--size WxH] [--merge r,c,rows,cols]...";

struct Args {
    rows: u32,
    cols: u32,
    config: GridConfig,
    size: (f64, f64),
    merges: Vec<MergeRange>,
}

fn usage_error(message: String) -> GridError {
    GridError::Config(format!("{message}\n{USAGE}"))
}

fn parse_count(raw: Option<&String>, what: &str) -> Result<u32> {
    let raw = raw.ok_or_else(|| usage_error(format!("Missing {what} count")))?;
    raw.parse()
        .map_err(|_| usage_error(format!("Invalid {what} count: {raw}")))
}

fn parse_args(args: &[String]) -> Result<Args> {
    let mut parsed = Args {
        rows: parse_count(args.get(1), "row")?,
        cols: parse_count(args.get(2), "column")?,
        config: GridConfig::default(),
        size: (1280.0, 800.0),
        merges: Vec::new(),
    };
    let mut rest = args.iter().skip(3);
    while let Some(flag) = rest.next() {
        let value = rest
            .next()
            .ok_or_else(|| usage_error(format!("Missing value for {flag}")))?;
        match flag.as_str() {
            "--config" => {
                let json = fs::read_to_string(value)?;
                parsed.config = GridConfig::from_json(&json)?;
            }
            "--size" => {
                parsed.size = value
                    .split_once('x')
                    .and_then(|(w, h)| Some((w.parse().ok()?, h.parse().ok()?)))
                    .ok_or_else(|| usage_error(format!("Invalid size: {value}")))?;
            }
            "--merge" => {
                let parts: Vec<u32> = value
                    .split(',')
                    .map(str::parse)
                    .collect::<std::result::Result<_, _>>()
                    .map_err(|_| usage_error(format!("Invalid merge: {value}")))?;
                let &[row, col, rows, cols] = parts.as_slice() else {
                    return Err(usage_error(format!("Invalid merge: {value}")));
                };
                parsed.merges.push(MergeRange::new(row, col, rows, cols));
            }
            other => return Err(usage_error(format!("Unknown option {other}"))),
        }
    }
    Ok(parsed)
}

fn run() -> Result<()> {
    let args = parse_args(&env::args().collect::<Vec<_>>())?;
    let config = args.config;

    let mut grid = GridData::new(
        args.rows,
        args.cols,
        config.default_row_height,
        config.default_col_width,
    );
    for merge in args.merges {
        grid.try_add_merge(merge)?;
    }

    let mirror = grid.empty_like();
    let engine_config = config.clone();
    let worker = RenderThread::spawn(move || {
        Ok(RenderEngine::new(
            DisplayList::new(),
            MonospaceLayout::default(),
            engine_config,
            mirror,
        ))
    })?;

    let mut view = GridView::new(grid, config, worker, args.size.0, args.size.1);
    view.flush();

    let started = Instant::now();
    let snapshot: MetricsSnapshot = loop {
        if let Some(snapshot) = view.client().metrics() {
            break *snapshot;
        }
        if started.elapsed() > Duration::from_secs(5) {
            return Err(GridError::RenderContextUnavailable(
                "timed out waiting for the render worker".into(),
            ));
        }
        thread::sleep(Duration::from_millis(2));
        view.on_frame(started.elapsed().as_secs_f64() * 1000.0);
    };
    let _ = view.shutdown();

    let json = serde_json::to_string_pretty(&snapshot)?;
    let mut stdout = io::stdout().lock();
    stdout.write_all(json.as_bytes())?;
    writeln!(stdout)?;
    Ok(())
}

fn main() {
    if let Err(e) = run() {
        eprintln!("{e}");
        std::process::exit(1);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp, clippy::panic)]
mod tests {
    use super::*;

    fn argv(rest: &[&str]) -> Vec<String> {
        std::iter::once("vgrid_cli")
            .chain(rest.iter().copied())
            .map(String::from)
            .collect()
    }

    #[test]
    fn test_parses_size_and_merges() {
        let args = parse_args(&argv(&["10", "5", "--size", "640x480", "--merge", "1,1,2,2"])).unwrap();
        assert_eq!((args.rows, args.cols), (10, 5));
        assert_eq!(args.size, (640.0, 480.0));
        assert_eq!(args.merges, vec![MergeRange::new(1, 1, 2, 2)]);
    }

    #[test]
    fn test_bad_arguments_are_config_errors() {
        for bad in [
            argv(&["10"]),
            argv(&["ten", "5"]),
            argv(&["10", "5", "--merge", "1,1,2"]),
            argv(&["10", "5", "--size"]),
            argv(&["10", "5", "--colour", "red"]),
        ] {
            match parse_args(&bad) {
                Err(GridError::Config(message)) => assert!(message.contains(USAGE)),
                Err(e) => panic!("{bad:?}: unexpected {e}"),
                Ok(_) => panic!("{bad:?}: accepted"),
            }
        }
    }

    #[test]
    fn test_missing_config_file_is_io_error() {
        let result = parse_args(&argv(&["10", "5", "--config", "/nonexistent/vgrid.json"]));
        assert!(matches!(result, Err(GridError::Io(_))));
    }
}
