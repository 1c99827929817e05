//! # rowgrid CLI
//!
//! Usage:
//!   rowgrid input.json -o output.pdf [--report report.txt] [--workers N]
//!   echo '{ ... }' | rowgrid -o output.pdf
//!   rowgrid --example > sample.json
//!
//! Logging goes through `env_logger`; set `RUST_LOG=debug` for page-break
//! and worker detail.

use std::env;
use std::fs;
use std::io::{self, Read};
use std::process;

use log::error;

fn main() {
    env_logger::init();
    let args: Vec<String> = env::args().collect();

    if args.iter().any(|a| a == "--example") {
        print!("{}", example_json());
        return;
    }

    if let Err(message) = run(&args) {
        error!("{}", message);
        eprintln!("✗ {}", message);
        process::exit(1);
    }
}

fn run(args: &[String]) -> Result<(), String> {
    let input = if args.len() > 1 && !args[1].starts_with('-') {
        fs::read_to_string(&args[1]).map_err(|e| format!("Failed to read {}: {}", args[1], e))?
    } else {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .map_err(|e| format!("Failed to read stdin: {}", e))?;
        buf
    };

    let output_path = flag_value(args, "-o").unwrap_or_else(|| "output.pdf".to_string());
    let report_path = flag_value(args, "--report");
    let workers = match flag_value(args, "--workers") {
        Some(v) => Some(
            v.parse::<usize>()
                .map_err(|_| format!("--workers expects a number, got {:?}", v))?,
        ),
        None => None,
    };

    let document = rowgrid::render_json(&input, workers).map_err(|e| e.to_string())?;
    document.save(&output_path).map_err(|e| e.to_string())?;
    eprintln!(
        "✓ Written {} bytes ({} pages) to {}",
        document.bytes().len(),
        document.report().pages,
        output_path
    );

    if let Some(path) = report_path {
        document.report().save(&path).map_err(|e| e.to_string())?;
        eprintln!("✓ Report written to {}", path);
    }
    Ok(())
}

fn flag_value(args: &[String], flag: &str) -> Option<String> {
    args.windows(2).find(|w| w[0] == flag).map(|w| w[1].clone())
}

fn example_json() -> &'static str {
    r##"{
  "config": {
    "page_size": "A4",
    "worker_pool_size": 4,
    "debug": false,
    "page_number": { "pattern": "{current} / {total}", "place": "South" },
    "metadata": { "title": "Invoice INV-2026-001", "author": "rowgrid" }
  },
  "rows": [
    {
      "height": 20,
      "cols": [
        { "span": 8, "components": [
          { "type": "Text", "content": "INVOICE", "props": { "size": 24, "style": "Bold" } }
        ] },
        { "span": 4, "components": [
          { "type": "QrCode", "code": "https://example.com/inv/2026-001" }
        ] }
      ]
    },
    {
      "height": 10,
      "cols": [
        { "span": 4, "components": [ { "type": "Text", "content": "Bill to" } ] },
        { "span": 8, "components": [ { "type": "Text", "content": "Widget Industries\nUnit 4, Harbour Road" } ] }
      ]
    },
    { "height": 4, "cols": [ { "span": 12, "components": [ { "type": "Line" } ] } ] },
    {
      "height": 8,
      "cols": [
        { "span": 6, "components": [ { "type": "Text", "content": "Consulting, 12 hours" } ] },
        { "span": 6, "components": [
          { "type": "Text", "content": "1,440.00", "props": { "align": "Right" } }
        ] }
      ]
    },
    {
      "height": 20,
      "cols": [
        { "span": 6, "components": [ { "type": "Barcode", "code": "INV-2026-001" } ] },
        { "span": 6, "components": [ { "type": "Signature", "label": "Authorised signature" } ] }
      ]
    }
  ]
}
"##
}
