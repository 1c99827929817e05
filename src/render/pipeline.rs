//! # Render Pipeline
//!
//! Runs once per document, inside `generate`:
//!
//! 1. **Plan.** Walk the frozen pages and turn every row into a
//!    [`RenderUnit`] with a global sequence number and its top edge.
//! 2. **Render.** Either on the calling thread (pool size 0 or 1) or on a
//!    scoped pool of workers fed through a bounded work queue. Workers only
//!    read the document; each produces one [`RenderedUnit`].
//! 3. **Collect.** The calling thread drops every result into a pre-sized
//!    slot at its sequence number. Completion order does not matter.
//! 4. **Assemble.** Once every slot is filled, fragments go to the encoder
//!    page by page in row order, followed by debug outlines and the page
//!    number. Only this thread ever touches the encoder, so the output is
//!    byte-identical whatever the pool size.
//!
//! The first block failure raises a shared cancel flag: the dispatcher
//! stops queueing, workers skip what is left, and every result is thrown
//! away. The error reported is the lowest-sequence failure seen.

use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use log::{debug, info, warn};

use super::{BlockRenderer, DrawOp, Fragment, Rect};
use crate::config::{Config, Place};
use crate::error::{BlockError, GridError};
use crate::font;
use crate::layout::grid;
use crate::model::{Color, Component, FontStyle, Page, Row};
use crate::pdf::Encoder;
use crate::report::{Report, UnitTiming};

/// One row scheduled for rendering.
#[derive(Debug, Clone, Copy)]
pub struct RenderUnit<'a> {
    /// Position in document order, from 0.
    pub seq: usize,
    /// 1-based page number.
    pub page: usize,
    /// 1-based row number within the page.
    pub row: usize,
    /// Top edge of the row, in millimetres from the top of the page.
    pub top: f64,
    pub data: &'a Row,
}

/// A finished unit, waiting for assembly.
#[derive(Debug, Clone)]
pub struct RenderedUnit {
    pub seq: usize,
    pub page: usize,
    pub row: usize,
    pub fragment: Fragment,
    pub duration: Duration,
    pub worker: usize,
}

pub struct Pipeline<'a> {
    config: &'a Config,
    renderer: &'a dyn BlockRenderer,
}

impl<'a> Pipeline<'a> {
    pub fn new(config: &'a Config, renderer: &'a dyn BlockRenderer) -> Self {
        Self { config, renderer }
    }

    /// Render `pages` and feed them to `encoder`.
    pub fn run<E: Encoder>(&self, pages: &[Page], mut encoder: E) -> Result<(Vec<u8>, Report), GridError> {
        let started = Instant::now();
        let units = plan(pages, self.config);
        let workers = if self.config.is_sequential() {
            1
        } else {
            self.config.worker_pool_size
        };
        info!(
            "rendering {} rows on {} pages with {} worker(s)",
            units.len(),
            pages.len(),
            workers
        );

        let render_started = Instant::now();
        let rendered = if self.config.is_sequential() {
            self.render_sequential(&units)?
        } else {
            self.render_parallel(&units, workers)?
        };
        let render_duration = render_started.elapsed();

        let page_count = self.assemble(pages, &rendered, &mut encoder)?;
        let bytes = encoder.finalize()?;

        let report = Report::new(
            page_count,
            workers,
            rendered
                .iter()
                .map(|u| UnitTiming {
                    page: u.page,
                    row: u.row,
                    duration: u.duration,
                    worker: u.worker,
                })
                .collect(),
            render_duration,
            started.elapsed(),
        );
        info!(
            "generated {} pages ({} bytes) in {:?}",
            report.pages,
            bytes.len(),
            report.total_duration
        );
        Ok((bytes, report))
    }

    fn render_sequential(&self, units: &[RenderUnit<'_>]) -> Result<Vec<RenderedUnit>, GridError> {
        units
            .iter()
            .map(|unit| {
                self.render_timed(unit, 0)
                    .map_err(|cause| render_failure(unit, cause))
            })
            .collect()
    }

    fn render_parallel(
        &self,
        units: &[RenderUnit<'_>],
        workers: usize,
    ) -> Result<Vec<RenderedUnit>, GridError> {
        let total = units.len();
        let cancel = AtomicBool::new(false);
        let (work_tx, work_rx) = crossbeam_channel::bounded::<usize>(workers * 2);
        let (result_tx, result_rx) =
            crossbeam_channel::unbounded::<(usize, Result<RenderedUnit, BlockError>)>();

        let mut slots: Vec<Option<RenderedUnit>> = (0..total).map(|_| None).collect();
        let mut completed = 0usize;
        let mut failure: Option<(usize, BlockError)> = None;

        thread::scope(|scope| {
            let cancel = &cancel;

            scope.spawn(move || {
                for seq in 0..total {
                    if cancel.load(Ordering::Relaxed) {
                        debug!("dispatcher stopping at unit {} after a failure", seq);
                        break;
                    }
                    if work_tx.send(seq).is_err() {
                        break;
                    }
                }
            });

            for worker in 0..workers {
                let work_rx = work_rx.clone();
                let result_tx = result_tx.clone();
                scope.spawn(move || {
                    for seq in work_rx.iter() {
                        if cancel.load(Ordering::Relaxed) {
                            continue;
                        }
                        let result = self.render_timed(&units[seq], worker);
                        if result.is_err() {
                            cancel.store(true, Ordering::Relaxed);
                        }
                        if result_tx.send((seq, result)).is_err() {
                            break;
                        }
                    }
                });
            }
            drop(work_rx);
            drop(result_tx);

            for (seq, result) in result_rx.iter() {
                match result {
                    Ok(unit) => {
                        slots[seq] = Some(unit);
                        completed += 1;
                    }
                    Err(cause) => {
                        warn!("unit {} failed: {}", seq, cause);
                        if failure.as_ref().map_or(true, |(first, _)| seq < *first) {
                            failure = Some((seq, cause));
                        }
                    }
                }
            }
        });

        if let Some((seq, cause)) = failure {
            return Err(render_failure(&units[seq], cause));
        }
        if completed != total {
            return Err(GridError::Encode(format!(
                "{} of {} rows came back from the render workers",
                completed, total
            )));
        }
        slots
            .into_iter()
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| GridError::Encode("render slot left empty".to_string()))
    }

    fn render_timed(&self, unit: &RenderUnit<'_>, worker: usize) -> Result<RenderedUnit, BlockError> {
        let started = Instant::now();
        let fragment = render_unit(unit, self.config, self.renderer)?;
        Ok(RenderedUnit {
            seq: unit.seq,
            page: unit.page,
            row: unit.row,
            fragment,
            duration: started.elapsed(),
            worker,
        })
    }

    /// Feed rendered units to the encoder in document order. Returns the
    /// number of pages written.
    fn assemble<E: Encoder>(
        &self,
        pages: &[Page],
        rendered: &[RenderedUnit],
        encoder: &mut E,
    ) -> Result<usize, GridError> {
        // An empty document still yields one blank page.
        let total_pages = pages.len().max(1);
        let mut units = rendered.iter();

        for page_idx in 0..total_pages {
            let page = pages.get(page_idx);
            let dimensions = page
                .and_then(Page::dimensions)
                .unwrap_or(self.config.dimensions);
            encoder.begin_page(dimensions)?;

            let row_count = page.map(|p| p.rows.len()).unwrap_or(0);
            for unit in units.by_ref().take(row_count) {
                encoder.draw_fragment(&unit.fragment)?;
            }

            if let Some(fragment) = page_number_fragment(self.config, page_idx + 1, total_pages) {
                encoder.draw_fragment(&fragment)?;
            }
            encoder.end_page()?;
        }
        Ok(total_pages)
    }
}

fn render_failure(unit: &RenderUnit<'_>, cause: BlockError) -> GridError {
    GridError::RenderFailure {
        page: unit.page,
        row: unit.row,
        cause,
    }
}

/// Assign sequence numbers and top edges to every row of every page.
pub fn plan<'a>(pages: &'a [Page], config: &Config) -> Vec<RenderUnit<'a>> {
    let mut units = Vec::new();
    for (page_idx, page) in pages.iter().enumerate() {
        let mut top = config.margins.top;
        for (row_idx, row) in page.rows.iter().enumerate() {
            units.push(RenderUnit {
                seq: units.len(),
                page: page_idx + 1,
                row: row_idx + 1,
                top,
                data: row,
            });
            top += row.height;
        }
    }
    units
}

/// Resolve a row's geometry and render every block in it.
pub fn render_unit(
    unit: &RenderUnit<'_>,
    config: &Config,
    renderer: &dyn BlockRenderer,
) -> Result<Fragment, BlockError> {
    let area = Rect::new(
        config.margins.left,
        unit.top,
        config.usable_width(),
        unit.data.height,
    );
    let extent = Extent {
        page_width: config.dimensions.width,
        left: config.margins.left,
        right: config.margins.right,
    };
    let mut fragment = Fragment::new();
    render_row(unit.data, area, extent, config, renderer, &mut fragment)?;
    Ok(fragment)
}

/// Horizontal bounds handed to [`grid::resolve`].
#[derive(Debug, Clone, Copy)]
struct Extent {
    page_width: f64,
    left: f64,
    right: f64,
}

impl Extent {
    /// Bounds of a nested row filling `cell`.
    fn within(cell: Rect) -> Self {
        Self {
            page_width: cell.x + cell.width,
            left: cell.x,
            right: 0.0,
        }
    }
}

/// Lay `row` out across `area` and append its blocks to `out`.
fn render_row(
    row: &Row,
    area: Rect,
    extent: Extent,
    config: &Config,
    renderer: &dyn BlockRenderer,
    out: &mut Fragment,
) -> Result<(), BlockError> {
    let spans: Vec<u8> = row.cols.iter().map(|c| c.span).collect();
    let spans = grid::apply_span_policy(&spans, config.span_overflow);
    let boxes = grid::resolve(&spans, extent.page_width, extent.left, extent.right);

    for ((col, span), column) in row.cols.iter().zip(&spans).zip(&boxes) {
        // Clipped away entirely.
        if *span == 0 {
            continue;
        }
        let cell = Rect::new(column.x, area.y, column.width, area.height);
        for component in &col.components {
            match component {
                Component::Rows { rows } => {
                    let mut top = cell.y;
                    for nested in rows {
                        let nested_area = Rect::new(cell.x, top, cell.width, nested.height);
                        render_row(nested, nested_area, Extent::within(cell), config, renderer, out)?;
                        top += nested.height;
                    }
                }
                block => out.append(renderer.render_block(block, cell)?),
            }
        }
        if config.debug {
            out.push(outline(cell, Color::BLUE));
        }
    }

    if config.debug {
        out.push(outline(area, Color::RED));
    }
    Ok(())
}

fn outline(rect: Rect, color: Color) -> DrawOp {
    DrawOp::Rect {
        rect,
        fill: None,
        stroke: Some(color),
        line_width: 0.1,
    }
}

/// Page number text, centred vertically in the top or bottom margin band.
fn page_number_fragment(config: &Config, current: usize, total: usize) -> Option<Fragment> {
    let page_number = config.page_number.as_ref()?;
    let text = page_number.render(current, total);
    let size = page_number.size;
    let size_mm = size * super::PT_TO_MM;
    let width = font::measure(&text, FontStyle::Normal, size) * super::PT_TO_MM;

    let left = config.margins.left;
    let right = config.dimensions.width - config.margins.right;
    let x = match page_number.place {
        Place::North | Place::South => left + (right - left - width) / 2.0,
        Place::NorthEast | Place::SouthEast => right - width,
        Place::NorthWest | Place::SouthWest => left,
    };
    let band_centre = if page_number.place.is_top() {
        config.margins.top / 2.0
    } else {
        config.dimensions.height - config.margins.bottom / 2.0
    };
    let y = band_centre + size_mm * font::ASCENT / 2.0;

    Some(Fragment {
        ops: vec![DrawOp::Text {
            x,
            y,
            size,
            style: FontStyle::Normal,
            color: Color::BLACK,
            content: text,
        }],
    })
}
