// src/render.rs

//! Protein diagrams for one fusion event.
//!
//! [`layout`] turns annotated candidates into rows of coloured domain boxes in
//! residue space; [`render`] draws those rows in pixel space onto a PNG or
//! SVG backend.

use std::collections::HashMap;
use std::path::Path;

use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use plotters_backend::DrawingBackend;
use plotters_bitmap::BitMapBackend;
use plotters_svg::SVGBackend;
use tracing::debug;

use crate::config::{ImageFormat, RenderConfig};
use crate::error::FusionError;
use crate::fusion::AnnotatedFusion;
use crate::models::Domain;

// Okabe-Ito, colour-blind safe
const PALETTE: [RGBColor; 8] = [
    RGBColor(0, 119, 187),
    RGBColor(230, 159, 0),
    RGBColor(0, 158, 115),
    RGBColor(213, 94, 0),
    RGBColor(204, 121, 167),
    RGBColor(86, 180, 233),
    RGBColor(240, 228, 66),
    RGBColor(128, 128, 128),
];

const BACKBONE: RGBColor = RGBColor(190, 190, 190);
const JUNCTION: RGBColor = RGBColor(200, 0, 0);

#[derive(Debug, Clone, PartialEq)]
pub struct DomainBox {
    /// Label after renaming.
    pub label: String,
    pub color: RGBColor,
    pub start: u64,
    pub end: u64,
    pub partial: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub title: String,
    pub length: u64,
    /// Residue after which the junction line is drawn.
    pub junction: Option<u64>,
    pub domains: Vec<DomainBox>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Figure {
    pub title: String,
    /// Residues spanned by the full width of a row.
    pub scale: u64,
    pub rows: Vec<Row>,
}

/// Hands out palette colours in first-seen label order.
struct ColorAssigner<'c> {
    config: &'c RenderConfig,
    assigned: HashMap<String, RGBColor>,
}

impl<'c> ColorAssigner<'c> {
    fn new(config: &'c RenderConfig) -> Self {
        Self { config, assigned: HashMap::new() }
    }

    fn color_for(&mut self, label: &str) -> RGBColor {
        if let Some(color) = self.config.color_override(label) {
            return color;
        }
        let next = self.assigned.len();
        *self
            .assigned
            .entry(label.to_string())
            .or_insert(PALETTE[next % PALETTE.len()])
    }

    fn domain_box(&mut self, domain: &Domain, start: u64, end: u64, partial: bool) -> DomainBox {
        DomainBox {
            label: self.config.display_name(&domain.label).to_string(),
            color: self.color_for(&domain.label),
            start,
            end,
            partial,
        }
    }
}

/// Lay out one figure for an event. Candidates without a protein get no row.
pub fn layout(event_name: &str, fusions: &[AnnotatedFusion], config: &RenderConfig) -> Figure {
    let mut colors = ColorAssigner::new(config);
    let mut rows = Vec::new();

    for fusion in fusions.iter().filter(|f| !f.sequences.protein.is_empty()) {
        let domains = fusion
            .domains
            .iter()
            .map(|m| colors.domain_box(&m.domain, m.fusion_start, m.fusion_end, m.partial))
            .collect();
        rows.push(Row {
            title: format!("{} ({})", fusion.candidate.name(), fusion.sequences.effect),
            length: fusion.sequences.protein.len() as u64,
            junction: fusion.sequences.protein_junction(),
            domains,
        });

        if !config.plot_wild_type {
            continue;
        }
        let parents = [
            (&fusion.candidate.five_prime, &fusion.five_prime_domains, fusion.sequences.five_prime_junction_residue()),
            (
                &fusion.candidate.three_prime,
                &fusion.three_prime_domains,
                fusion.sequences.three_prime_junction_residue().map(|r| r.saturating_sub(1)),
            ),
        ];
        for (side, parent_domains, junction) in parents {
            let Some(protein) = side.transcript.protein.as_ref() else {
                continue;
            };
            let domains = parent_domains
                .iter()
                .map(|d| colors.domain_box(d, d.start, d.end, false))
                .collect();
            rows.push(Row {
                title: format!("{} {} (wild type)", side.gene.symbol, side.transcript.id),
                length: protein.len(),
                junction,
                domains,
            });
        }
    }

    let longest = rows.iter().map(|r| r.length).max().unwrap_or(0);
    Figure {
        title: event_name.to_string(),
        scale: config.scale.unwrap_or(longest).max(1),
        rows,
    }
}

/// Draw `figure` to `path` in the configured format.
pub fn render(figure: &Figure, config: &RenderConfig, path: &Path) -> Result<(), FusionError> {
    let size = config.pixel_size(figure.rows.len()).map_err(render_err)?;
    debug!("rendering {} row(s) to {:?} at {:?}", figure.rows.len(), path, size);
    match config.format {
        ImageFormat::Png => {
            let root = BitMapBackend::new(path, size).into_drawing_area();
            draw(&root, figure, config)
        }
        ImageFormat::Svg => {
            let root = SVGBackend::new(path, size).into_drawing_area();
            draw(&root, figure, config)
        }
    }
}

fn render_err<E: std::fmt::Display>(e: E) -> FusionError {
    FusionError::Render(e.to_string())
}

fn draw<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    figure: &Figure,
    config: &RenderConfig,
) -> Result<(), FusionError> {
    root.fill(&WHITE).map_err(render_err)?;

    let font_size = config.font_size as f64;
    if figure.rows.is_empty() {
        let (w, h) = root.dim_in_pixel();
        let style = TextStyle::from(("sans-serif", font_size))
            .color(&BLACK)
            .pos(Pos::new(HPos::Center, VPos::Center));
        let message = format!("{}: no fusion protein", figure.title);
        root.draw(&Text::new(message, (w as i32 / 2, h as i32 / 2), style))
            .map_err(render_err)?;
        return root.present().map_err(render_err);
    }

    for (area, row) in root.split_evenly((figure.rows.len(), 1)).iter().zip(&figure.rows) {
        draw_row(area, row, figure.scale, config)?;
    }
    root.present().map_err(render_err)
}

fn draw_row<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    row: &Row,
    scale: u64,
    config: &RenderConfig,
) -> Result<(), FusionError> {
    let (w, h) = area.dim_in_pixel();
    let (w, h) = (w as i32, h as i32);
    let margin = w / 20;
    let usable = (w - 2 * margin).max(1) as f64;
    let x = |residue: u64| margin + (residue as f64 / scale as f64 * usable).round() as i32;
    let mid = h / 2;
    let box_half = (h / 5).max(2);
    let font_size = config.font_size as f64;

    let title = TextStyle::from(("sans-serif", font_size))
        .color(&BLACK)
        .pos(Pos::new(HPos::Left, VPos::Top));
    area.draw(&Text::new(row.title.clone(), (margin, config.font_size as i32 / 2), title))
        .map_err(render_err)?;

    let backbone_half = (h / 24).max(1);
    area.draw(&Rectangle::new(
        [(x(0), mid - backbone_half), (x(row.length), mid + backbone_half)],
        BACKBONE.filled(),
    ))
    .map_err(render_err)?;

    let label_style = TextStyle::from(("sans-serif", font_size))
        .color(&BLACK)
        .pos(Pos::new(HPos::Center, VPos::Bottom));
    for domain in &row.domains {
        let corners = [(x(domain.start.saturating_sub(1)), mid - box_half), (x(domain.end), mid + box_half)];
        area.draw(&Rectangle::new(corners, domain.color.filled()))
            .map_err(render_err)?;
        if domain.partial {
            area.draw(&Rectangle::new(corners, BLACK.stroke_width(1)))
                .map_err(render_err)?;
        }
        if config.show_labels {
            let centre = (x(domain.start.saturating_sub(1)) + x(domain.end)) / 2;
            area.draw(&Text::new(domain.label.clone(), (centre, mid - box_half - 2), label_style.clone()))
                .map_err(render_err)?;
        }
    }

    if let Some(junction) = row.junction {
        let jx = x(junction);
        area.draw(&PathElement::new(
            vec![(jx, mid - h / 3), (jx, mid + h / 3)],
            JUNCTION.stroke_width(2),
        ))
        .map_err(render_err)?;
    }
    Ok(())
}
