// src/config.rs

use std::collections::HashMap;

use clap::ValueEnum;
use plotters::style::RGBColor;
use tracing::warn;

use crate::error::RunError;
use crate::models::GenomeBuild;

/// Protein feature databases shown when the caller does not pick any.
pub const DEFAULT_PROTEIN_DATABASES: [&str; 2] = ["Pfam", "transmembrane"];

/// Settings that decide which candidates are built and how they are exported.
#[derive(Debug, Clone)]
pub struct AnnotateOptions {
    pub build: GenomeBuild,
    pub include_noncanonical: bool,
    /// Declaration order is also the domain rendering order.
    pub protein_databases: Vec<String>,
    /// Insert a junction marker into exported sequences.
    pub junction_marker: bool,
}

impl AnnotateOptions {
    pub fn new(build: GenomeBuild) -> Self {
        Self {
            build,
            include_noncanonical: false,
            protein_databases: DEFAULT_PROTEIN_DATABASES.iter().map(|s| s.to_string()).collect(),
            junction_marker: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ImageFormat {
    Png,
    Svg,
}

impl ImageFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Svg => "svg",
        }
    }
}

/// What to do when a batch event's output directory already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DuplicatePolicy {
    Overwrite,
    Skip,
}

/// Immutable rendering settings, built once per run.
#[derive(Debug, Clone)]
pub struct RenderConfig {
    pub(crate) rename: HashMap<String, String>,
    pub(crate) recolor: HashMap<String, RGBColor>,
    pub width_in: u32,
    pub height_in: u32,
    pub dpi: u32,
    pub font_size: u32,
    /// Fixed x-axis length in residues; the longest protein when `None`.
    pub scale: Option<u64>,
    pub show_labels: bool,
    pub plot_wild_type: bool,
    pub format: ImageFormat,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            rename: HashMap::new(),
            recolor: HashMap::new(),
            width_in: 10,
            height_in: 3,
            dpi: 100,
            font_size: 12,
            scale: None,
            show_labels: true,
            plot_wild_type: false,
            format: ImageFormat::Png,
        }
    }
}

impl RenderConfig {
    /// Build the rename and recolor maps from `"original;replacement"` pairs.
    pub fn with_maps(self, rename: &[String], recolor: &[String]) -> Result<Self, RunError> {
        let rename = parse_mapping("rename", rename)?;
        let recolor = parse_mapping("recolor", recolor)?
            .into_iter()
            .map(|(label, color)| parse_color(&color).map(|c| (label, c)))
            .collect::<Result<HashMap<_, _>, _>>()?;
        Ok(Self { rename, recolor, ..self })
    }

    /// Label to print for a domain.
    pub fn display_name<'a>(&'a self, label: &'a str) -> &'a str {
        self.rename.get(label).map(String::as_str).unwrap_or(label)
    }

    pub fn color_override(&self, label: &str) -> Option<RGBColor> {
        self.recolor.get(label).copied()
    }

    /// Pixel size of a figure with `rows` protein rows.
    pub fn pixel_size(&self, rows: usize) -> Result<(u32, u32), RunError> {
        let too_large = || RunError::ImageTooLarge {
            width_in: self.width_in,
            height_in: self.height_in,
            dpi: self.dpi,
            rows,
        };
        let row_count = u32::try_from(rows.max(1)).map_err(|_| too_large())?;
        let width = self.width_in.checked_mul(self.dpi).ok_or_else(too_large)?;
        let height = self
            .height_in
            .checked_mul(self.dpi)
            .and_then(|h| h.checked_mul(row_count))
            .ok_or_else(too_large)?;
        Ok((width, height))
    }
}

/// Parse `"original;replacement"` pairs. A repeated key keeps its first value.
pub fn parse_mapping(flag: &'static str, pairs: &[String]) -> Result<HashMap<String, String>, RunError> {
    let mut mapping = HashMap::new();
    for pair in pairs {
        let parts: Vec<&str> = pair.split(';').collect();
        let [original, replacement] = parts.as_slice() else {
            return Err(RunError::MalformedMapping { flag, value: pair.clone() });
        };
        let (original, replacement) = (original.trim(), replacement.trim());
        if original.is_empty() || replacement.is_empty() {
            return Err(RunError::MalformedMapping { flag, value: pair.clone() });
        }
        if let Some(kept) = mapping.get(original) {
            warn!(
                "--{} given twice for {}, keeping '{}' and ignoring '{}'",
                flag, original, kept, replacement
            );
            continue;
        }
        mapping.insert(original.to_string(), replacement.to_string());
    }
    Ok(mapping)
}

/// Parse `#RRGGBB` or one of a handful of colour names.
pub fn parse_color(value: &str) -> Result<RGBColor, RunError> {
    let value = value.trim();
    if let Some(hex) = value.strip_prefix('#') {
        if hex.len() == 6 && hex.is_ascii() {
            let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16);
            if let (Ok(r), Ok(g), Ok(b)) = (channel(0), channel(2), channel(4)) {
                return Ok(RGBColor(r, g, b));
            }
        }
        return Err(RunError::InvalidColor(value.to_string()));
    }
    let color = match value.to_ascii_lowercase().as_str() {
        "black" => RGBColor(0, 0, 0),
        "white" => RGBColor(255, 255, 255),
        "red" => RGBColor(255, 0, 0),
        "green" => RGBColor(0, 128, 0),
        "blue" => RGBColor(0, 0, 255),
        "yellow" => RGBColor(255, 255, 0),
        "orange" => RGBColor(255, 165, 0),
        "purple" => RGBColor(128, 0, 128),
        "pink" => RGBColor(255, 192, 203),
        "brown" => RGBColor(165, 42, 42),
        "grey" | "gray" => RGBColor(128, 128, 128),
        "cyan" => RGBColor(0, 255, 255),
        "magenta" => RGBColor(255, 0, 255),
        _ => return Err(RunError::InvalidColor(value.to_string())),
    };
    Ok(color)
}
