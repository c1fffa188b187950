use crate::compiler::PLOT_HEIGHT_SHARE;
use crate::ir::{DrawCommand, LabelPlacement, SceneGraph};
use crate::{OutputFormat, RenderOptions};
use anyhow::{anyhow, Context, Result};
use image::ImageEncoder;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use plotters::style::{FontStyle, FontTransform};

/// Largest canvas accepted, in pixels.
const MAX_CANVAS_PIXELS: usize = 100_000_000;

/// Pixel layout of the plot area inside the canvas.
#[derive(Debug, Clone, Copy)]
struct PlotArea {
    left: f64,
    top: f64,
    width: f64,
    height: f64,
}

impl PlotArea {
    fn for_canvas(width: u32, height: u32) -> Self {
        let (w, h) = (width as f64, height as f64);
        PlotArea {
            left: w * 0.10,
            top: h * 0.08,
            width: w * 0.70,
            height: h * PLOT_HEIGHT_SHARE,
        }
    }

    /// Unit plot coordinates (y up) to backend pixels (y down).
    fn to_px(&self, (x, y): (f64, f64)) -> (i32, i32) {
        (
            (self.left + x * self.width).round() as i32,
            (self.top + (1.0 - y) * self.height).round() as i32,
        )
    }

    fn bottom(&self) -> i32 {
        (self.top + self.height).round() as i32
    }
}

/// Render a compiled scene to PNG or SVG bytes.
pub fn render_scene(scene: &SceneGraph, options: &RenderOptions) -> Result<Vec<u8>> {
    if scene.width == 0 || scene.height == 0 {
        anyhow::bail!("Cannot render a {}x{} canvas", scene.width, scene.height);
    }
    let buffer_len = (scene.width as usize)
        .checked_mul(scene.height as usize)
        .filter(|pixels| *pixels <= MAX_CANVAS_PIXELS)
        .and_then(|pixels| pixels.checked_mul(3))
        .ok_or_else(|| anyhow!("Canvas {}x{} is too large", scene.width, scene.height))?;

    match options.format {
        OutputFormat::Png => {
            let mut buffer = vec![0u8; buffer_len];
            {
                let root = BitMapBackend::with_buffer(&mut buffer, (scene.width, scene.height))
                    .into_drawing_area();
                draw_scene(&root, scene)?;
                root.present()
                    .map_err(|e| anyhow!("Failed to present drawing: {:?}", e))?;
            }
            encode_png(&buffer, scene.width, scene.height)
        }
        OutputFormat::Svg => {
            let mut svg = String::new();
            {
                let root = SVGBackend::with_string(&mut svg, (scene.width, scene.height))
                    .into_drawing_area();
                draw_scene(&root, scene)?;
                root.present()
                    .map_err(|e| anyhow!("Failed to present drawing: {:?}", e))?;
            }
            Ok(svg.into_bytes())
        }
    }
}

fn encode_png(buffer: &[u8], width: u32, height: u32) -> Result<Vec<u8>> {
    let mut png_bytes = Vec::new();
    image::codecs::png::PngEncoder::new(&mut png_bytes)
        .write_image(buffer, width, height, image::ColorType::Rgb8)
        .context("Failed to encode PNG")?;
    Ok(png_bytes)
}

fn draw_scene<DB: DrawingBackend>(root: &DrawingArea<DB, Shift>, scene: &SceneGraph) -> Result<()> {
    root.fill(&WHITE)
        .map_err(|e| anyhow!("Failed to fill background: {:?}", e))?;

    let area = PlotArea::for_canvas(scene.width, scene.height);
    let has_axes = !scene.category_ticks.is_empty() || scene.x_label.is_some();

    if has_axes {
        draw_axes(root, scene, &area)?;
    }

    for command in &scene.commands {
        match command {
            DrawCommand::DrawRect { tl, br, color, label, .. } => {
                let fill = parse_color(color);
                let top_left = area.to_px(*tl);
                let bottom_right = area.to_px(*br);
                root.draw(&Rectangle::new([top_left, bottom_right], fill.filled()))
                    .map_err(|e| anyhow!("Failed to draw bar: {:?}", e))?;

                if let Some(label) = label {
                    let x = (top_left.0 + bottom_right.0) / 2;
                    let (y, text_color, v_pos) = match label.placement {
                        LabelPlacement::Inside => (top_left.1 + 4, WHITE, VPos::Top),
                        LabelPlacement::Above => (top_left.1 - 4, BLACK, VPos::Bottom),
                    };
                    let style = ("sans-serif", 12)
                        .into_font()
                        .color(&text_color)
                        .pos(Pos::new(HPos::Center, v_pos));
                    root.draw(&Text::new(label.text.clone(), (x, y), style))
                        .map_err(|e| anyhow!("Failed to draw bar label: {:?}", e))?;
                }
            }
            DrawCommand::DrawLine { points, color, .. } => {
                let stroke = parse_color(color);
                let px: Vec<(i32, i32)> = points.iter().map(|p| area.to_px(*p)).collect();
                root.draw(&PathElement::new(px.clone(), stroke.stroke_width(2)))
                    .map_err(|e| anyhow!("Failed to draw line: {:?}", e))?;
                for p in px {
                    root.draw(&Circle::new(p, 3, stroke.filled()))
                        .map_err(|e| anyhow!("Failed to draw line point: {:?}", e))?;
                }
            }
            DrawCommand::DrawSlice { start_angle, end_angle, color, label, percent, .. } => {
                draw_slice(root, &area, *start_angle, *end_angle, color, &format!("{} ({})", label, percent))?;
            }
            DrawCommand::DrawTable { columns, rows } => {
                draw_table(root, scene, columns, rows)?;
            }
        }
    }

    draw_legend(root, scene, &area)
}

fn draw_axes<DB: DrawingBackend>(root: &DrawingArea<DB, Shift>, scene: &SceneGraph, area: &PlotArea) -> Result<()> {
    let axis_style = BLACK.stroke_width(1);
    let origin = area.to_px((0.0, 0.0));
    let x_end = area.to_px((1.0, 0.0));
    let y_end = area.to_px((0.0, 1.0));

    root.draw(&PathElement::new(vec![origin, x_end], axis_style))
        .map_err(|e| anyhow!("Failed to draw x axis: {:?}", e))?;
    root.draw(&PathElement::new(vec![origin, y_end], axis_style))
        .map_err(|e| anyhow!("Failed to draw y axis: {:?}", e))?;

    let tick_font = if scene.rotate_category_labels {
        ("sans-serif", 11).into_font().transform(FontTransform::Rotate270)
    } else {
        ("sans-serif", 11).into_font()
    };

    for tick in &scene.category_ticks {
        let (x, _) = area.to_px((tick.x, 0.0));
        let style = tick_font
            .clone()
            .color(&BLACK)
            .pos(Pos::new(HPos::Center, VPos::Top));
        root.draw(&Text::new(tick.label.clone(), (x, area.bottom() + 6), style))
            .map_err(|e| anyhow!("Failed to draw category label: {:?}", e))?;
    }

    let label_style = |h: HPos| ("sans-serif", 14).into_font().color(&BLACK).pos(Pos::new(h, VPos::Center));
    if let Some(x_label) = &scene.x_label {
        let x = (area.left + area.width / 2.0).round() as i32;
        let y = scene.height as i32 - 12;
        root.draw(&Text::new(x_label.clone(), (x, y), label_style(HPos::Center)))
            .map_err(|e| anyhow!("Failed to draw x label: {:?}", e))?;
    }
    if let Some(y_label) = &scene.y_label {
        let style = ("sans-serif", 14)
            .into_font()
            .transform(FontTransform::Rotate270)
            .color(&BLACK)
            .pos(Pos::new(HPos::Center, VPos::Center));
        let y = (area.top + area.height / 2.0).round() as i32;
        root.draw(&Text::new(y_label.clone(), (16, y), style))
            .map_err(|e| anyhow!("Failed to draw y label: {:?}", e))?;
    }
    Ok(())
}

fn draw_slice<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    area: &PlotArea,
    start: f64,
    end: f64,
    color: &str,
    caption: &str,
) -> Result<()> {
    if end <= start {
        return Ok(());
    }

    let cx = area.left + area.width / 2.0;
    let cy = area.top + area.height / 2.0;
    let radius = area.width.min(area.height) / 2.0 * 0.9;

    // Angles run clockwise from 12 o'clock; screen y grows downwards.
    let point = |angle: f64, r: f64| -> (i32, i32) {
        ((cx + r * angle.sin()).round() as i32, (cy - r * angle.cos()).round() as i32)
    };

    let steps = (((end - start) / 0.03).ceil() as usize).max(2);
    let mut polygon = vec![point(0.0, 0.0)];
    for step in 0..=steps {
        polygon.push(point(start + (end - start) * step as f64 / steps as f64, radius));
    }

    root.draw(&Polygon::new(polygon, parse_color(color).filled()))
        .map_err(|e| anyhow!("Failed to draw pie slice: {:?}", e))?;

    let mid = (start + end) / 2.0;
    let style = ("sans-serif", 12)
        .into_font()
        .color(&BLACK)
        .pos(Pos::new(HPos::Center, VPos::Center));
    root.draw(&Text::new(caption.to_string(), point(mid, radius * 0.65), style))
        .map_err(|e| anyhow!("Failed to draw pie label: {:?}", e))?;
    Ok(())
}

fn draw_table<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    scene: &SceneGraph,
    columns: &[String],
    rows: &[Vec<String>],
) -> Result<()> {
    if columns.is_empty() {
        return Ok(());
    }
    let margin = 10;
    let row_height = 20;
    let col_width = ((scene.width as i32 - 2 * margin) / columns.len() as i32).max(1);

    let header_style = ("sans-serif", 13).into_font().style(FontStyle::Bold).color(&BLACK);
    for (c, column) in columns.iter().enumerate() {
        let x = margin + c as i32 * col_width + 4;
        root.draw(&Text::new(column.clone(), (x, margin), header_style.clone()))
            .map_err(|e| anyhow!("Failed to draw table header: {:?}", e))?;
    }

    let rule_y = margin + row_height - 2;
    root.draw(&PathElement::new(
        vec![(margin, rule_y), (scene.width as i32 - margin, rule_y)],
        BLACK.stroke_width(1),
    ))
    .map_err(|e| anyhow!("Failed to draw table rule: {:?}", e))?;

    let cell_style = ("sans-serif", 12).into_font().color(&BLACK);
    for (r, row) in rows.iter().enumerate() {
        let y = margin + (r as i32 + 1) * row_height;
        if y > scene.height as i32 - row_height {
            break;
        }
        for (c, cell) in row.iter().enumerate() {
            let x = margin + c as i32 * col_width + 4;
            root.draw(&Text::new(cell.clone(), (x, y), cell_style.clone()))
                .map_err(|e| anyhow!("Failed to draw table cell: {:?}", e))?;
        }
    }
    Ok(())
}

fn draw_legend<DB: DrawingBackend>(root: &DrawingArea<DB, Shift>, scene: &SceneGraph, area: &PlotArea) -> Result<()> {
    let x = (area.left + area.width).round() as i32 + 20;
    let mut y = area.top.round() as i32;
    let style = ("sans-serif", 12)
        .into_font()
        .color(&BLACK)
        .pos(Pos::new(HPos::Left, VPos::Center));

    for entry in &scene.legend {
        let swatch = parse_color(&entry.color);
        root.draw(&Rectangle::new([(x, y - 5), (x + 10, y + 5)], swatch.filled()))
            .map_err(|e| anyhow!("Failed to draw legend swatch: {:?}", e))?;
        root.draw(&Text::new(entry.label.clone(), (x + 16, y), style.clone()))
            .map_err(|e| anyhow!("Failed to draw legend label: {:?}", e))?;
        y += 18;
    }
    Ok(())
}

/// Parse a `#rrggbb` color; anything else renders blue.
fn parse_color(color: &str) -> RGBColor {
    let hex = color.trim_start_matches('#');
    if hex.len() == 6 {
        if let (Ok(r), Ok(g), Ok(b)) = (
            u8::from_str_radix(&hex[0..2], 16),
            u8::from_str_radix(&hex[2..4], 16),
            u8::from_str_radix(&hex[4..6], 16),
        ) {
            return RGBColor(r, g, b);
        }
    }
    BLUE
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::compile_scene;
    use crate::config::{ChartType, DisplayOptions};
    use crate::ir::{ChartOutput, ChartSpec, Series};
    use std::collections::BTreeMap;

    fn svg_options() -> RenderOptions {
        RenderOptions {
            width: 400,
            height: 300,
            format: OutputFormat::Svg,
        }
    }

    fn chart(chart_type: ChartType) -> ChartOutput {
        ChartOutput::Chart(ChartSpec {
            chart_type,
            categories: vec!["East".into(), "West".into()],
            series: vec![Series {
                name: "sales".into(),
                original_name: "sales".into(),
                data: vec![100.0, 9000.0],
            }],
            x_label: "region".into(),
            y_label: "sales".into(),
            series_formats: BTreeMap::new(),
            display_options: DisplayOptions {
                show_values_on_bars: true,
                ..Default::default()
            },
        })
    }

    #[test]
    fn test_parse_color() {
        let parsed = parse_color("#4e79a7");
        assert_eq!((parsed.0, parsed.1, parsed.2), (0x4e, 0x79, 0xa7));
        let fallback = parse_color("teal");
        assert_eq!((fallback.0, fallback.1, fallback.2), (BLUE.0, BLUE.1, BLUE.2));
    }

    #[test]
    fn test_render_svg_for_each_chart_type() {
        let options = svg_options();
        for chart_type in [ChartType::Bar, ChartType::Line, ChartType::Pie] {
            let scene = compile_scene(&chart(chart_type), &options);
            let bytes = render_scene(&scene, &options).unwrap();
            let svg = String::from_utf8(bytes).unwrap();
            assert!(svg.contains("<svg"), "{:?} did not produce svg", chart_type);
            assert!(svg.contains("East"));
        }
    }

    #[test]
    fn test_render_rejects_empty_canvas() {
        let options = RenderOptions {
            width: 0,
            ..svg_options()
        };
        let scene = compile_scene(&chart(ChartType::Bar), &options);
        assert!(render_scene(&scene, &options).is_err());
    }

    #[test]
    fn test_render_rejects_oversized_canvas() {
        let options = RenderOptions {
            width: 40_000,
            height: 40_000,
            format: OutputFormat::Png,
        };
        let scene = compile_scene(&chart(ChartType::Bar), &options);
        let err = render_scene(&scene, &options).unwrap_err();
        assert!(err.to_string().contains("too large"));
    }

    #[test]
    fn test_plot_area_flips_y() {
        let area = PlotArea::for_canvas(100, 100);
        assert_eq!(area.to_px((0.0, 0.0)), (10, 83));
        assert_eq!(area.to_px((1.0, 1.0)), (80, 8));
    }
}
