//! Visualization utilities for rust_rrt_star
//!
//! Collects tree, obstacle and path layers and renders them onto a single
//! gnuplot axes when saved.

use gnuplot::{AutoOption, AxesCommon, Caption, Color, Figure, LineWidth, PointSize, PointSymbol};

use crate::common::{Path2D, PlannerError, PlannerResult, Point2D};
use crate::path_planning::obstacles::ObstacleField;
use crate::path_planning::tree::Tree;

/// Color palette for consistent styling
pub mod colors {
    pub const BLACK: &str = "#000000";
    pub const RED: &str = "#FF0000";
    pub const BLUE: &str = "#0000FF";
    pub const GRAY: &str = "#AAAAAA";

    // Semantic colors
    pub const OBSTACLE: &str = BLACK;
    pub const CLEARANCE: &str = GRAY;
    pub const TREE: &str = GRAY;
    pub const START: &str = RED;
    pub const GOAL: &str = BLUE;
    pub const PATH: &str = RED;
}

/// Style for path rendering
#[derive(Debug, Clone)]
pub struct PathStyle {
    pub color: String,
    pub line_width: f64,
    pub caption: String,
}

impl PathStyle {
    pub fn new(color: &str, caption: &str) -> Self {
        Self {
            color: color.to_string(),
            line_width: 2.0,
            caption: caption.to_string(),
        }
    }

    pub fn with_line_width(mut self, width: f64) -> Self {
        self.line_width = width;
        self
    }
}

impl Default for PathStyle {
    fn default() -> Self {
        Self::new(colors::PATH, "Path")
    }
}

/// Style for point rendering
#[derive(Debug, Clone)]
pub struct PointStyle {
    pub color: String,
    pub size: f64,
    pub symbol: char,
    pub caption: String,
}

impl PointStyle {
    pub fn new(color: &str, caption: &str) -> Self {
        Self {
            color: color.to_string(),
            size: 1.0,
            symbol: 'O',
            caption: caption.to_string(),
        }
    }

    pub fn with_size(mut self, size: f64) -> Self {
        self.size = size;
        self
    }
}

/// One drawable series. Polylines separated by NaN break into pieces.
#[derive(Debug, Clone)]
enum Layer {
    Lines { x: Vec<f64>, y: Vec<f64>, style: PathStyle },
    Points { x: Vec<f64>, y: Vec<f64>, style: PointStyle },
}

/// Main visualizer struct
pub struct Visualizer {
    layers: Vec<Layer>,
    title: String,
    x_range: Option<(f64, f64)>,
    y_range: Option<(f64, f64)>,
}

impl Visualizer {
    pub fn new() -> Self {
        Self {
            layers: Vec::new(),
            title: String::new(),
            x_range: None,
            y_range: None,
        }
    }

    pub fn set_title(&mut self, title: &str) -> &mut Self {
        self.title = title.to_string();
        self
    }

    /// Fix both axes to the planning world.
    pub fn set_world(&mut self, width: f64, height: f64) -> &mut Self {
        self.x_range = Some((0.0, width));
        self.y_range = Some((0.0, height));
        self
    }

    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    /// Draw several polylines as one series.
    pub fn plot_polylines(&mut self, polylines: &[Vec<Point2D>], style: &PathStyle) -> &mut Self {
        let mut x = Vec::new();
        let mut y = Vec::new();
        for line in polylines.iter().filter(|line| line.len() >= 2) {
            if !x.is_empty() {
                x.push(f64::NAN);
                y.push(f64::NAN);
            }
            x.extend(line.iter().map(|p| p.x));
            y.extend(line.iter().map(|p| p.y));
        }
        if !x.is_empty() {
            self.layers.push(Layer::Lines { x, y, style: style.clone() });
        }
        self
    }

    /// Every edge curve of the tree.
    pub fn plot_tree(&mut self, tree: &Tree) -> &mut Self {
        let edges: Vec<Vec<Point2D>> = tree
            .nodes()
            .iter()
            .map(|node| node.curve().to_vec())
            .collect();
        self.plot_polylines(&edges, &PathStyle::new(colors::TREE, "Tree").with_line_width(0.5))
    }

    /// Obstacle outlines, with the clearance margin drawn around them.
    pub fn plot_obstacles(&mut self, field: &ObstacleField) -> &mut Self {
        let outline = |min: Point2D, max: Point2D| {
            vec![
                min,
                Point2D::new(max.x, min.y),
                max,
                Point2D::new(min.x, max.y),
                min,
            ]
        };
        let raw: Vec<Vec<Point2D>> = field
            .obstacles()
            .iter()
            .map(|rect| outline(rect.min, rect.max))
            .collect();
        let inflated: Vec<Vec<Point2D>> = field
            .obstacles()
            .iter()
            .map(|rect| rect.inflated(field.clearance()))
            .map(|rect| outline(rect.min, rect.max))
            .collect();

        self.plot_polylines(&inflated, &PathStyle::new(colors::CLEARANCE, "Clearance").with_line_width(1.0));
        self.plot_polylines(&raw, &PathStyle::new(colors::OBSTACLE, "Obstacles"))
    }

    pub fn plot_path(&mut self, path: &Path2D, style: &PathStyle) -> &mut Self {
        self.plot_polylines(&[path.points.clone()], style)
    }

    pub fn plot_point(&mut self, point: Point2D, style: &PointStyle) -> &mut Self {
        self.layers.push(Layer::Points {
            x: vec![point.x],
            y: vec![point.y],
            style: style.clone(),
        });
        self
    }

    pub fn plot_start(&mut self, point: Point2D) -> &mut Self {
        self.plot_point(point, &PointStyle::new(colors::START, "Start").with_size(1.5))
    }

    pub fn plot_goal(&mut self, point: Point2D) -> &mut Self {
        self.plot_point(point, &PointStyle::new(colors::GOAL, "Goal").with_size(1.5))
    }

    fn render(&self) -> Figure {
        let mut figure = Figure::new();
        let axes = figure.axes2d();

        for layer in &self.layers {
            match layer {
                Layer::Lines { x, y, style } => {
                    axes.lines(x, y, &[
                        Caption(&style.caption),
                        Color(&style.color),
                        LineWidth(style.line_width),
                    ]);
                }
                Layer::Points { x, y, style } => {
                    axes.points(x, y, &[
                        Caption(&style.caption),
                        Color(&style.color),
                        PointSymbol(style.symbol),
                        PointSize(style.size),
                    ]);
                }
            }
        }

        if !self.title.is_empty() {
            axes.set_title(&self.title, &[]);
        }
        axes.set_x_label("X", &[]);
        axes.set_y_label("Y", &[]);
        if let Some((min, max)) = self.x_range {
            axes.set_x_range(AutoOption::Fix(min), AutoOption::Fix(max));
        }
        if let Some((min, max)) = self.y_range {
            axes.set_y_range(AutoOption::Fix(min), AutoOption::Fix(max));
        }
        axes.set_aspect_ratio(AutoOption::Fix(1.0));

        figure
    }

    /// Save plot to SVG file
    pub fn save_svg(&self, path: &str) -> PlannerResult<()> {
        self.render()
            .save_to_svg(path, 800, 800)
            .map_err(|e| PlannerError::VisualizationError(e.to_string()))
    }
}

impl Default for Visualizer {
    fn default() -> Self {
        Self::new()
    }
}
