// RRT* path planning demo
//
// usage: rrt_star [config.toml]

use std::env;
use std::fs;

use log::{error, info};

use rust_rrt_star::path_planning::{RRTStar, RRTStarConfig, Steering};
use rust_rrt_star::utils::{colors, PathStyle, Visualizer};
use rust_rrt_star::{PlannerResult, PlannerState, Point2D};

const OUTPUT_DIR: &str = "./img/path_planning";

fn load_config() -> PlannerResult<RRTStarConfig> {
    match env::args().nth(1) {
        Some(path) => {
            info!("loading configuration from {}", path);
            let text = fs::read_to_string(&path)?;
            RRTStarConfig::from_toml_str(&text)
        }
        None => Ok(RRTStarConfig::default()),
    }
}

fn add_scenario_obstacles<S: Steering>(planner: &mut RRTStar<S>) {
    let obstacles = [
        ((100.0, 0.0), (130.0, 300.0)),
        ((200.0, 150.0), (230.0, 600.0)),
        ((300.0, 0.0), (330.0, 400.0)),
        ((380.0, 380.0), (600.0, 410.0)),
    ];
    for &((x0, y0), (x1, y1)) in obstacles.iter() {
        planner.add_obstacle(Point2D::new(x0, y0), Point2D::new(x1, y1));
    }
}

fn run_planner<S: Steering>(mut planner: RRTStar<S>, output: &str) -> PlannerResult<()> {
    add_scenario_obstacles(&mut planner);

    let budget = planner.config().max_iter;
    let state = planner.run(budget, |_, outcome| {
        if outcome.rewired > 0 {
            log::debug!("iteration {}: rewired {}", outcome.iteration, outcome.rewired);
        }
    });

    let path = planner.path_2d();
    match state {
        PlannerState::Reached => info!(
            "goal reached after {} iterations, path length {:.2}",
            planner.iteration(),
            path.total_length()
        ),
        _ => info!(
            "budget exhausted after {} iterations, best-effort path with {} waypoints",
            planner.iteration(),
            path.len()
        ),
    }

    let config = planner.config();
    let mut vis = Visualizer::new();
    vis.set_title("RRT*")
        .set_world(config.world_width, config.world_height)
        .plot_tree(planner.tree())
        .plot_obstacles(planner.obstacles());

    if planner.steering().uses_heading() {
        // follow the stored edge curves so the drawn path is the driven one
        let curves: Vec<Vec<Point2D>> = planner
            .path()
            .iter()
            .map(|&id| planner.node_curve(id).to_vec())
            .collect();
        vis.plot_polylines(&curves, &PathStyle::new(colors::PATH, "Path"));
    } else {
        vis.plot_path(&path, &PathStyle::default());
    }
    vis.plot_start(config.start.position())
        .plot_goal(config.goal.position());

    vis.save_svg(output)?;
    info!("plot saved to {}", output);
    Ok(())
}

fn try_main() -> PlannerResult<()> {
    let config = load_config()?;
    fs::create_dir_all(OUTPUT_DIR)?;

    if config.turning_radius.is_some() {
        let output = format!("{}/rrt_star_dubins.svg", OUTPUT_DIR);
        run_planner(RRTStar::dubins(config)?, &output)
    } else {
        let output = format!("{}/rrt_star.svg", OUTPUT_DIR);
        run_planner(RRTStar::new(config)?, &output)
    }
}

fn main() {
    env_logger::init();

    if let Err(e) = try_main() {
        error!("{}", e);
        std::process::exit(1);
    }
}
