//! RRT* (optimal Rapidly-exploring Random Tree) path planning
//!
//! Grows a cost-minimizing tree from the start pose one iteration at a time:
//! sample, steer, collision check, choose the cheapest parent among the
//! neighbours, insert, rewire neighbours through the new node and test the
//! goal. The driver decides when to call [`RRTStar::step`] again, so the
//! growth can be observed between iterations.
//!
//! Nearest and near queries are linear scans over the node list.

use std::fmt;

use log::{debug, info, trace};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::Uniform;
use serde::{Deserialize, Serialize};

use crate::common::{
    Configuration, Path2D, PathPlanner, PlannerError, PlannerResult, Point2D, Pose2D,
    SamplingBasedPlanner,
};
use crate::path_planning::obstacles::ObstacleField;
use crate::path_planning::steering::{distance, DubinsSteering, Steering, StraightLine};
use crate::path_planning::tree::{Node, NodeId, Tree};

/// Configuration for the RRT* planner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RRTStarConfig {
    /// Sampling bounds are [0, world_width] x [0, world_height]
    pub world_width: f64,
    pub world_height: f64,
    pub start: Pose2D,
    pub goal: Pose2D,
    /// The goal is reached once the last node is strictly closer than this
    pub reached_threshold: f64,
    /// Maximum steering distance per extension
    pub step_size: f64,
    /// Iteration budget
    pub max_iter: usize,
    /// Margin added around every obstacle
    pub bot_clearance: f64,
    /// Minimum turning radius; only used by Dubins steering
    pub turning_radius: Option<f64>,
    /// Arclength between samples of a Dubins edge
    pub curve_resolution: f64,
    /// Neighbourhood radius as a multiple of `step_size`
    pub near_radius_factor: f64,
    /// Push cost improvements from a rewired node into its subtree
    pub propagate_cost: bool,
    /// Seed for the sampler; `None` draws one from the OS
    pub seed: Option<u64>,
}

impl Default for RRTStarConfig {
    fn default() -> Self {
        Self {
            world_width: 700.0,
            world_height: 600.0,
            start: Pose2D::new(20.0, 20.0, 0.0),
            goal: Pose2D::new(450.0, 450.0, 0.0),
            reached_threshold: 5.0,
            step_size: 3.0,
            max_iter: 3000,
            bot_clearance: 7.5,
            turning_radius: None,
            curve_resolution: 1.0,
            near_radius_factor: 3.0,
            propagate_cost: false,
            seed: None,
        }
    }
}

impl RRTStarConfig {
    /// Parse a (possibly partial) TOML document; missing keys keep defaults.
    pub fn from_toml_str(text: &str) -> PlannerResult<Self> {
        let config: RRTStarConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> PlannerResult<()> {
        fn positive(name: &str, value: f64) -> PlannerResult<()> {
            if value > 0.0 && value.is_finite() {
                Ok(())
            } else {
                Err(PlannerError::InvalidParameter(format!(
                    "{} must be positive, got {}",
                    name, value
                )))
            }
        }

        positive("world_width", self.world_width)?;
        positive("world_height", self.world_height)?;
        positive("reached_threshold", self.reached_threshold)?;
        positive("step_size", self.step_size)?;
        positive("curve_resolution", self.curve_resolution)?;
        positive("near_radius_factor", self.near_radius_factor)?;
        if let Some(radius) = self.turning_radius {
            positive("turning_radius", radius)?;
        }
        if self.max_iter == 0 {
            return Err(PlannerError::InvalidParameter(
                "max_iter must be positive".to_string(),
            ));
        }
        if !(self.bot_clearance >= 0.0) {
            return Err(PlannerError::InvalidParameter(format!(
                "bot_clearance must not be negative, got {}",
                self.bot_clearance
            )));
        }
        if !self.in_bounds(&self.start.position()) {
            return Err(PlannerError::InvalidParameter(format!(
                "start ({}, {}) lies outside the world",
                self.start.x, self.start.y
            )));
        }
        Ok(())
    }

    pub fn in_bounds(&self, p: &Point2D) -> bool {
        p.x >= 0.0 && p.x <= self.world_width && p.y >= 0.0 && p.y <= self.world_height
    }

    pub fn near_radius(&self) -> f64 {
        self.near_radius_factor * self.step_size
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlannerState {
    Idle,
    Running,
    Reached,
    Exhausted,
}

impl PlannerState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, PlannerState::Reached | PlannerState::Exhausted)
    }
}

impl fmt::Display for PlannerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            PlannerState::Idle => "idle",
            PlannerState::Running => "running",
            PlannerState::Reached => "reached destination",
            PlannerState::Exhausted => "exceeded max iterations",
        };
        write!(f, "{}", text)
    }
}

/// Snapshot of one iteration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepOutcome {
    /// 1-based iteration number since the last reset
    pub iteration: usize,
    pub state: PlannerState,
    /// Node added this iteration, if any
    pub inserted: Option<NodeId>,
    /// Neighbours re-parented through the new node
    pub rewired: usize,
    pub node_count: usize,
}

/// RRT* planner, generic over its motion model
pub struct RRTStar<S: Steering = StraightLine> {
    config: RRTStarConfig,
    steering: S,
    tree: Tree,
    obstacles: ObstacleField,
    state: PlannerState,
    iteration: usize,
    /// Goal-to-root node chain, filled on termination
    path: Vec<NodeId>,
    rng: StdRng,
    x_dist: Uniform<f64>,
    y_dist: Uniform<f64>,
}

impl RRTStar<StraightLine> {
    /// Holonomic planner with straight-line steering
    pub fn new(config: RRTStarConfig) -> PlannerResult<Self> {
        Self::with_steering(config, StraightLine)
    }
}

impl RRTStar<DubinsSteering> {
    /// Nonholonomic planner; `config.turning_radius` must be set.
    pub fn dubins(config: RRTStarConfig) -> PlannerResult<Self> {
        let radius = config.turning_radius.ok_or_else(|| {
            PlannerError::InvalidParameter("turning_radius is required for Dubins steering".to_string())
        })?;
        let steering = DubinsSteering::new(radius, config.curve_resolution)?;
        Self::with_steering(config, steering)
    }
}

impl<S: Steering> RRTStar<S> {
    pub fn with_steering(config: RRTStarConfig, steering: S) -> PlannerResult<Self> {
        config.validate()?;

        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let start = Configuration::from_pose(config.start, steering.uses_heading());

        Ok(RRTStar {
            x_dist: Uniform::new_inclusive(0.0, config.world_width),
            y_dist: Uniform::new_inclusive(0.0, config.world_height),
            obstacles: ObstacleField::new(config.bot_clearance),
            tree: Tree::new(start),
            state: PlannerState::Idle,
            iteration: 0,
            path: Vec::new(),
            rng,
            steering,
            config,
        })
    }

    pub fn config(&self) -> &RRTStarConfig {
        &self.config
    }

    pub fn steering(&self) -> &S {
        &self.steering
    }

    pub fn state(&self) -> PlannerState {
        self.state
    }

    /// Iterations performed since the last reset
    pub fn iteration(&self) -> usize {
        self.iteration
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    pub fn nodes(&self) -> &[Node] {
        self.tree.nodes()
    }

    pub fn obstacles(&self) -> &ObstacleField {
        &self.obstacles
    }

    /// Sampled curve of the edge leading into `id`.
    pub fn node_curve(&self, id: NodeId) -> &[Point2D] {
        self.tree.node(id).curve()
    }

    pub fn goal(&self) -> Point2D {
        self.config.goal.position()
    }

    /// Extracted path in goal-to-root order; empty until a terminal state.
    pub fn path(&self) -> &[NodeId] {
        &self.path
    }

    pub fn path_configurations(&self) -> Vec<Configuration> {
        self.path.iter().map(|&id| self.tree.node(id).config).collect()
    }

    /// Extracted path as root-to-goal waypoints.
    pub fn path_2d(&self) -> Path2D {
        Path2D::from_points(
            self.path
                .iter()
                .rev()
                .map(|&id| self.tree.node(id).position())
                .collect(),
        )
    }

    pub fn set_step_size(&mut self, step_size: f64) -> PlannerResult<()> {
        self.ensure_idle("step_size")?;
        let mut config = self.config.clone();
        config.step_size = step_size;
        config.validate()?;
        self.config = config;
        Ok(())
    }

    pub fn set_max_iterations(&mut self, max_iter: usize) -> PlannerResult<()> {
        self.ensure_idle("max_iter")?;
        let mut config = self.config.clone();
        config.max_iter = max_iter;
        config.validate()?;
        self.config = config;
        Ok(())
    }

    fn ensure_idle(&self, what: &str) -> PlannerResult<()> {
        if self.state == PlannerState::Idle {
            Ok(())
        } else {
            Err(PlannerError::InvalidState(format!(
                "cannot change {} while the planner is {}; reset first",
                what, self.state
            )))
        }
    }

    /// Add a rectangular obstacle from two opposite corners.
    ///
    /// Obstacles already passed by the tree are not re-checked.
    pub fn add_obstacle(&mut self, corner_a: Point2D, corner_b: Point2D) {
        self.obstacles.add_obstacle(corner_a, corner_b);
    }

    pub fn clear_obstacles(&mut self) {
        self.obstacles.clear();
    }

    /// Tear down the tree and path and return to `Idle`.
    pub fn reset(&mut self, clear_obstacles: bool) {
        if clear_obstacles {
            self.obstacles.clear();
        }
        let start = Configuration::from_pose(self.config.start, self.steering.uses_heading());
        self.tree.initialize_root(start);
        self.path.clear();
        self.iteration = 0;
        self.state = PlannerState::Idle;
        if let Some(seed) = self.config.seed {
            self.rng = StdRng::seed_from_u64(seed);
        }
        debug!("planner reset, {} obstacles kept", self.obstacles.len());
    }

    /// Draw a configuration uniformly over the world bounds.
    pub fn sample(&mut self) -> Configuration {
        let x = self.rng.sample(self.x_dist);
        let y = self.rng.sample(self.y_dist);
        Configuration {
            position: Point2D::new(x, y),
            heading: self.steering.sample_heading(&mut self.rng),
        }
    }

    /// Run one iteration with a freshly drawn sample.
    pub fn step(&mut self) -> PlannerState {
        self.advance().state
    }

    /// Run one iteration with a caller-provided sample.
    pub fn step_with_sample(&mut self, sample: Configuration) -> PlannerState {
        self.advance_with(sample).state
    }

    /// Iterate until a terminal state, spending at most `max_iterations`
    /// iterations in this call; an unspent goal after that budget ends the
    /// run as `Exhausted`. The hook sees every iteration's snapshot.
    pub fn run<F>(&mut self, max_iterations: usize, mut hook: F) -> PlannerState
    where
        F: FnMut(&Self, &StepOutcome),
    {
        let mut spent = 0;
        while !self.state.is_terminal() {
            if spent >= max_iterations {
                self.finish(PlannerState::Exhausted);
                break;
            }
            let outcome = self.advance();
            spent += 1;
            hook(&*self, &outcome);
        }
        self.state
    }

    /// Lazy sequence of iteration snapshots, ending with the terminal one.
    pub fn growth(&mut self) -> Growth<'_, S> {
        Growth { planner: self }
    }

    fn advance(&mut self) -> StepOutcome {
        if self.state.is_terminal() {
            return self.snapshot(None, 0);
        }
        let sample = self.sample();
        self.advance_with(sample)
    }

    fn advance_with(&mut self, sample: Configuration) -> StepOutcome {
        if self.state.is_terminal() {
            return self.snapshot(None, 0);
        }
        if self.state == PlannerState::Idle {
            info!(
                "RRT* start: step_size {}, max_iter {}, {} obstacles",
                self.config.step_size,
                self.config.max_iter,
                self.obstacles.len()
            );
            self.state = PlannerState::Running;
        }

        self.iteration += 1;
        if self.iteration % 100 == 0 {
            info!("Iter: {}, number of nodes: {}", self.iteration, self.tree.len());
        }

        let (inserted, rewired) = self.extend(&sample);

        if self.reached() {
            self.finish(PlannerState::Reached);
        } else if self.iteration >= self.config.max_iter {
            self.finish(PlannerState::Exhausted);
        }

        self.snapshot(inserted, rewired)
    }

    fn snapshot(&self, inserted: Option<NodeId>, rewired: usize) -> StepOutcome {
        StepOutcome {
            iteration: self.iteration,
            state: self.state,
            inserted,
            rewired,
            node_count: self.tree.len(),
        }
    }

    /// Try to grow the tree toward `sample`. Returns the inserted node and
    /// the number of rewired neighbours.
    fn extend(&mut self, sample: &Configuration) -> (Option<NodeId>, usize) {
        if !self.config.in_bounds(&sample.position) {
            debug!("sample ({}, {}) outside the world", sample.position.x, sample.position.y);
            return (None, 0);
        }

        let step_size = self.config.step_size;
        let nearest = self.tree.nearest(&sample.position);
        let nearest_config = self.tree.node(nearest).config;
        if distance(&sample.position, &nearest_config.position) <= step_size {
            return (None, 0);
        }

        let new_config = match self.steering.steer(&nearest_config, sample, step_size) {
            Some(config) => config,
            None => return (None, 0),
        };
        if self.steering.is_edge_in_obstacle(&nearest_config, &new_config, &self.obstacles) {
            return (None, 0);
        }
        let edge = match self.steering.connect(&nearest_config, &new_config) {
            Some(edge) => edge,
            None => return (None, 0),
        };

        let near = self.tree.near(&new_config.position, self.config.near_radius());
        debug!("Found {} nearby nodes", near.len());

        let (parent, edge) = self.choose_parent(nearest, edge, &new_config, &near);
        let edge_cost = self.steering.path_cost(&self.tree.node(parent).config, &new_config);
        let new_id = self.tree.insert(parent, new_config, edge_cost, edge);

        let rewired = self.rewire(new_id, &near);
        (Some(new_id), rewired)
    }

    /// Cheapest collision-free parent among `near`, starting from `nearest`.
    /// Only a strictly smaller cost replaces the current choice.
    fn choose_parent(
        &self,
        nearest: NodeId,
        nearest_edge: Vec<Point2D>,
        new_config: &Configuration,
        near: &[NodeId],
    ) -> (NodeId, Vec<Point2D>) {
        let mut best = nearest;
        let mut best_edge = nearest_edge;
        let mut best_cost = self.tree.cost(nearest)
            + self.steering.path_cost(&self.tree.node(nearest).config, new_config);

        for &candidate in near {
            let candidate_config = self.tree.node(candidate).config;
            let cost = self.tree.cost(candidate) + self.steering.path_cost(&candidate_config, new_config);
            if cost >= best_cost {
                continue;
            }
            if self.steering.is_edge_in_obstacle(&candidate_config, new_config, &self.obstacles) {
                continue;
            }
            if let Some(curve) = self.steering.connect(&candidate_config, new_config) {
                best = candidate;
                best_cost = cost;
                best_edge = curve;
            }
        }

        (best, best_edge)
    }

    fn rewire(&mut self, new_id: NodeId, near: &[NodeId]) -> usize {
        let new_config = self.tree.node(new_id).config;
        let new_cost = self.tree.cost(new_id);
        let mut rewired = 0;

        for &n in near {
            let near_config = self.tree.node(n).config;
            let cost = new_cost + self.steering.path_cost(&new_config, &near_config);
            if cost >= self.tree.cost(n) {
                continue;
            }
            if self.steering.is_edge_in_obstacle(&new_config, &near_config, &self.obstacles) {
                continue;
            }
            let curve = match self.steering.connect(&new_config, &near_config) {
                Some(curve) => curve,
                None => continue,
            };

            trace!("rewire {:?}: cost {} -> {}", n, self.tree.cost(n), cost);
            self.tree.rewire(n, new_id, cost, curve);
            if self.config.propagate_cost {
                let steering = &self.steering;
                self.tree.propagate_cost(n, |a, b| steering.path_cost(a, b));
            }
            rewired += 1;
        }

        rewired
    }

    /// Whether the last inserted node lies within the goal threshold.
    pub fn reached(&self) -> bool {
        let last = self.tree.node(self.tree.last_node());
        distance(&last.position(), &self.goal()) < self.config.reached_threshold
    }

    fn finish(&mut self, state: PlannerState) {
        let start = match state {
            PlannerState::Reached => self.tree.last_node(),
            _ => self.tree.nearest(&self.goal()),
        };
        self.path = self.tree.path_to_root(start);
        self.state = state;
        info!(
            "RRT* {} after {} iterations: {} nodes, path of {} nodes with cost {:.3}",
            state,
            self.iteration,
            self.tree.len(),
            self.path.len(),
            self.tree.cost(start)
        );
    }
}

/// Finite iterator over tree-growth snapshots; see [`RRTStar::growth`].
pub struct Growth<'a, S: Steering> {
    planner: &'a mut RRTStar<S>,
}

impl<'a, S: Steering> Iterator for Growth<'a, S> {
    type Item = StepOutcome;

    fn next(&mut self) -> Option<StepOutcome> {
        if self.planner.state.is_terminal() {
            return None;
        }
        Some(self.planner.advance())
    }
}

impl<S: Steering + Clone> PathPlanner for RRTStar<S> {
    fn plan(&self, start: Point2D, goal: Point2D) -> PlannerResult<Path2D> {
        let mut config = self.config.clone();
        config.start = Pose2D::new(start.x, start.y, config.start.yaw);
        config.goal = Pose2D::new(goal.x, goal.y, config.goal.yaw);

        let mut planner = RRTStar::with_steering(config, self.steering.clone())?;
        planner.obstacles = self.obstacles.clone();

        let max_iter = planner.config.max_iter;
        match planner.run(max_iter, |_, _| {}) {
            PlannerState::Reached => Ok(planner.path_2d()),
            _ => Err(PlannerError::PlanningError(
                "RRT*: Cannot find path within max iterations".to_string(),
            )),
        }
    }
}

impl<S: Steering + Clone> SamplingBasedPlanner for RRTStar<S> {
    fn tree(&self) -> &Tree {
        &self.tree
    }

    fn set_max_iterations(&mut self, max_iter: usize) -> PlannerResult<()> {
        RRTStar::set_max_iterations(self, max_iter)
    }
}
