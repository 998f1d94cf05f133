// SPDX-License-Identifier: MIT OR Apache-2.0
//! Host configuration of an editor instance.
//!
//! Data-only options live in [`EditorSettings`], which can be loaded from RON.
//! Behavioural hooks are registered on [`EditorConfig`] at construction time.

use crate::protocol::ChangeHook;
use crate::transform::Transformation;
use egui::Pos2;
use indexmap::IndexMap;
use nodeloom_graph::path::DEFAULT_ANCHORS_LENGTH;
use nodeloom_graph::{ConnectionType, Direction, Endpoint, Node, Port};
use serde::{Deserialize, Serialize};

/// Prefix of built-in style class names
pub const STYLE_PREFIX: &str = "nodeloom";

/// Snapping grid
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridSettings {
    /// Cell size in canvas units
    pub size: f32,
}

impl GridSettings {
    /// Round a canvas position to the nearest grid point
    pub fn snap(&self, pos: Pos2) -> Pos2 {
        if self.size <= 0.0 {
            return pos;
        }
        Pos2::new(
            (pos.x / self.size).round() * self.size,
            (pos.y / self.size).round() * self.size,
        )
    }
}

/// Serializable editor options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorSettings {
    /// Apply every mutation immediately, even when a change hook is registered
    pub demo_mode: bool,
    /// Transformation at startup
    pub initial_transformation: Transformation,
    /// Which side inputs are drawn on
    pub direction: Direction,
    /// Shape of rendered connections
    pub connection_type: ConnectionType,
    /// Length of bezier handles
    pub connection_anchors_length: f32,
    /// Snapping grid; `None` disables snapping
    pub grid: Option<GridSettings>,
    /// Ignore wheel zoom
    pub disable_zoom: bool,
    /// Style class overrides, keyed by built-in name
    pub style_names: IndexMap<String, String>,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            demo_mode: false,
            initial_transformation: Transformation::IDENTITY,
            direction: Direction::WestEast,
            connection_type: ConnectionType::Bezier,
            connection_anchors_length: DEFAULT_ANCHORS_LENGTH,
            grid: None,
            disable_zoom: false,
            style_names: IndexMap::new(),
        }
    }
}

impl EditorSettings {
    /// Parse settings from RON; missing fields take their defaults
    pub fn from_ron(s: &str) -> Result<Self, ConfigError> {
        Ok(ron::from_str(s)?)
    }

    /// Write settings as RON
    pub fn to_ron(&self) -> Result<String, ConfigError> {
        Ok(ron::ser::to_string_pretty(
            self,
            ron::ser::PrettyConfig::default(),
        )?)
    }

    /// Style class for a built-in name, e.g. `node` → `nodeloom-node` unless overridden
    pub fn style_name(&self, key: &str) -> String {
        self.style_names
            .get(key)
            .cloned()
            .unwrap_or_else(|| format!("{STYLE_PREFIX}-{key}"))
    }

    /// Snap a position to the grid when one is configured
    pub fn snap(&self, pos: Pos2) -> Pos2 {
        match self.grid {
            Some(grid) => grid.snap(pos),
            None => pos,
        }
    }
}

/// One side of a candidate connection, as shown to the validator
#[derive(Debug, Clone, Copy)]
pub struct Candidate<'a> {
    /// Endpoint identity
    pub endpoint: &'a Endpoint,
    /// Owning node
    pub node: &'a Node,
    /// The port itself
    pub port: &'a Port,
}

/// Host predicate over a candidate (output, input) pair
pub type ConnectionValidator = Box<dyn Fn(Candidate<'_>, Candidate<'_>) -> bool>;

/// Host function producing the body content of a node
pub type NodeResolver = Box<dyn Fn(&Node) -> serde_json::Value>;

/// Full configuration: settings plus host hooks
#[derive(Default)]
pub struct EditorConfig {
    /// Data-only options
    pub settings: EditorSettings,
    pub(crate) resolver: Option<NodeResolver>,
    pub(crate) validator: Option<ConnectionValidator>,
    pub(crate) change_hook: Option<Box<dyn ChangeHook>>,
}

impl EditorConfig {
    /// Create a config with the given settings and no hooks
    pub fn new(settings: EditorSettings) -> Self {
        Self {
            settings,
            ..Self::default()
        }
    }

    /// Register the node body resolver
    pub fn with_resolver(
        mut self,
        resolver: impl Fn(&Node) -> serde_json::Value + 'static,
    ) -> Self {
        self.resolver = Some(Box::new(resolver));
        self
    }

    /// Register a predicate that approves (output, input) pairs
    pub fn with_connection_validator(
        mut self,
        validator: impl Fn(Candidate<'_>, Candidate<'_>) -> bool + 'static,
    ) -> Self {
        self.validator = Some(Box::new(validator));
        self
    }

    /// Register the change hook
    pub fn with_change_hook(mut self, hook: impl ChangeHook + 'static) -> Self {
        self.change_hook = Some(Box::new(hook));
        self
    }
}

impl std::fmt::Debug for EditorConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditorConfig")
            .field("settings", &self.settings)
            .field("resolver", &self.resolver.is_some())
            .field("validator", &self.validator.is_some())
            .field("change_hook", &self.change_hook.is_some())
            .finish()
    }
}

/// Error when loading settings
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// RON parse error
    #[error("Settings parse error: {0}")]
    Parse(#[from] ron::error::SpannedError),

    /// RON write error
    #[error("Settings write error: {0}")]
    Write(#[from] ron::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_from_partial_ron() {
        let settings = EditorSettings::from_ron(
            r#"(
                demo_mode: true,
                direction: ew,
                connection_type: linear,
                grid: Some((size: 20.0)),
                style_names: { "node": "my-node" },
            )"#,
        )
        .unwrap();
        assert!(settings.demo_mode);
        assert_eq!(settings.direction, Direction::EastWest);
        assert_eq!(settings.connection_type, ConnectionType::Linear);
        assert_eq!(settings.connection_anchors_length, DEFAULT_ANCHORS_LENGTH);
        assert_eq!(settings.style_name("node"), "my-node");
        assert_eq!(settings.style_name("connection"), "nodeloom-connection");
        assert_eq!(settings.snap(Pos2::new(31.0, 9.0)), Pos2::new(40.0, 0.0));
    }

    #[test]
    fn test_settings_ron_round_trip() {
        let settings = EditorSettings {
            initial_transformation: Transformation::new(10.0, 20.0, 1.5),
            disable_zoom: true,
            ..EditorSettings::default()
        };
        let ron = settings.to_ron().unwrap();
        assert_eq!(EditorSettings::from_ron(&ron).unwrap(), settings);
    }

    #[test]
    fn test_bad_settings_fail() {
        assert!(matches!(
            EditorSettings::from_ron("(demo_mode: 3)"),
            Err(ConfigError::Parse(_))
        ));
    }
}
