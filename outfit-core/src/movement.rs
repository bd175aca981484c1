//! Movement constraints for repositionable parts.
//!
//! Each axis of a [`Movement`] is either disabled or free within optional
//! bounds. Positions are clamped into bounds after every step, and a
//! direction is refused outright when the axis is disabled or the position
//! already sits on the bound it would push against.

use serde::{Deserialize, Deserializer};

use crate::selection::Position;

/// Pixels moved by a single step before scaling.
pub const MOVEMENT_BASE: f64 = 10.0;

/// Optional bounds on one axis. A bound of zero is a real bound.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Limits {
    /// Lowest allowed coordinate.
    pub min: Option<f64>,
    /// Highest allowed coordinate.
    pub max: Option<f64>,
}

impl Limits {
    /// Limits with both bounds set.
    #[must_use]
    pub const fn between(min: f64, max: f64) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
        }
    }

    /// Clamp a coordinate into these limits.
    #[must_use]
    pub fn clamp(&self, value: f64) -> f64 {
        let value = self.min.map_or(value, |min| value.max(min));
        self.max.map_or(value, |max| value.min(max))
    }
}

/// Movement rule for one axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AxisMovement {
    /// The axis cannot move in either direction.
    Disabled,
    /// The axis moves freely within the given limits.
    Free(Limits),
}

impl AxisMovement {
    /// An enabled axis with no bounds.
    pub const UNBOUNDED: Self = Self::Free(Limits {
        min: None,
        max: None,
    });

    /// Whether the axis can move at all.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        matches!(self, Self::Free(_))
    }

    fn from_value(value: Option<serde_json::Value>) -> Self {
        use serde_json::Value;
        match value {
            None | Some(Value::Bool(false)) => Self::Disabled,
            Some(Value::Null | Value::Bool(true)) => Self::UNBOUNDED,
            Some(Value::Object(map)) => Self::Free(Limits {
                min: map.get("min").and_then(Value::as_f64),
                max: map.get("max").and_then(Value::as_f64),
            }),
            Some(other) => {
                tracing::warn!("Ignoring malformed axis movement {other}");
                Self::Disabled
            }
        }
    }
}

/// A single movement step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Decrease y.
    Up,
    /// Increase y.
    Down,
    /// Decrease x.
    Left,
    /// Increase x.
    Right,
}

impl Direction {
    /// All directions.
    pub const ALL: [Self; 4] = [Self::Up, Self::Down, Self::Left, Self::Right];
}

impl std::str::FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "up" => Ok(Self::Up),
            "down" => Ok(Self::Down),
            "left" => Ok(Self::Left),
            "right" => Ok(Self::Right),
            other => Err(format!("unknown direction '{other}'")),
        }
    }
}

/// Movement constraints of a part.
///
/// In catalog JSON an axis is `false` (disabled), `null` or `{}`
/// (unbounded) or `{"min": .., "max": ..}`. An axis that is not mentioned
/// at all is disabled.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(from = "MovementRecord")]
pub struct Movement {
    /// Horizontal rule.
    pub x: AxisMovement,
    /// Vertical rule.
    pub y: AxisMovement,
    /// Step multiplier applied to [`MOVEMENT_BASE`].
    pub scale: f64,
}

impl Default for Movement {
    fn default() -> Self {
        Self {
            x: AxisMovement::Disabled,
            y: AxisMovement::Disabled,
            scale: 1.0,
        }
    }
}

impl Movement {
    /// Whether any axis is enabled.
    #[must_use]
    pub const fn is_movable(&self) -> bool {
        self.x.is_enabled() || self.y.is_enabled()
    }

    /// Pixel distance of one step.
    #[must_use]
    pub fn step_size(&self) -> f64 {
        MOVEMENT_BASE * self.scale
    }

    /// Clamp a position into the bounds of enabled axes.
    #[must_use]
    pub fn clamp(&self, position: Position) -> Position {
        let clamp_axis = |axis: &AxisMovement, value: f64| match axis {
            AxisMovement::Disabled => value,
            AxisMovement::Free(limits) => limits.clamp(value),
        };
        Position {
            x: clamp_axis(&self.x, position.x),
            y: clamp_axis(&self.y, position.y),
        }
    }

    /// Whether a step in `direction` is permitted from `position`.
    #[must_use]
    pub fn can_move(&self, position: Position, direction: Direction) -> bool {
        let (axis, value, toward_min) = match direction {
            Direction::Up => (&self.y, position.y, true),
            Direction::Down => (&self.y, position.y, false),
            Direction::Left => (&self.x, position.x, true),
            Direction::Right => (&self.x, position.x, false),
        };
        match axis {
            AxisMovement::Disabled => false,
            AxisMovement::Free(limits) if toward_min => !limits.min.is_some_and(|min| value <= min),
            AxisMovement::Free(limits) => !limits.max.is_some_and(|max| value >= max),
        }
    }

    /// Take one step, returning the clamped result or `None` if refused.
    #[must_use]
    pub fn step(&self, position: Position, direction: Direction) -> Option<Position> {
        if !self.can_move(position, direction) {
            return None;
        }
        let delta = self.step_size();
        let moved = match direction {
            Direction::Up => Position::new(position.x, position.y - delta),
            Direction::Down => Position::new(position.x, position.y + delta),
            Direction::Left => Position::new(position.x - delta, position.y),
            Direction::Right => Position::new(position.x + delta, position.y),
        };
        Some(self.clamp(moved))
    }
}

#[derive(Deserialize)]
struct MovementRecord {
    #[serde(default, deserialize_with = "present")]
    x: Option<serde_json::Value>,
    #[serde(default, deserialize_with = "present")]
    y: Option<serde_json::Value>,
    #[serde(default)]
    scale: Option<f64>,
}

// Keeps an explicit `null` distinct from a missing key.
fn present<'de, D>(deserializer: D) -> Result<Option<serde_json::Value>, D::Error>
where
    D: Deserializer<'de>,
{
    serde_json::Value::deserialize(deserializer).map(Some)
}

impl From<MovementRecord> for Movement {
    fn from(record: MovementRecord) -> Self {
        Self {
            x: AxisMovement::from_value(record.x),
            y: AxisMovement::from_value(record.y),
            scale: record.scale.filter(|s| s.is_finite()).unwrap_or(1.0),
        }
    }
}
