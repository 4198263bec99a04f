//! Run configuration and the fixed destination table.
//!
//! [`RoutineConfig`] is an immutable snapshot handed to the orchestrator at
//! run start; nothing mutates it during the run. The resource tasks are an
//! ordered enumeration: [`ResourceTask::ALL`] is the single source of truth
//! for execution order, consumed by both the pipeline and any selection UI so
//! the two cannot drift apart.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::session::BrowserSettings;

/// Account credentials for the remote session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    /// Whether either field is empty or whitespace-only.
    pub fn is_blank(&self) -> bool {
        self.username.trim().is_empty() || self.password.trim().is_empty()
    }
}

/// Game world selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct World(pub u8);

/// Movement modes the routine is allowed to use between destinations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveType {
    Walk,
    Portal,
    Teleport,
}

/// Resource-collection sub-tasks, in pipeline execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceTask {
    /// Move to the corn storehouse and collect baru corn.
    BaruCorn,
    /// Move to the fish storehouse and collect glodo fish.
    GlodoFish,
    /// Move to the gas storehouse and collect marsh gas.
    MarshGas,
    /// Move to the oil storehouse and collect barrels of oil.
    OilBarrel,
    /// Move to the universal foundation and collect gold.
    UniversalFoundation,
}

impl ResourceTask {
    /// All resource tasks in the order the pipeline executes them.
    ///
    /// Configured tasks are filtered against this list, never iterated in
    /// configuration-insertion order.
    pub const ALL: [ResourceTask; 5] = [
        ResourceTask::BaruCorn,
        ResourceTask::GlodoFish,
        ResourceTask::MarshGas,
        ResourceTask::OilBarrel,
        ResourceTask::UniversalFoundation,
    ];

    /// Where and how this resource is collected.
    pub fn destination(self) -> Destination {
        match self {
            ResourceTask::BaruCorn => Destination {
                x: 115,
                y: 94,
                name: "corn storehouse",
                anchor_text: "Getreide mitnehmen",
                resource_name: "baru corn",
            },
            ResourceTask::GlodoFish => Destination {
                x: 68,
                y: 116,
                name: "fish storehouse",
                anchor_text: "Fische mitnehmen",
                resource_name: "glodo fish",
            },
            ResourceTask::MarshGas => Destination {
                x: 76,
                y: 104,
                name: "gas storehouse",
                anchor_text: "Sumpfgasflaschen mitnehmen",
                resource_name: "marsh gas",
            },
            ResourceTask::OilBarrel => Destination {
                x: 103,
                y: 117,
                name: "oil storehouse",
                anchor_text: "Ölfässer mitnehmen",
                resource_name: "oil barrel",
            },
            ResourceTask::UniversalFoundation => Destination {
                x: 87,
                y: 112,
                name: "universal foundation",
                anchor_text: "Goldmünzen abholen",
                resource_name: "gold",
            },
        }
    }
}

/// A named map coordinate plus the anchor that collects the resource there.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Destination {
    pub x: i32,
    pub y: i32,
    /// Destination name for report lines.
    pub name: &'static str,
    /// Literal anchor text that triggers collection once arrived.
    pub anchor_text: &'static str,
    /// Resource name for report lines.
    pub resource_name: &'static str,
}

/// Immutable input to a single routine run.
#[derive(Debug, Clone)]
pub struct RoutineConfig {
    pub credentials: Credentials,
    pub world: World,
    /// Driver selection and local browser paths for opening the session.
    pub browser: BrowserSettings,
    /// Movement modes the session may use; order carries no meaning.
    pub movement: Vec<MoveType>,
    /// When set, the protection item activated before any movement.
    pub protection_item: Option<String>,
    /// Whether the special skill is activated before any movement.
    pub use_special_skill: bool,
    /// Resource tasks to perform; executed in [`ResourceTask::ALL`] order.
    pub resources: BTreeSet<ResourceTask>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn execution_order_is_fixed() {
        assert_eq!(
            ResourceTask::ALL,
            [
                ResourceTask::BaruCorn,
                ResourceTask::GlodoFish,
                ResourceTask::MarshGas,
                ResourceTask::OilBarrel,
                ResourceTask::UniversalFoundation,
            ]
        );
    }

    #[test]
    fn destination_table_matches_map() {
        let corn = ResourceTask::BaruCorn.destination();
        assert_eq!((corn.x, corn.y), (115, 94));
        assert_eq!(corn.anchor_text, "Getreide mitnehmen");

        let gold = ResourceTask::UniversalFoundation.destination();
        assert_eq!((gold.x, gold.y), (87, 112));
        assert_eq!(gold.resource_name, "gold");
    }

    #[test]
    fn blank_credentials_detected() {
        let blank = Credentials {
            username: "  ".to_string(),
            password: "secret".to_string(),
        };
        assert!(blank.is_blank());

        let filled = Credentials {
            username: "user".to_string(),
            password: "secret".to_string(),
        };
        assert!(!filled.is_blank());
    }
}
