use std::collections::HashMap;

use log::trace;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::scale::{Rect, ScaleContext};

/// Interior area items may occupy, as edges in logical units.
///
/// `right` and `bottom` are far edges, not extents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteriorBounds {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl InteriorBounds {
    pub const fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self { left, top, right, bottom }
    }

    pub fn scaled(&self, ctx: ScaleContext) -> Self {
        Self {
            left: ctx.value(self.left),
            top: ctx.value(self.top),
            right: ctx.value(self.right),
            bottom: ctx.value(self.bottom),
        }
    }
}

/// Immutable per-graphic metadata of a container window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContainerDefinition {
    /// Gump id of the full background sprite.
    pub graphic: u16,
    /// Gump id shown while minimized; 0 when the container has none.
    #[serde(default)]
    pub iconized_graphic: u16,
    pub bounds: InteriorBounds,
    #[serde(default)]
    pub open_sound: u16,
    #[serde(default)]
    pub close_sound: u16,
    /// Logical rectangle that minimizes the window when clicked.
    #[serde(default)]
    pub minimizer_area: Rect,
}

impl ContainerDefinition {
    pub const fn new(graphic: u16, open_sound: u16, close_sound: u16, bounds: InteriorBounds) -> Self {
        Self {
            graphic,
            iconized_graphic: 0,
            bounds,
            open_sound,
            close_sound,
            minimizer_area: Rect::new(0, 0, 0, 0),
        }
    }

    pub const fn with_minimizer(mut self, iconized_graphic: u16, minimizer_area: Rect) -> Self {
        self.iconized_graphic = iconized_graphic;
        self.minimizer_area = minimizer_area;
        self
    }

    /// Background sprite for the given minimized flag.
    pub fn background_graphic(&self, minimized: bool) -> u16 {
        if minimized && self.iconized_graphic != 0 {
            self.iconized_graphic
        } else {
            self.graphic
        }
    }
}

/// Lookup of container definitions by container graphic.
pub trait DefinitionRegistry {
    /// Never fails: unknown graphics get a generic definition.
    fn get(&self, graphic: u16) -> ContainerDefinition;
}

const DEFAULT_BOUNDS: InteriorBounds = InteriorBounds::new(44, 65, 186, 159);

const BUILTIN: &[ContainerDefinition] = &[
    ContainerDefinition::new(0x0007, 0x0000, 0x0000, InteriorBounds::new(30, 30, 270, 170)),
    ContainerDefinition::new(0x0009, 0x0000, 0x0000, InteriorBounds::new(20, 85, 124, 196)),
    ContainerDefinition::new(0x003C, 0x0048, 0x0058, InteriorBounds::new(44, 65, 186, 159))
        .with_minimizer(0x0050, Rect::new(105, 162, 70, 19)),
    ContainerDefinition::new(0x003D, 0x0048, 0x0058, InteriorBounds::new(29, 34, 137, 128)),
    ContainerDefinition::new(0x003E, 0x002F, 0x002E, InteriorBounds::new(33, 36, 142, 148)),
    ContainerDefinition::new(0x003F, 0x004F, 0x0058, InteriorBounds::new(19, 47, 182, 123)),
    ContainerDefinition::new(0x0040, 0x002D, 0x002C, InteriorBounds::new(16, 51, 184, 124)),
    ContainerDefinition::new(0x0041, 0x004F, 0x0058, InteriorBounds::new(35, 38, 145, 116)),
    ContainerDefinition::new(0x0042, 0x002D, 0x002C, InteriorBounds::new(18, 105, 162, 178)),
    ContainerDefinition::new(0x0043, 0x002D, 0x002C, InteriorBounds::new(16, 51, 184, 124)),
    ContainerDefinition::new(0x0044, 0x002D, 0x002C, InteriorBounds::new(20, 10, 170, 100)),
    ContainerDefinition::new(0x0048, 0x002F, 0x002E, InteriorBounds::new(16, 10, 154, 94)),
    ContainerDefinition::new(0x0049, 0x002D, 0x002C, InteriorBounds::new(18, 105, 162, 178)),
    ContainerDefinition::new(0x004A, 0x002D, 0x002C, InteriorBounds::new(18, 105, 162, 178)),
    ContainerDefinition::new(0x004B, 0x002D, 0x002C, InteriorBounds::new(16, 51, 184, 124)),
    ContainerDefinition::new(0x004C, 0x002D, 0x002C, InteriorBounds::new(46, 74, 196, 184)),
    ContainerDefinition::new(0x004D, 0x002F, 0x002E, InteriorBounds::new(76, 12, 140, 68)),
    ContainerDefinition::new(0x004E, 0x002D, 0x002C, InteriorBounds::new(24, 96, 140, 152)),
    ContainerDefinition::new(0x004F, 0x002D, 0x002C, InteriorBounds::new(24, 96, 140, 152)),
    ContainerDefinition::new(0x0051, 0x002F, 0x002E, InteriorBounds::new(16, 10, 154, 94)),
];

#[derive(Debug, Deserialize)]
struct DefinitionFile {
    #[serde(default, rename = "container")]
    containers: Vec<ContainerDefinition>,
}

/// Container definition table, keyed by container graphic.
#[derive(Debug, Clone, Default)]
pub struct ContainerDefinitions {
    by_graphic: HashMap<u16, ContainerDefinition>,
}

impl ContainerDefinitions {
    /// Table with the stock container gumps.
    pub fn builtin() -> Self {
        let mut table = Self::default();
        for definition in BUILTIN {
            table.insert(definition.clone());
        }
        table
    }

    pub fn insert(&mut self, definition: ContainerDefinition) {
        self.by_graphic.insert(definition.graphic, definition);
    }

    /// Add or replace definitions from a TOML document of `[[container]]` tables.
    pub fn merge_toml(&mut self, source: &str) -> Result<usize, ConfigError> {
        let file: DefinitionFile = toml::from_str(source)?;
        let count = file.containers.len();
        for definition in file.containers {
            self.insert(definition);
        }
        Ok(count)
    }

    pub fn len(&self) -> usize {
        self.by_graphic.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_graphic.is_empty()
    }
}

impl DefinitionRegistry for ContainerDefinitions {
    fn get(&self, graphic: u16) -> ContainerDefinition {
        match self.by_graphic.get(&graphic) {
            Some(definition) => definition.clone(),
            None => {
                trace!("No container definition for {:#06X}, using default", graphic);
                ContainerDefinition::new(graphic, 0, 0, DEFAULT_BOUNDS)
            }
        }
    }
}
