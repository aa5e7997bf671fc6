use std::path::Path;

use log::warn;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::scale::{Point, ScaleContext};

const MIN_CONTAINER_SCALE: u8 = 50;
const MAX_CONTAINER_SCALE: u8 = 200;

/// Where container windows open, and whether their location is remembered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContainerLocationPolicy {
    #[default]
    NearContainer,
    TopRight,
    LastDraggedPosition,
    RememberEveryContainer,
}

/// Settings threaded into every layout, rebuild and update call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderConfig {
    /// Container scale factor (1.0 = unscaled).
    pub scale: f32,
    pub scale_items_inside_containers: bool,
    pub skip_empty_corpse: bool,
    pub override_container_location: bool,
    pub location_policy: ContainerLocationPolicy,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            scale: 1.0,
            scale_items_inside_containers: false,
            skip_empty_corpse: false,
            override_container_location: false,
            location_policy: ContainerLocationPolicy::default(),
        }
    }
}

impl RenderConfig {
    pub fn scale_context(&self) -> ScaleContext {
        ScaleContext::new(self.scale)
    }

    /// True when every container's last location is saved on close.
    pub fn remembers_every_container(&self) -> bool {
        self.location_policy == ContainerLocationPolicy::RememberEveryContainer
    }

    /// True when a drag end should record the window centre in the profile.
    pub fn records_dragged_position(&self) -> bool {
        self.override_container_location
            && self.location_policy >= ContainerLocationPolicy::LastDraggedPosition
    }
}

/// User profile settings relevant to container windows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Profile {
    /// Container scale in percent.
    pub container_scale: u8,
    pub scale_items_inside_containers: bool,
    pub skip_empty_corpse: bool,
    pub override_container_location: bool,
    pub override_container_location_setting: ContainerLocationPolicy,
    /// Schema version of the saved gump layout.
    pub gumps_version: u32,
    /// Centre of the last dragged container window.
    pub override_container_location_position: Option<Point>,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            container_scale: 100,
            scale_items_inside_containers: false,
            skip_empty_corpse: false,
            override_container_location: false,
            override_container_location_setting: ContainerLocationPolicy::default(),
            gumps_version: 3,
            override_container_location_position: None,
        }
    }
}

impl Profile {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Loads the profile, falling back to defaults when missing or invalid.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(profile) => profile,
            Err(ConfigError::Io(err)) if err.kind() == std::io::ErrorKind::NotFound => {
                Self::default()
            }
            Err(err) => {
                warn!("Ignoring profile at {}: {}", path.display(), err);
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn render_config(&self) -> RenderConfig {
        let percent = self
            .container_scale
            .clamp(MIN_CONTAINER_SCALE, MAX_CONTAINER_SCALE);

        RenderConfig {
            scale: percent as f32 / 100.0,
            scale_items_inside_containers: self.scale_items_inside_containers,
            skip_empty_corpse: self.skip_empty_corpse,
            override_container_location: self.override_container_location,
            location_policy: self.override_container_location_setting,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_defaults_from_empty_toml() {
        let profile: Profile = toml::from_str("").unwrap();
        assert_eq!(profile, Profile::default());
        assert_eq!(profile.render_config(), RenderConfig::default());
    }

    #[test]
    fn test_profile_parses_settings() {
        let profile: Profile = toml::from_str(
            r#"
            container_scale = 150
            scale_items_inside_containers = true
            skip_empty_corpse = true
            override_container_location = true
            override_container_location_setting = "remember_every_container"
            gumps_version = 2
            "#,
        )
        .unwrap();

        let config = profile.render_config();
        assert_eq!(config.scale, 1.5);
        assert!(config.scale_items_inside_containers);
        assert!(config.skip_empty_corpse);
        assert!(config.remembers_every_container());
        assert!(config.records_dragged_position());
        assert_eq!(profile.gumps_version, 2);
    }

    #[test]
    fn test_scale_is_clamped() {
        let mut profile = Profile::default();
        profile.container_scale = 10;
        assert_eq!(profile.render_config().scale, 0.5);
        profile.container_scale = 255;
        assert_eq!(profile.render_config().scale, 2.0);
    }

    #[test]
    fn test_dragged_position_needs_override_and_policy() {
        let mut config = RenderConfig::default();
        config.location_policy = ContainerLocationPolicy::LastDraggedPosition;
        assert!(!config.records_dragged_position());

        config.override_container_location = true;
        assert!(config.records_dragged_position());

        config.location_policy = ContainerLocationPolicy::TopRight;
        assert!(!config.records_dragged_position());
    }

    #[test]
    fn test_profile_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("profile.toml");

        let mut profile = Profile::default();
        profile.container_scale = 125;
        profile.override_container_location_position = Some(Point::new(400, 300));
        profile.save(&path).unwrap();

        let loaded = Profile::load(&path).unwrap();
        assert_eq!(loaded, profile);
    }

    #[test]
    fn test_load_or_default_on_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let profile = Profile::load_or_default(&dir.path().join("missing.toml"));
        assert_eq!(profile, Profile::default());
    }
}
