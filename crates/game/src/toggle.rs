//! Show/hide a configured set of named scene objects with one key.

use crate::config::ToggleConfig;
use engine_core::{Hidden, Name};

pub struct VisibilityToggle {
    targets: Vec<String>,
    hidden: bool,
}

impl VisibilityToggle {
    pub fn new(config: &ToggleConfig) -> Self {
        Self {
            targets: config.targets.clone(),
            hidden: config.start_hidden,
        }
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    pub fn toggle(&mut self, world: &mut hecs::World) {
        self.hidden = !self.hidden;
        self.apply(world);
    }

    /// Bring every target's [`Hidden`] marker in line with the current state.
    /// Returns how many entities matched.
    pub fn apply(&self, world: &mut hecs::World) -> usize {
        let matched: Vec<hecs::Entity> = world
            .query::<&Name>()
            .iter()
            .filter(|(_, name)| self.targets.iter().any(|t| t == name.as_str()))
            .map(|(entity, _)| entity)
            .collect();

        for &entity in &matched {
            if self.hidden {
                let _ = world.insert_one(entity, Hidden);
            } else {
                let _ = world.remove_one::<Hidden>(entity);
            }
        }
        if matched.is_empty() && !self.targets.is_empty() {
            log::warn!("Visibility toggle matched no objects for {:?}", self.targets);
        }
        matched.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggles_only_named_targets() {
        let mut world = hecs::World::new();
        let cover = world.spawn((Name::new("housing_cover"),));
        let table = world.spawn((Name::new("table"),));

        let mut toggle = VisibilityToggle::new(&ToggleConfig::default());
        assert_eq!(toggle.apply(&mut world), 1);
        assert!(world.get::<&Hidden>(cover).is_err());

        toggle.toggle(&mut world);
        assert!(toggle.is_hidden());
        assert!(world.get::<&Hidden>(cover).is_ok());
        assert!(world.get::<&Hidden>(table).is_err());

        toggle.toggle(&mut world);
        assert!(world.get::<&Hidden>(cover).is_err());
    }

    #[test]
    fn start_hidden_applies_on_first_sync() {
        let mut world = hecs::World::new();
        let cover = world.spawn((Name::new("housing_cover"),));
        let toggle = VisibilityToggle::new(&ToggleConfig {
            start_hidden: true,
            ..Default::default()
        });
        toggle.apply(&mut world);
        assert!(world.get::<&Hidden>(cover).is_ok());
    }
}
