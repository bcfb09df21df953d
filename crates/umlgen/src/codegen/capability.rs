//! Artifact kinds a generator can synthesize

use serde::Serialize;

/// One kind of generated artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    Entity,
    Repository,
    Service,
    Controller,
    Migration,
}

impl Capability {
    pub const ALL: [Capability; 5] = [
        Capability::Entity,
        Capability::Repository,
        Capability::Service,
        Capability::Controller,
        Capability::Migration,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::Entity => "entity",
            Capability::Repository => "repository",
            Capability::Service => "service",
            Capability::Controller => "controller",
            Capability::Migration => "migration",
        }
    }
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The enabled capabilities; entities are always on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct CapabilitySet {
    repositories: bool,
    services: bool,
    controllers: bool,
    migrations: bool,
}

impl CapabilitySet {
    pub fn entities_only() -> Self {
        Self::default()
    }

    pub fn all() -> Self {
        Self {
            repositories: true,
            services: true,
            controllers: true,
            migrations: true,
        }
    }

    /// Enable one more capability
    pub fn with(mut self, capability: Capability) -> Self {
        match capability {
            Capability::Entity => {}
            Capability::Repository => self.repositories = true,
            Capability::Service => self.services = true,
            Capability::Controller => self.controllers = true,
            Capability::Migration => self.migrations = true,
        }
        self
    }

    pub fn contains(&self, capability: Capability) -> bool {
        match capability {
            Capability::Entity => true,
            Capability::Repository => self.repositories,
            Capability::Service => self.services,
            Capability::Controller => self.controllers,
            Capability::Migration => self.migrations,
        }
    }

    /// Enabled capabilities in generation order
    pub fn iter(&self) -> impl Iterator<Item = Capability> + '_ {
        Capability::ALL.into_iter().filter(|c| self.contains(*c))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_is_always_enabled() {
        let set = CapabilitySet::entities_only();
        assert!(set.contains(Capability::Entity));
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![Capability::Entity]);
    }

    #[test]
    fn test_with_enables_in_fixed_order() {
        let set = CapabilitySet::entities_only()
            .with(Capability::Controller)
            .with(Capability::Repository);
        assert_eq!(
            set.iter().collect::<Vec<_>>(),
            vec![Capability::Entity, Capability::Repository, Capability::Controller]
        );
        assert_eq!(CapabilitySet::all().iter().count(), 5);
    }
}
