use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const DEFAULT_SOLUTION_VERSION: &str = "1.0.0.0";

/// Solution component type codes understood by `AddSolutionComponent`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentType {
    Entity,
}

impl ComponentType {
    pub fn code(&self) -> i32 {
        match self {
            Self::Entity => 1,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Entity => "entity",
        }
    }
}

/// Ad-hoc packaging unit that carries one entity's customizations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolutionRef {
    pub unique_name: String,
    pub friendly_name: String,
    pub publisher_id: Uuid,
    pub version: String,
}

impl SolutionRef {
    /// Build the solution for `entity_name`.
    ///
    /// The unique name is always `prefix` followed by the entity logical name
    /// with its first character upper-cased, so repeated runs for the same
    /// entity produce the same name.
    pub fn for_entity(prefix: &str, entity_name: &str, publisher_id: Uuid) -> Self {
        Self {
            unique_name: Self::unique_name_for(prefix, entity_name),
            friendly_name: format!("Ribbon export: {}", entity_name),
            publisher_id,
            version: DEFAULT_SOLUTION_VERSION.to_string(),
        }
    }

    pub fn unique_name_for(prefix: &str, entity_name: &str) -> String {
        let mut chars = entity_name.chars();
        match chars.next() {
            Some(first) => format!("{}{}{}", prefix, first.to_uppercase(), chars.as_str()),
            None => prefix.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_name_for_account() {
        assert_eq!(SolutionRef::unique_name_for("Prefix", "account"), "PrefixAccount");
    }

    #[test]
    fn test_unique_name_keeps_rest_of_name() {
        assert_eq!(
            SolutionRef::unique_name_for("Prefix", "new_projectTask"),
            "PrefixNew_projectTask"
        );
    }

    #[test]
    fn test_for_entity_defaults() {
        let id = Uuid::new_v4();
        let solution = SolutionRef::for_entity("Prefix", "contact", id);

        assert_eq!(solution.unique_name, "PrefixContact");
        assert_eq!(solution.publisher_id, id);
        assert_eq!(solution.version, DEFAULT_SOLUTION_VERSION);
        assert!(solution.friendly_name.contains("contact"));
    }

    #[test]
    fn test_component_type_codes() {
        assert_eq!(ComponentType::Entity.code(), 1);
        assert_eq!(ComponentType::Entity.as_str(), "entity");
    }
}
