use thiserror::Error;

/// Boxed error carried as the source of a failed construction.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error("Failed to construct instance of {type_name}")]
    Construction {
        type_name: &'static str,
        #[source]
        source: BoxError,
    },

    #[error("Circular dependency while constructing singleton of {type_name}")]
    CircularDependency { type_name: &'static str },
}

impl ProvisionError {
    /// Type name of the binding that failed to provision.
    pub fn type_name(&self) -> &'static str {
        match self {
            ProvisionError::Construction { type_name, .. } => type_name,
            ProvisionError::CircularDependency { type_name } => type_name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_construction_display() {
        let err = ProvisionError::Construction {
            type_name: "u32",
            source: "no port configured".into(),
        };
        assert_eq!(err.to_string(), "Failed to construct instance of u32");
    }

    #[test]
    fn test_construction_source() {
        let err = ProvisionError::Construction {
            type_name: "u32",
            source: "no port configured".into(),
        };
        let source = err.source().map(|s| s.to_string());
        assert_eq!(source.as_deref(), Some("no port configured"));
    }

    #[test]
    fn test_circular_dependency_display() {
        let err = ProvisionError::CircularDependency { type_name: "Node" };
        assert_eq!(
            err.to_string(),
            "Circular dependency while constructing singleton of Node"
        );
        assert!(err.source().is_none());
    }

    #[test]
    fn test_type_name() {
        let err = ProvisionError::CircularDependency { type_name: "Node" };
        assert_eq!(err.type_name(), "Node");
    }

    #[test]
    fn test_debug_format() {
        let err = ProvisionError::CircularDependency { type_name: "Node" };
        assert_eq!(
            format!("{:?}", err),
            "CircularDependency { type_name: \"Node\" }"
        );
    }
}
