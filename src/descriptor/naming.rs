//! Names of surfaces and interaction properties

use crate::modification::InterfaceProperty;

/// Trait for naming grain surfaces and interface property buckets
pub trait PropertyNaming {
    /// Name of the surface wrapping a grain
    fn surface_name(&self, grain_id: usize) -> String;

    /// Name of an interface property bucket
    fn property_name(&self, property: InterfaceProperty) -> String;
}

/// `Surf-{id}`, `Prop-1` and `Prop-2`
#[derive(Debug, Clone, Copy, Default)]
pub struct BasicPropertyNaming;

impl PropertyNaming for BasicPropertyNaming {
    fn surface_name(&self, grain_id: usize) -> String {
        format!("Surf-{}", grain_id)
    }

    fn property_name(&self, property: InterfaceProperty) -> String {
        match property {
            InterfaceProperty::Default => "Prop-1".to_string(),
            InterfaceProperty::Modified => "Prop-2".to_string(),
        }
    }
}

/// Naming with caller-chosen prefix and bucket names
#[derive(Debug, Clone)]
pub struct CustomPropertyNaming {
    pub surface_prefix: String,
    pub default_property: String,
    pub modified_property: String,
}

impl Default for CustomPropertyNaming {
    fn default() -> Self {
        Self {
            surface_prefix: "Surf-".to_string(),
            default_property: "Prop-1".to_string(),
            modified_property: "Prop-2".to_string(),
        }
    }
}

impl PropertyNaming for CustomPropertyNaming {
    fn surface_name(&self, grain_id: usize) -> String {
        format!("{}{}", self.surface_prefix, grain_id)
    }

    fn property_name(&self, property: InterfaceProperty) -> String {
        match property {
            InterfaceProperty::Default => self.default_property.clone(),
            InterfaceProperty::Modified => self.modified_property.clone(),
        }
    }
}
