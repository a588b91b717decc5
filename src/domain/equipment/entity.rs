//! Equipment catalog entries

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::validation::{validate_optional_text, validate_text};
use crate::domain::{DomainError, StorageEntity};

crate::entity_id!(
    /// Equipment identifier
    EquipmentId,
    "equipment"
);

const MAX_NAME_LENGTH: usize = 120;
const MAX_BRAND_LENGTH: usize = 80;
const MAX_DESCRIPTION_LENGTH: usize = 1000;

/// Equipment category
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EquipmentCategory {
    Cardio,
    Strength,
    FreeWeights,
    Flexibility,
    Accessories,
}

impl EquipmentCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cardio => "CARDIO",
            Self::Strength => "STRENGTH",
            Self::FreeWeights => "FREE_WEIGHTS",
            Self::Flexibility => "FLEXIBILITY",
            Self::Accessories => "ACCESSORIES",
        }
    }
}

impl std::fmt::Display for EquipmentCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EquipmentCategory {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "CARDIO" => Ok(Self::Cardio),
            "STRENGTH" => Ok(Self::Strength),
            "FREE_WEIGHTS" => Ok(Self::FreeWeights),
            "FLEXIBILITY" => Ok(Self::Flexibility),
            "ACCESSORIES" => Ok(Self::Accessories),
            other => Err(DomainError::validation(format!(
                "Unknown equipment category '{}'",
                other
            ))),
        }
    }
}

/// A piece of gym equipment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Equipment {
    id: EquipmentId,
    name: String,
    category: EquipmentCategory,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    brand: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Input for creating equipment
#[derive(Debug, Clone, Deserialize)]
pub struct EquipmentDraft {
    pub name: String,
    pub category: EquipmentCategory,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Partial update of equipment
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EquipmentPatch {
    pub name: Option<String>,
    pub category: Option<EquipmentCategory>,
    pub brand: Option<String>,
    pub description: Option<String>,
    pub is_active: Option<bool>,
}

impl Equipment {
    pub fn new(name: impl Into<String>, category: EquipmentCategory) -> Result<Self, DomainError> {
        let name = name.into();
        validate_text("name", &name, MAX_NAME_LENGTH)?;

        let now = Utc::now();
        Ok(Self {
            id: EquipmentId::generate(),
            name,
            category,
            brand: None,
            description: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn with_brand(mut self, brand: impl Into<String>) -> Self {
        self.brand = Some(brand.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn id(&self) -> &EquipmentId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn category(&self) -> EquipmentCategory {
        self.category
    }

    pub fn brand(&self) -> Option<&str> {
        self.brand.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn set_category(&mut self, category: EquipmentCategory) {
        self.category = category;
        self.touch();
    }

    pub fn set_active(&mut self, active: bool) {
        self.is_active = active;
        self.touch();
    }

    fn validate(&self) -> Result<(), DomainError> {
        validate_text("name", &self.name, MAX_NAME_LENGTH)?;
        validate_optional_text("brand", self.brand.as_deref(), MAX_BRAND_LENGTH)?;
        validate_optional_text(
            "description",
            self.description.as_deref(),
            MAX_DESCRIPTION_LENGTH,
        )?;
        Ok(())
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

impl StorageEntity for Equipment {
    type Key = EquipmentId;

    fn key(&self) -> &Self::Key {
        &self.id
    }
}

impl EquipmentDraft {
    pub(crate) fn build(self) -> Result<Equipment, DomainError> {
        let mut equipment = Equipment::new(self.name, self.category)?;
        equipment.brand = self.brand;
        equipment.description = self.description;
        equipment.validate()?;
        Ok(equipment)
    }
}

impl EquipmentPatch {
    pub(crate) fn apply_to(self, equipment: &mut Equipment) -> Result<(), DomainError> {
        if let Some(name) = self.name {
            equipment.name = name;
        }
        if let Some(category) = self.category {
            equipment.category = category;
        }
        if let Some(brand) = self.brand {
            equipment.brand = Some(brand);
        }
        if let Some(description) = self.description {
            equipment.description = Some(description);
        }
        if let Some(active) = self.is_active {
            equipment.is_active = active;
        }
        equipment.validate()?;
        equipment.touch();
        Ok(())
    }
}
