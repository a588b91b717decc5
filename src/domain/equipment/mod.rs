//! Equipment catalog domain

mod entity;
mod filter;

pub use entity::{Equipment, EquipmentCategory, EquipmentDraft, EquipmentId, EquipmentPatch};
pub use filter::{CATEGORY_LOOKUP, EquipmentFilter, EquipmentSortField};
