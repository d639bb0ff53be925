/// User interface module
///
/// - Photo list with search and delete confirmation (list.rs)
/// - Add-photo, map-picker and edit screens (entry.rs)
/// - Photo detail with photo/map modes (detail.rs)
/// - Schematic map canvas (map.rs)

pub mod detail;
pub mod entry;
pub mod list;
pub mod map;
