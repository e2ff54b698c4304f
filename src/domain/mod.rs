//! Domain foundations: shared enumerations and the application error
//! taxonomy.

pub mod enums;
pub mod errors;
