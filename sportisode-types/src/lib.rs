pub mod enums;
pub mod events;
pub mod models;
pub mod page;

pub use enums::*;
pub use events::*;
pub use models::*;
pub use page::*;
