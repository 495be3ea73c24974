pub mod card;
pub mod entity;
pub mod set;
pub mod sub;

pub use card::*;
pub use entity::*;
pub use set::*;
pub use sub::*;
