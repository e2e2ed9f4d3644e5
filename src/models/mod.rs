pub mod cocktail;
pub mod state;

pub use cocktail::*;
pub use state::*;
