mod clusters;
mod entities;
mod util;

pub use clusters::Clusters;
pub use entities::Entities;
