pub mod user;
pub mod listing;
pub mod booking;
pub mod shifting;
pub mod payment;
pub mod review;

pub use user::*;
pub use listing::*;
pub use booking::*;
pub use shifting::*;
pub use payment::*;
pub use review::*;
