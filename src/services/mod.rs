pub mod jwt;
pub mod khalti;

pub use jwt::JwtService;
pub use khalti::KhaltiService;
