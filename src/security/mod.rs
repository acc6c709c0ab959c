pub mod clock;
pub mod jwt;
pub mod keys;
pub mod lifetime;
pub mod password;

pub use clock::{Clock, SystemClock};
pub use jwt::{ClaimSet, Claims, JwtManager};
pub use keys::{KeySource, LiveKeySource, SigningMaterial, SigningSettings};
pub use lifetime::parse_lifetime;
pub use password::{Digest, PasswordManager};
