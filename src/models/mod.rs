mod attribution;
mod partner;
mod referral_visit;
mod user;

pub use attribution::*;
pub use partner::*;
pub use referral_visit::*;
pub use user::*;
