pub mod clock;
pub mod phone;

pub use clock::{Clock, SystemClock};
pub use phone::is_valid_mobile_phone;
