pub mod time_utils;

pub use time_utils::{is_fresh, Clock, ManualClock, SystemClock};
