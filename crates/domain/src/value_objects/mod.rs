pub mod percentage;
pub mod price;

pub use percentage::{BPS_DENOMINATOR, BasisPoints};
pub use price::Price;
