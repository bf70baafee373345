pub mod constant_product;
pub mod fixed_point;

pub use constant_product::{
    DepositPlan, SwapQuote, calculate_k, calculate_out_amount, calculate_price_impact_bps,
    calculate_spot_out_amount, plan_deposit, plan_withdrawal,
};
pub use fixed_point::{format_amount, mul_div, mul_div_ceil, parse_amount, pow10};
