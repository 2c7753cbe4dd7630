pub mod prospecting;
pub mod seed;
