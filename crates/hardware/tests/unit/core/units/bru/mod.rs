
/// BTB plus direction predictor, fetch to resolution.
pub mod branch_unit;
