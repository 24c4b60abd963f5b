pub mod adf;
pub mod resample;
pub mod stats;

#[cfg(test)]
mod resample_tests;
