pub mod aggregator;
pub mod air_quality;
pub mod dashboard;
pub mod openweather;
pub mod series;

#[cfg(test)]
pub(crate) mod testing;
