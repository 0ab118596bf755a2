pub mod breakout;
pub mod ohlcv;
pub mod rolling;
pub mod summary;
