pub mod bar;
pub mod breakout_params;
pub mod date_range;
