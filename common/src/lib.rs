pub mod channel;
pub mod chart;
pub mod display;
pub mod screen;
