pub mod panel;
pub mod weather_model;
