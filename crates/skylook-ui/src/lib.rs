pub mod app_services;
pub mod error_mapping;
pub mod models;
pub mod services;
pub mod tui;

pub use app_services::AppServices;
pub use models::panel::PanelView;
pub use models::weather_model::{FetchOrigin, FetchRequest, UiEvent, ViewState, WeatherModel};
