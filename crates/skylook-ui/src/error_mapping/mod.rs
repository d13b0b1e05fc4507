//! Maps UI service errors to skylook_core::AppError for consistent user-facing messages.

mod weather;
