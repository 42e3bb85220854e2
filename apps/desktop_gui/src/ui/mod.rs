//! UI layer: app shell, screens, theme, and shared widgets.

pub mod app;
pub mod dashboard;
pub mod historial;
pub mod login;
pub mod modelos;
pub mod pacientes;
pub mod segmentaciones;
pub mod theme;
pub mod upload;
pub mod viewer;
pub mod widgets;

pub use app::VisorApp;
