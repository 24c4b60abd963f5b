pub mod alert_engine;
pub mod chart_data;
pub mod live_session;
