pub(crate) mod broker_controller;
pub(crate) mod health_check_controller;
