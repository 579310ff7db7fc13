// Domain layer: report model, pull request filter and the source ports.

pub mod model;
pub mod ports;
pub mod pull_request_filter;
