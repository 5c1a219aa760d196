//! HTTP implementation of the reporting API
//!
//! Used by the CLI; the dashboard core only sees [`pulse_core::ReportingApi`].

mod http;

pub use http::HttpReportingClient;
