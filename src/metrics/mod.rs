//! Derived statistics over grouped clients

pub mod aggregate;
pub mod churn;

pub use aggregate::{aggregate, classify_abc, filter_options, summarize, NO_BRAND};
pub use churn::{latest_order_date, score_churn, score_client};
