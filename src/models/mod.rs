pub mod visit;

pub use visit::{CreateVisitRequest, FormattedVisit, NewPageVisit, PageMetricsSummary, PageVisit, VisitTime};
