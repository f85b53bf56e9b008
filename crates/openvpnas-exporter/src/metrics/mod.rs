pub mod descriptors;
pub mod render;
pub mod types;

pub use descriptors::ExporterDescriptors;
pub use types::{MetricDescriptor, MetricSample, MetricType};
