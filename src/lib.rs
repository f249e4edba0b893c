// Library exports for chartpress

pub mod category;
pub mod content;
pub mod dataset;
pub mod error;
pub mod fetch;
pub mod ir;
pub mod numeric;
pub mod options;
pub mod palette;
pub mod pipeline;
pub mod resolve;
pub mod server;
pub mod spec;
pub mod transform;

pub use dataset::Dataset;
pub use error::ChartError;
pub use options::{ChartOptions, LayoutOptions};
pub use pipeline::{run, run_inline, run_with_rules};
pub use spec::{Shape, VisualSpec, VisualType};
