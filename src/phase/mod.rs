pub mod correction;
pub mod history;

pub use correction::{advance_correction, unwrap_step, CalibrationTable, CorrectionMode};
pub use history::{DataSeries, TagHistory, PHASE_SCALE};
