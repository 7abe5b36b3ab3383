pub mod assumptions;
pub mod cash_flow;
pub mod dcf;
pub mod record;
pub mod risk;
pub mod stage;
pub mod timeline;

pub use assumptions::{AssetAssumptions, ResolvedRecord};
pub use dcf::{calculate_asset_dcf, project, DcfResult, YearProjection};
pub use record::{param_value, Parameter, ValuationRecord};
pub use stage::Stage;
pub use timeline::{Phase, PhaseOverlap, PhaseSchedule};
