pub mod proposal;
pub mod rfp;
pub mod structured;
pub mod vendor;
