pub mod cloth;
pub mod integrator;
pub mod prediction;
