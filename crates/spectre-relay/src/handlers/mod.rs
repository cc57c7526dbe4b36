pub mod rotate;
pub mod step;

pub use rotate::RotateHandler;
pub use step::StepHandler;
